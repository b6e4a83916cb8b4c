//! Live polyphonic synth driven by a command queue.
//!
//! All voice mutation happens inside `render_block`, on the thread that owns
//! the synth. Producers only push `SynthMessage`s, so the voice list needs no
//! lock: note-on, note-off and mixing are applied serially between blocks.

use tracing::trace;

use crate::{
    dsp::mix::sum_in_place,
    synth::{
        instrument::InstrumentBank,
        message::{MessageReceiver, SynthMessage},
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

pub struct PolySynth<R: MessageReceiver> {
    voices: Vec<Voice>,
    rx: R,
    bank: InstrumentBank,
    program: u8,
    temp_buffer: Vec<f32>,
    frame_counter: u64,
}

impl<R: MessageReceiver> PolySynth<R> {
    pub fn new(sample_rate: f32, max_voices: usize, rx: R) -> Self {
        let mut bank = InstrumentBank::new();
        let program = 0;
        let settings = bank.get(program);
        let vibrato = settings.vibrato_for(program);

        let voices = (0..max_voices.max(1))
            .map(|_| Voice::new(settings.clone(), vibrato, sample_rate))
            .collect();

        Self {
            voices,
            rx,
            bank,
            program,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frame_counter: 0,
        }
    }

    /// Drain pending messages, then fill `out` with the mixed voices.
    pub fn render_block(&mut self, out: &mut [f32]) {
        // Process control messages
        while let Some(msg) = self.rx.pop() {
            self.handle(msg);
        }

        // Mix voices
        out.fill(0.0);
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let scratch = &mut self.temp_buffer[..chunk.len()];
            for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                voice.render(scratch);
                sum_in_place(chunk, scratch);
            }
        }

        self.frame_counter += out.len() as u64;
    }

    fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => {
                let age = self.frame_counter;
                let settings = self.bank.get(self.program);
                let vibrato = settings.vibrato_for(self.program);
                match self.allocate_voice() {
                    Some(voice) => {
                        voice.set_instrument(settings, vibrato);
                        voice.start(note, velocity, age);
                    }
                    None => trace!(note, "no voice available, note dropped"),
                }
            }
            SynthMessage::NoteOff { note, .. } => {
                if let Some(voice) = self.find_voice(note) {
                    voice.release();
                }
            }
            SynthMessage::ProgramChange { program } => {
                self.program = program.min(127);
            }
            SynthMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
        }
    }

    fn allocate_voice(&mut self) -> Option<&mut Voice> {
        // First pass: find free voice index
        let free_idx = self.voices.iter().position(|v| v.is_free());
        if let Some(idx) = free_idx {
            return Some(&mut self.voices[idx]);
        }

        // Second pass: steal oldest releasing voice
        let steal_idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        steal_idx.map(|idx| &mut self.voices[idx])
    }

    fn find_voice(&mut self, note: u8) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.note() == note && v.state() == VoiceState::Active)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.rx
    }
}
