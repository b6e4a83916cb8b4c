//! chordwave - render a chord progression from the command line
//!
//! Run with: cargo run -- "I-vi-IV-V" --key G --style jazz

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chordwave::{
    dsp::ReverbConfig,
    sequencing::Instrumentation,
    set_instrument, set_tempo,
    synth::instrument::InstrumentFamily,
    GenerationRequest, Generator, Key, Mode, RenderConfig, Style, SynthesisSession,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Room {
    None,
    Room,
    Hall,
}

#[derive(Parser)]
#[command(name = "chordwave")]
#[command(author, version, about = "Chord progressions to additive-synth audio")]
struct Args {
    /// Progression, e.g. "I-vi-IV-V" or "C Am(2) F(2) G"
    progression: String,

    /// Key tonic (C, F#, Bb, ...)
    #[arg(long, short = 'k', default_value = "C")]
    key: Key,

    /// major or minor
    #[arg(long, short = 'm', default_value = "major")]
    mode: Mode,

    #[arg(long, short = 's', default_value = "pop")]
    style: Style,

    #[arg(long, short = 'b', default_value = "120")]
    bpm: f64,

    /// Beats per bar
    #[arg(long, default_value = "4")]
    beats: u8,

    /// Skip the bass line
    #[arg(long)]
    no_bass: bool,

    /// Override the chord track's General MIDI program
    #[arg(long)]
    program: Option<u32>,

    /// Re-time the generated timeline to this tempo
    #[arg(long)]
    tempo: Option<f64>,

    #[arg(long, value_enum, default_value = "room")]
    reverb: Room,

    /// Velocity jitter (0..1)
    #[arg(long, default_value = "0")]
    humanize: f32,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let request = GenerationRequest::new(args.progression, args.key, args.mode)
        .style(args.style)
        .bpm(args.bpm)
        .beats_per_bar(args.beats)
        .instrumentation(Instrumentation {
            chords: true,
            bass: !args.no_bass,
        });

    let config = RenderConfig {
        reverb: match args.reverb {
            Room::None => None,
            Room::Room => Some(ReverbConfig::small_room()),
            Room::Hall => Some(ReverbConfig::large_hall()),
        },
        humanize: args.humanize,
        seed: args.seed,
        ..RenderConfig::default()
    };

    let mut session = SynthesisSession::new(config)?;
    let mut song = Generator::new(session.config().ticks_per_quarter).generate(&request)?;

    if let Some(program) = args.program {
        set_instrument(&mut song.timeline, 1, 0, program)?;
    }
    if let Some(bpm) = args.tempo {
        set_tempo(&mut song.timeline, bpm)?;
    }

    let chords: Vec<String> = song.progression.chords().iter().map(ToString::to_string).collect();
    let program = song.timeline.program_at(0, 0);
    info!(
        chords = %chords.join(" "),
        notes = song.timeline.note_events().count(),
        bpm = song.timeline.bpm(),
        program,
        family = ?InstrumentFamily::from_program(program),
        "generated"
    );

    let audio = session.render(&song.timeline);
    println!(
        "{} chords, {:.2}s at {} Hz, peak {:.3}",
        chords.len(),
        audio.duration_secs(),
        audio.sample_rate,
        audio.peak()
    );

    Ok(())
}
