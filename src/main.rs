use chordscape::config::{parse_beat_range, parse_time_range, Config};
use chordscape::{analyze_with_checkpoint, parse_musicxml, snapshot, AnalysisError};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "chordscape")]
#[command(about = "Resolve chords, notes, lyrics and keys of a MusicXML score into timed music data", long_about = None)]
struct Cli {
    /// Input MusicXML file (partwise)
    input: PathBuf,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep only beats b0:b1 (e.g. 8:16 or 3/2:6)
    #[arg(short, long)]
    beats: Option<String>,

    /// Keep only seconds t0:t1, after timing
    #[arg(short, long)]
    seconds: Option<String>,

    /// Tempo override in beats per minute
    #[arg(long)]
    bpm: Option<f64>,

    /// Seconds of pre-roll before beat 0
    #[arg(long)]
    lead_in: Option<f64>,

    /// Also write the untimed model, after the beat filter, to this file
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Output snapshot file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AnalysisError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(range) = &cli.beats {
        config.beat_range = Some(parse_beat_range(range)?);
    }
    if let Some(range) = &cli.seconds {
        config.time_range = Some(parse_time_range(range)?);
    }
    if cli.bpm.is_some() {
        config.bpm = cli.bpm;
    }
    if let Some(lead_in) = cli.lead_in {
        config.lead_in = lead_in;
    }

    let xml = fs::read_to_string(&cli.input).map_err(|e| AnalysisError::Io {
        path: cli.input.display().to_string(),
        message: e.to_string(),
    })?;
    let score = parse_musicxml(&xml)?;

    let data = analyze_with_checkpoint(&score, &config, |untimed| match &cli.checkpoint {
        Some(path) => snapshot::save(untimed, path),
        None => Ok(()),
    })?;

    match &cli.output {
        Some(path) => {
            snapshot::save(&data, path)?;
            eprintln!("Wrote music data to {}", path.display());
        }
        None => print!("{}", snapshot::to_yaml(&data)?),
    }
    Ok(())
}
