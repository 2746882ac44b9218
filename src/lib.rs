pub mod config;
pub mod error;
pub mod filter;
pub mod harmony;
pub mod keys;
pub mod lyrics;
pub mod music_data;
pub mod musicxml;
pub mod pitch;
pub mod score;
pub mod snapshot;
pub mod timed;
pub mod timing;

pub use config::Config;
pub use error::*;
pub use filter::{filter_beats, filter_seconds};
pub use harmony::{extract_harmonic_clusters, Chord, ChordSymbol};
pub use keys::{extract_keys, Key};
pub use lyrics::{extract_lyrics, Lyric, Syllable};
pub use music_data::{extract_music_data, MusicData};
pub use musicxml::parse_musicxml;
pub use pitch::{Mode, Pitch, PitchName, Step};
pub use score::{ChordAnnotation, KeyAnnotation, NoteEvent, Part, PartId, Score, Syllabic};
pub use timed::{Beat, Seconds, Timed, Timing};
pub use timing::resolve_timing;

/// Run the whole pipeline on a score.
/// Extraction, then the optional beat window, timing, then the optional time window.
pub fn analyze(score: &Score, config: &Config) -> Result<MusicData, AnalysisError> {
    analyze_with_checkpoint(score, config, |_| Ok(()))
}

/// [`analyze`], handing the untimed model to `checkpoint` once the beat window
/// has been applied and before timing is resolved.
pub fn analyze_with_checkpoint<F>(
    score: &Score,
    config: &Config,
    mut checkpoint: F,
) -> Result<MusicData, AnalysisError>
where
    F: FnMut(&MusicData) -> Result<(), AnalysisError>,
{
    let mut data = extract_music_data(score)?;
    if let Some((start, end)) = config.beat_range {
        data = filter_beats(&data, start, end)?;
    }
    checkpoint(&data)?;
    resolve_timing(&mut data, config.effective_bpm(score.tempo), config.lead_in)?;
    if let Some((start, end)) = config.time_range {
        data = filter_seconds(&data, start, end)?;
    }
    Ok(data)
}

/// Read a MusicXML document and run the whole pipeline on it.
pub fn analyze_musicxml(xml: &str, config: &Config) -> Result<MusicData, AnalysisError> {
    let score = parse_musicxml(xml)?;
    analyze(&score, config)
}
