//! YAML snapshots of a [`MusicData`], used as checkpoints between pipeline stages.
//!
//! Offsets are written as exact `[numerator, denominator]` pairs and times as
//! plain floats, so a snapshot reads back to an equal model.

use crate::error::AnalysisError;
use crate::music_data::MusicData;
use std::fs;
use std::path::Path;

pub fn to_yaml(data: &MusicData) -> Result<String, AnalysisError> {
    serde_yaml::to_string(data).map_err(|e| AnalysisError::Snapshot(e.to_string()))
}

pub fn from_yaml(content: &str) -> Result<MusicData, AnalysisError> {
    serde_yaml::from_str(content).map_err(|e| AnalysisError::Snapshot(e.to_string()))
}

/// Write a snapshot to `path`.
pub fn save(data: &MusicData, path: &Path) -> Result<(), AnalysisError> {
    let yaml = to_yaml(data)?;
    fs::write(path, yaml).map_err(|e| AnalysisError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    log::info!("wrote snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot back from `path`.
pub fn load(path: &Path) -> Result<MusicData, AnalysisError> {
    let content = fs::read_to_string(path).map_err(|e| AnalysisError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    from_yaml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::ChordSymbol;
    use crate::music_data::extract_music_data;
    use crate::pitch::Pitch;
    use crate::score::{KeyAnnotation, Part, Score, Syllabic};
    use crate::timed::Beat;
    use crate::timing::resolve_timing;

    fn beat(n: i64) -> Beat {
        Beat::from_integer(n)
    }

    fn timed_sample() -> MusicData {
        let mut score = Score::new(beat(8));
        score.set_regular_measures(beat(4));
        score.push_key(beat(0), KeyAnnotation::Signature { fifths: -2 });
        let mut part = Part::new("P1");
        part.push_chord_symbol(beat(4), ChordSymbol::parse("Bbmaj7").unwrap())
            .push_note(Beat::new(1, 3), Beat::new(2, 3), vec![Pitch::parse("Bb4").unwrap()])
            .push_lyric(beat(0), 1, Syllabic::Single, "la");
        score.parts.push(part);
        let mut data = extract_music_data(&score).unwrap();
        resolve_timing(&mut data, 100.0, 2.0).unwrap();
        data
    }

    #[test]
    fn test_snapshot_reads_back_equal() {
        let data = timed_sample();
        let yaml = to_yaml(&data).unwrap();
        assert_eq!(from_yaml(&yaml).unwrap(), data);
    }

    #[test]
    fn test_untimed_snapshot_omits_time() {
        let mut score = Score::new(beat(4));
        let mut part = Part::new("P1");
        part.push_note(beat(0), beat(4), vec![Pitch::parse("C4").unwrap()]);
        score.parts.push(part);
        let data = extract_music_data(&score).unwrap();
        let yaml = to_yaml(&data).unwrap();
        assert!(!yaml.contains("time:"));
        assert_eq!(from_yaml(&yaml).unwrap(), data);
    }

    #[test]
    fn test_invalid_snapshot() {
        assert!(matches!(
            from_yaml("chords: 3"),
            Err(AnalysisError::Snapshot(_))
        ));
    }
}
