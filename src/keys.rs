//! Key timeline extraction.
//!
//! Key signatures and keys of all parts are grouped by offset. A bare signature
//! (accidentals only) is read as the major key it belongs to; every key at one
//! offset must then agree.

use crate::error::AnalysisError;
use crate::pitch::{Mode, PitchName};
use crate::score::{KeyAnnotation, Score};
use crate::timed::{Beat, Timed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A key: tonic and mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: PitchName,
    pub mode: Mode,
}

impl Key {
    /// Key named by a signature of `fifths` sharps (positive) or flats (negative).
    pub fn from_fifths(fifths: i8, mode: Mode) -> Self {
        let relative = match mode {
            Mode::Major => 0,
            Mode::Minor => 3,
        };
        Self {
            tonic: PitchName::from_fifths(fifths as i32 + relative),
            mode,
        }
    }

    /// Number of sharps (positive) or flats (negative) in the signature.
    pub fn fifths(&self) -> i32 {
        match self.mode {
            Mode::Major => self.tonic.fifths(),
            Mode::Minor => self.tonic.fifths() - 3,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        write!(f, "{} {}", self.tonic, mode)
    }
}

/// Read a key annotation as a full key. Signatures alone are taken as major.
pub fn normalize(annotation: &KeyAnnotation) -> Key {
    match *annotation {
        KeyAnnotation::Signature { fifths } => Key::from_fifths(fifths, Mode::Major),
        KeyAnnotation::Key { tonic, mode } => Key { tonic, mode },
    }
}

/// One key per offset where the score states a key, ordered by offset.
pub fn extract_keys(score: &Score) -> Result<Vec<Timed<Key>>, AnalysisError> {
    let mut by_offset: BTreeMap<Beat, Vec<Key>> = BTreeMap::new();
    for annotation in &score.keys {
        let key = normalize(&annotation.value);
        let keys = by_offset.entry(annotation.offset()).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let mut timeline = Vec::with_capacity(by_offset.len());
    for (offset, keys) in by_offset {
        match keys.as_slice() {
            [key] => timeline.push(Timed::new(*key, offset)),
            _ => {
                return Err(AnalysisError::ConflictingKeyAnnotation {
                    offset,
                    keys: keys.iter().map(|k| k.to_string()).collect(),
                })
            }
        }
    }
    log::debug!("extracted {} key change(s)", timeline.len());
    Ok(timeline)
}
