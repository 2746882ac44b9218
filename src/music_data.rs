//! # Music Data
//!
//! The flat, renderer-facing model of a piece: chords, chord roots, notes (all
//! parts and per part), lyric words and keys, every item a [`Timed`] value.
//!
//! ## Lifecycle
//! 1. [`extract_music_data()`] runs every extractor over a [`Score`].
//! 2. `timing::resolve_timing` fills in wall-clock times, in place.
//! 3. `filter::filter_beats` / `filter::filter_seconds` cut a window out of the
//!    model and return a new one.
//!
//! All lists are sorted by ascending offset.
//!
//! ## Traversal
//! [`MusicData::for_each_timing_mut`] visits every `Timing` reachable in the model,
//! nested lyric syllables included, so passes over timings are written once.

use crate::error::AnalysisError;
use crate::harmony::{extract_harmonic_clusters, Chord};
use crate::keys::{extract_keys, Key};
use crate::lyrics::{extract_lyrics, Lyric};
use crate::pitch::PitchName;
use crate::score::{NoteEvent, PartId, Score};
use crate::timed::{Timed, Timing};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tempo used when the score states none.
pub const DEFAULT_BPM: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicData {
    pub chords: Vec<Timed<Chord>>,
    #[serde(default)]
    pub chord_roots: Vec<Timed<PitchName>>,
    pub notes: Vec<Timed<NoteEvent>>,
    #[serde(default)]
    pub notes_by_part: BTreeMap<PartId, Vec<Timed<NoteEvent>>>,
    #[serde(default)]
    pub lyrics: Vec<Timed<Lyric>>,
    #[serde(default)]
    pub keys: Vec<Timed<Key>>,
    pub bpm: f64,
}

impl Default for MusicData {
    fn default() -> Self {
        Self {
            chords: Vec::new(),
            chord_roots: Vec::new(),
            notes: Vec::new(),
            notes_by_part: BTreeMap::new(),
            lyrics: Vec::new(),
            keys: Vec::new(),
            bpm: DEFAULT_BPM,
        }
    }
}

impl MusicData {
    /// Apply `f` to every timing in the model, nested syllables included.
    pub fn for_each_timing_mut(&mut self, mut f: impl FnMut(&mut Timing)) {
        self.chords.iter_mut().for_each(|c| f(&mut c.timing));
        self.chord_roots.iter_mut().for_each(|r| f(&mut r.timing));
        self.notes.iter_mut().for_each(|n| f(&mut n.timing));
        for notes in self.notes_by_part.values_mut() {
            notes.iter_mut().for_each(|n| f(&mut n.timing));
        }
        for word in &mut self.lyrics {
            f(&mut word.timing);
            word.value.iter_mut().for_each(|s| f(&mut s.timing));
        }
        self.keys.iter_mut().for_each(|k| f(&mut k.timing));
    }

    /// Read-only counterpart of [`MusicData::for_each_timing_mut`].
    pub fn for_each_timing(&self, mut f: impl FnMut(&Timing)) {
        self.chords.iter().for_each(|c| f(&c.timing));
        self.chord_roots.iter().for_each(|r| f(&r.timing));
        self.notes.iter().for_each(|n| f(&n.timing));
        for notes in self.notes_by_part.values() {
            notes.iter().for_each(|n| f(&n.timing));
        }
        for word in &self.lyrics {
            f(&word.timing);
            word.value.iter().for_each(|s| f(&s.timing));
        }
        self.keys.iter().for_each(|k| f(&k.timing));
    }

    /// Whether every timing has a wall-clock time. Trivially true when empty.
    pub fn is_timed(&self) -> bool {
        let mut timed = true;
        self.for_each_timing(|t| timed &= t.time.is_some());
        timed
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty() && self.notes.is_empty() && self.lyrics.is_empty() && self.keys.is_empty()
    }
}

/// Run all extractors over `score`.
///
/// The tempo is the score's own, or [`DEFAULT_BPM`]. Any analysis error aborts
/// the whole extraction.
pub fn extract_music_data(score: &Score) -> Result<MusicData, AnalysisError> {
    let chords = extract_harmonic_clusters(score)?;
    let keys = extract_keys(score)?;
    let lyrics = extract_lyrics(score);

    let chord_roots = chords
        .iter()
        .filter_map(|chord| {
            chord.value.root.map(|root| Timed {
                value: root,
                timing: chord.timing,
            })
        })
        .collect();

    let mut notes_by_part = BTreeMap::new();
    let mut notes = Vec::new();
    for part in &score.parts {
        let mut part_notes = part.notes.clone();
        part_notes.sort_by_key(|n| n.offset());
        notes.extend(part_notes.iter().cloned());
        notes_by_part.insert(part.id.clone(), part_notes);
    }
    notes.sort_by_key(|n: &Timed<NoteEvent>| n.offset());

    let data = MusicData {
        chords,
        chord_roots,
        notes,
        notes_by_part,
        lyrics,
        keys,
        bpm: score.tempo.unwrap_or(DEFAULT_BPM),
    };
    log::info!(
        "extracted {} chord(s), {} note event(s), {} lyric word(s), {} key(s)",
        data.chords.len(),
        data.notes.len(),
        data.lyrics.len(),
        data.keys.len()
    );
    Ok(data)
}
