//! # Score Document Types
//!
//! The input side of the analysis: a parsed score with every event already placed
//! at a flattened beat offset.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   ├── length: Beat (total length of the piece)
//!   ├── tempo: Option<f64> (first tempo marking, beats per minute)
//!   ├── measure_offsets: Vec<Beat> (start of every measure)
//!   ├── keys: Vec<Timed<KeyAnnotation>>
//!   └── Vec<Part>
//!         ├── notes: Vec<Timed<NoteEvent>>         (pitched events, no rests)
//!         ├── annotations: Vec<Timed<ChordAnnotation>>
//!         └── lyrics: Vec<Timed<LyricToken>>
//! ```
//!
//! ## Annotations
//! A chord annotation is either an explicit chord (`Am7`) or "no chord" text. The
//! no-chord text is where directives live: `x` excludes the notes of that part at
//! that beat, anything else must follow the directive grammar in
//! [`crate::harmony::annotation`].
//!
//! ## Related Modules
//! - `musicxml` - builds a `Score` from a MusicXML document
//! - `harmony`, `lyrics`, `keys` - read a `Score` and produce music data

use crate::harmony::chord_symbol::ChordSymbol;
use crate::pitch::{Mode, Pitch, PitchName};
use crate::timed::{Beat, Timed};
use serde::{Deserialize, Serialize};

/// Identifier of a part (the MusicXML `part@id`).
pub type PartId = String;

/// One pitched event: a single note or several notes struck together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitches: Vec<Pitch>,
    pub duration: Beat,
}

/// Text attached to a part at a beat in the chord-symbol position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordAnnotation {
    /// Names a chord directly.
    Chord(ChordSymbol),
    /// Not a chord: either the exclusion marker or a directive.
    NoChord(String),
}

impl ChordAnnotation {
    pub fn is_explicit_chord(&self) -> bool {
        matches!(self, ChordAnnotation::Chord(_))
    }

    /// Whether this is the `x` marker that drops a part's notes at this beat.
    pub fn is_exclusion(&self) -> bool {
        match self {
            ChordAnnotation::NoChord(text) => text.trim().eq_ignore_ascii_case("x"),
            ChordAnnotation::Chord(_) => false,
        }
    }

    /// Whether two annotations say the same thing: chord symbols by root and
    /// quality, other text after trimming and ignoring ASCII case.
    pub fn same_as(&self, other: &ChordAnnotation) -> bool {
        match (self, other) {
            (ChordAnnotation::Chord(a), ChordAnnotation::Chord(b)) => a.same_chord(b),
            (ChordAnnotation::NoChord(a), ChordAnnotation::NoChord(b)) => {
                a.trim().eq_ignore_ascii_case(b.trim())
            }
            _ => false,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ChordAnnotation::Chord(symbol) => &symbol.text,
            ChordAnnotation::NoChord(text) => text,
        }
    }
}

/// Position of a syllable within its word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syllabic {
    #[default]
    Single,
    Begin,
    Middle,
    End,
}

impl Syllabic {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "single" => Some(Syllabic::Single),
            "begin" => Some(Syllabic::Begin),
            "middle" => Some(Syllabic::Middle),
            "end" => Some(Syllabic::End),
            _ => None,
        }
    }
}

/// One lyric syllable as found under a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricToken {
    pub text: String,
    pub syllabic: Syllabic,
    /// Lyric line (MusicXML `lyric@number`), 1 for the first verse.
    pub verse: u32,
}

/// Key information as written in the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAnnotation {
    /// Only the accidentals are known (positive = sharps, negative = flats).
    Signature { fifths: i8 },
    /// A full key with tonic and mode.
    Key { tonic: PitchName, mode: Mode },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Part {
    pub id: PartId,
    pub name: Option<String>,
    pub notes: Vec<Timed<NoteEvent>>,
    pub annotations: Vec<Timed<ChordAnnotation>>,
    pub lyrics: Vec<Timed<LyricToken>>,
}

impl Part {
    pub fn new(id: impl Into<PartId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn push_note(&mut self, offset: Beat, duration: Beat, pitches: Vec<Pitch>) -> &mut Self {
        self.notes.push(Timed::new(NoteEvent { pitches, duration }, offset));
        self
    }

    pub fn push_chord_symbol(&mut self, offset: Beat, symbol: ChordSymbol) -> &mut Self {
        self.annotations
            .push(Timed::new(ChordAnnotation::Chord(symbol), offset));
        self
    }

    pub fn push_no_chord(&mut self, offset: Beat, text: impl Into<String>) -> &mut Self {
        self.annotations
            .push(Timed::new(ChordAnnotation::NoChord(text.into()), offset));
        self
    }

    pub fn push_lyric(
        &mut self,
        offset: Beat,
        verse: u32,
        syllabic: Syllabic,
        text: impl Into<String>,
    ) -> &mut Self {
        let token = LyricToken {
            text: text.into(),
            syllabic,
            verse,
        };
        self.lyrics.push(Timed::new(token, offset));
        self
    }
}

/// A parsed score, ready for analysis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub title: Option<String>,
    pub parts: Vec<Part>,
    /// Start offset of every measure, ascending and unique.
    pub measure_offsets: Vec<Beat>,
    pub keys: Vec<Timed<KeyAnnotation>>,
    pub tempo: Option<f64>,
    pub length: Beat,
}

impl Score {
    pub fn new(length: Beat) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }

    /// Mark measures of equal length from the start to the end of the piece.
    pub fn set_regular_measures(&mut self, measure_length: Beat) -> &mut Self {
        self.measure_offsets.clear();
        if measure_length <= Beat::from_integer(0) {
            return self;
        }
        let mut offset = Beat::from_integer(0);
        while offset < self.length {
            self.measure_offsets.push(offset);
            offset += measure_length;
        }
        self
    }

    pub fn push_key(&mut self, offset: Beat, key: KeyAnnotation) -> &mut Self {
        self.keys.push(Timed::new(key, offset));
        self
    }
}
