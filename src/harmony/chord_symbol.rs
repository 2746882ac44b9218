//! Explicit chord symbols and chord roots.
//!
//! Parses chord symbols (`C`, `Am`, `G7`, `Bbmaj7`, ...) and MusicXML `<harmony>`
//! kinds into a voiced [`Chord`], and estimates the root of clusters built from
//! the notes of the score.

use crate::pitch::{Pitch, PitchName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chord quality, with its intervals above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordQuality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Diminished7,
    HalfDiminished7,
    Augmented,
    Suspended4,
    Suspended2,
    Major6,
    Minor6,
    Dominant9,
    Major9,
    Minor9,
    Power,
}

impl ChordQuality {
    /// Semitones above the root.
    ///
    /// - Major triad: root, major 3rd (+4), perfect 5th (+7)
    /// - Minor triad: root, minor 3rd (+3), perfect 5th (+7)
    /// - 7th chords add a minor 7th (+10) or major 7th (+11)
    /// - 9th chords add a major 9th (+14) on top of the 7th chord
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Suspended4 => &[0, 5, 7],
            ChordQuality::Suspended2 => &[0, 2, 7],
            ChordQuality::Major6 => &[0, 4, 7, 9],
            ChordQuality::Minor6 => &[0, 3, 7, 9],
            ChordQuality::Dominant9 => &[0, 4, 7, 10, 14],
            ChordQuality::Major9 => &[0, 4, 7, 11, 14],
            ChordQuality::Minor9 => &[0, 3, 7, 10, 14],
            ChordQuality::Power => &[0, 7],
        }
    }

    /// Suffix used when printing a symbol (`m7`, `dim`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Diminished => "dim",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Augmented => "aug",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "m6",
            ChordQuality::Dominant9 => "9",
            ChordQuality::Major9 => "maj9",
            ChordQuality::Minor9 => "m9",
            ChordQuality::Power => "5",
        }
    }

    /// Quality from the text after the root. Unknown suffixes fall back to major.
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "" | "maj" | "M" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "7" => ChordQuality::Dominant7,
            "maj7" | "M7" | "Δ" | "Δ7" => ChordQuality::Major7,
            "m7" | "min7" | "-7" => ChordQuality::Minor7,
            "dim" | "°" | "o" => ChordQuality::Diminished,
            "dim7" | "°7" | "o7" => ChordQuality::Diminished7,
            "m7b5" | "ø" | "ø7" => ChordQuality::HalfDiminished7,
            "aug" | "+" => ChordQuality::Augmented,
            "sus4" | "sus" => ChordQuality::Suspended4,
            "sus2" => ChordQuality::Suspended2,
            "6" => ChordQuality::Major6,
            "m6" | "min6" => ChordQuality::Minor6,
            "9" => ChordQuality::Dominant9,
            "maj9" | "M9" => ChordQuality::Major9,
            "m9" | "min9" => ChordQuality::Minor9,
            "5" => ChordQuality::Power,
            _ => ChordQuality::Major,
        }
    }

    /// Quality from a MusicXML `<kind>` value. Unknown kinds fall back to major.
    pub fn from_musicxml_kind(kind: &str) -> Self {
        match kind.trim() {
            "minor" => ChordQuality::Minor,
            "dominant" | "dominant-seventh" => ChordQuality::Dominant7,
            "major-seventh" => ChordQuality::Major7,
            "minor-seventh" => ChordQuality::Minor7,
            "diminished" => ChordQuality::Diminished,
            "diminished-seventh" => ChordQuality::Diminished7,
            "half-diminished" => ChordQuality::HalfDiminished7,
            "augmented" => ChordQuality::Augmented,
            "suspended-fourth" => ChordQuality::Suspended4,
            "suspended-second" => ChordQuality::Suspended2,
            "major-sixth" => ChordQuality::Major6,
            "minor-sixth" => ChordQuality::Minor6,
            "dominant-ninth" => ChordQuality::Dominant9,
            "major-ninth" => ChordQuality::Major9,
            "minor-ninth" => ChordQuality::Minor9,
            "power" => ChordQuality::Power,
            _ => ChordQuality::Major,
        }
    }
}

/// A chord named explicitly in the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSymbol {
    pub root: PitchName,
    pub quality: ChordQuality,
    /// Symbol as displayed (`Am7`).
    pub text: String,
}

impl ChordSymbol {
    pub fn new(root: PitchName, quality: ChordQuality) -> Self {
        Self {
            root,
            quality,
            text: format!("{}{}", root, quality.suffix()),
        }
    }

    /// Parse a chord symbol like `C`, `Dm`, `G7`, `F#`, `Bbmaj7`.
    ///
    /// Returns `None` when the text does not start with a note name.
    ///
    /// # Examples
    /// ```
    /// use chordscape::harmony::chord_symbol::{ChordQuality, ChordSymbol};
    ///
    /// let symbol = ChordSymbol::parse("Dm7").unwrap();
    /// assert_eq!(symbol.root.to_string(), "D");
    /// assert_eq!(symbol.quality, ChordQuality::Minor7);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (root, quality) = PitchName::parse_prefix(trimmed)?;
        Some(Self {
            root,
            quality: ChordQuality::from_suffix(quality),
            text: trimmed.to_string(),
        })
    }

    /// Same root and quality, whatever the spelling of the display text.
    pub fn same_chord(&self, other: &ChordSymbol) -> bool {
        self.root == other.root && self.quality == other.quality
    }

    /// Voice the chord from the root in octave 3 (bass/piano accompaniment range).
    ///
    /// C major: C3, E3, G3. G7: G3, B3, D4, F4.
    pub fn voicing(&self) -> Vec<Pitch> {
        let root = Pitch::new(self.root.step, self.root.alter, 3);
        self.quality
            .intervals()
            .iter()
            .map(|&semitones| Pitch::above(root, semitones))
            .collect()
    }
}

/// Resolved harmony for one span: the pitches sounding, plus naming when known.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chord {
    pub pitches: BTreeSet<Pitch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PitchName>,
}

impl Chord {
    /// Chord named by an explicit symbol.
    pub fn from_symbol(symbol: &ChordSymbol) -> Self {
        Self {
            pitches: symbol.voicing().into_iter().collect(),
            symbol: Some(symbol.text.clone()),
            root: Some(symbol.root),
        }
    }

    /// Chord made of the unique pitches of a note cluster. Empty input is silence.
    pub fn from_cluster(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        let pitches: BTreeSet<Pitch> = pitches.into_iter().collect();
        let root = estimate_root(&pitches);
        Self {
            pitches,
            symbol: None,
            root,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Human readable form: symbol or pitch list, `no notes` for silence.
    pub fn describe(&self) -> String {
        if let Some(symbol) = &self.symbol {
            return symbol.clone();
        }
        if self.pitches.is_empty() {
            return "no notes".to_string();
        }
        self.pitches
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Interval bitmask of `pitch_classes` relative to `root`.
fn interval_mask(pitch_classes: &BTreeSet<u8>, root: u8) -> u16 {
    pitch_classes
        .iter()
        .fold(0u16, |mask, &pc| mask | 1 << ((pc + 12 - root) % 12))
}

fn template_mask(intervals: &[i32]) -> u16 {
    intervals
        .iter()
        .fold(0u16, |mask, &i| mask | 1 << (i.rem_euclid(12)))
}

const ROOT_TEMPLATES: [ChordQuality; 13] = [
    ChordQuality::Dominant7,
    ChordQuality::Major7,
    ChordQuality::Minor7,
    ChordQuality::Diminished7,
    ChordQuality::HalfDiminished7,
    ChordQuality::Major6,
    ChordQuality::Minor6,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
    ChordQuality::Augmented,
    ChordQuality::Suspended4,
    ChordQuality::Power,
];

/// Estimate the root of a set of pitches by template matching.
///
/// Every pitch class of the cluster is tried as root against the chord templates;
/// the score is the fraction of the template present minus a penalty for notes
/// outside it, with a bonus when the candidate is also the lowest note. The root
/// is spelled the way it appears in the cluster.
pub fn estimate_root(pitches: &BTreeSet<Pitch>) -> Option<PitchName> {
    let lowest = pitches.iter().next()?;
    let classes: BTreeSet<u8> = pitches.iter().map(|p| p.pitch_class()).collect();
    if classes.len() == 1 {
        return Some(lowest.name());
    }

    let bass = lowest.pitch_class();
    let mut best: Option<(u8, f64)> = None;
    for &root in &classes {
        let intervals = interval_mask(&classes, root);
        for quality in ROOT_TEMPLATES {
            let template = template_mask(quality.intervals());
            let size = template.count_ones() as f64;
            let matched = (intervals & template).count_ones() as f64;
            let extra = (intervals & !template).count_ones() as f64;
            let mut score = matched / size - extra * 0.1;
            if intervals & template == template {
                score += 0.1;
            }
            if root == bass {
                score += 0.15;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((root, score));
            }
        }
    }

    let (root, _) = best?;
    pitches
        .iter()
        .find(|p| p.pitch_class() == root)
        .map(|p| p.name())
}
