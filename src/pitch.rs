//! Pitch value types.
//!
//! The analysis treats pitches as opaque, comparable values. The only arithmetic
//! it needs is the semitone number (for ordering and chord-root templates) and
//! the circle of fifths (for key signatures).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Natural note letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Step::C),
            'D' => Some(Step::D),
            'E' => Some(Step::E),
            'F' => Some(Step::F),
            'G' => Some(Step::G),
            'A' => Some(Step::A),
            'B' => Some(Step::B),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }
}

/// Spelled, octave-independent pitch class (`F#`, `Bb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchName {
    pub step: Step,
    #[serde(default)]
    pub alter: i8,
}

const SHARP_SPELLINGS: [(Step, i8); 12] = [
    (Step::C, 0),
    (Step::C, 1),
    (Step::D, 0),
    (Step::D, 1),
    (Step::E, 0),
    (Step::F, 0),
    (Step::F, 1),
    (Step::G, 0),
    (Step::G, 1),
    (Step::A, 0),
    (Step::A, 1),
    (Step::B, 0),
];

const FLAT_SPELLINGS: [(Step, i8); 12] = [
    (Step::C, 0),
    (Step::D, -1),
    (Step::D, 0),
    (Step::E, -1),
    (Step::E, 0),
    (Step::F, 0),
    (Step::G, -1),
    (Step::G, 0),
    (Step::A, -1),
    (Step::A, 0),
    (Step::B, -1),
    (Step::B, 0),
];

impl PitchName {
    pub fn new(step: Step, alter: i8) -> Self {
        Self { step, alter }
    }

    /// Semitone class 0..12, C = 0.
    pub fn pitch_class(&self) -> u8 {
        (self.step.semitone() + self.alter as i32).rem_euclid(12) as u8
    }

    /// Spell a semitone class, preferring sharps or flats.
    pub fn from_pitch_class(pitch_class: u8, use_flats: bool) -> Self {
        let table = if use_flats { &FLAT_SPELLINGS } else { &SHARP_SPELLINGS };
        let (step, alter) = table[(pitch_class % 12) as usize];
        Self { step, alter }
    }

    /// Parse a leading pitch name (`C`, `F#`, `Bb`, `Ebb`) and return the rest of the string.
    ///
    /// `-` is not an accidental here: in `C-7` it is the minor mark and in `C-1`
    /// the sign of the octave.
    pub fn parse_prefix(s: &str) -> Option<(Self, &str)> {
        let mut chars = s.char_indices();
        let (_, first) = chars.next()?;
        let step = Step::from_char(first)?;
        let mut alter = 0i8;
        let mut rest_at = first.len_utf8();
        for (idx, c) in chars {
            match c {
                '#' | '♯' => alter += 1,
                'b' | '♭' if alter <= 0 => alter -= 1,
                _ => {
                    rest_at = idx;
                    break;
                }
            }
            rest_at = idx + c.len_utf8();
        }
        Some((Self { step, alter }, &s[rest_at..]))
    }

    /// Parse a complete pitch name.
    pub fn parse(s: &str) -> Option<Self> {
        match Self::parse_prefix(s.trim())? {
            (name, "") => Some(name),
            _ => None,
        }
    }

    /// Position on the circle of fifths relative to C (F = -1, G = 1, Bb = -2).
    pub fn fifths(&self) -> i32 {
        let natural = match self.step {
            Step::F => -1,
            Step::C => 0,
            Step::G => 1,
            Step::D => 2,
            Step::A => 3,
            Step::E => 4,
            Step::B => 5,
        };
        natural + 7 * self.alter as i32
    }

    /// Inverse of [`PitchName::fifths`].
    pub fn from_fifths(fifths: i32) -> Self {
        const ORDER: [Step; 7] = [Step::F, Step::C, Step::G, Step::D, Step::A, Step::E, Step::B];
        let shifted = fifths + 1;
        let step = ORDER[shifted.rem_euclid(7) as usize];
        let alter = shifted.div_euclid(7) as i8;
        Self { step, alter }
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step.as_char())?;
        let accidental = if self.alter >= 0 { "#" } else { "b" };
        for _ in 0..self.alter.unsigned_abs() {
            f.write_str(accidental)?;
        }
        Ok(())
    }
}

/// A concrete pitch: spelled note plus octave (middle C = C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    #[serde(default)]
    pub alter: i8,
    pub octave: i8,
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Self {
        Self { step, alter, octave }
    }

    pub fn name(&self) -> PitchName {
        PitchName::new(self.step, self.alter)
    }

    /// MIDI note number (C4 = 60).
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.step.semitone() + self.alter as i32
    }

    pub fn pitch_class(&self) -> u8 {
        self.name().pitch_class()
    }

    /// Parse `C4`, `F#3`, `Bb5`.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, octave) = PitchName::parse_prefix(s.trim())?;
        let octave: i8 = octave.parse().ok()?;
        Some(Self::new(name.step, name.alter, octave))
    }

    /// Pitch `semitones` above `root`, spelled by the root's accidental preference.
    pub fn above(root: Pitch, semitones: i32) -> Self {
        let midi = root.midi() + semitones;
        let name = PitchName::from_pitch_class(midi.rem_euclid(12) as u8, root.alter < 0);
        // Octave follows the spelled letter, so B#3 and C4 stay distinct spellings.
        let octave = ((midi - name.step.semitone() - name.alter as i32) / 12 - 1) as i8;
        Self::new(name.step, name.alter, octave)
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.midi()
            .cmp(&other.midi())
            .then(self.step.cmp(&other.step))
            .then(self.alter.cmp(&other.alter))
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

/// Mode for key signatures and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_numbers() {
        assert_eq!(Pitch::parse("C4").unwrap().midi(), 60);
        assert_eq!(Pitch::parse("A4").unwrap().midi(), 69);
        assert_eq!(Pitch::parse("Bb3").unwrap().midi(), 58);
        assert_eq!(Pitch::parse("F#3").unwrap().midi(), 54);
    }

    #[test]
    fn test_pitch_ordering_follows_sound() {
        let mut pitches = vec![
            Pitch::parse("G4").unwrap(),
            Pitch::parse("C4").unwrap(),
            Pitch::parse("E3").unwrap(),
        ];
        pitches.sort();
        let names: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["E3", "C4", "G4"]);
    }

    #[test]
    fn test_parse_prefix_leaves_quality() {
        let (name, rest) = PitchName::parse_prefix("Bbmaj7").unwrap();
        assert_eq!(name, PitchName::new(Step::B, -1));
        assert_eq!(rest, "maj7");

        let (name, rest) = PitchName::parse_prefix("F#m").unwrap();
        assert_eq!(name, PitchName::new(Step::F, 1));
        assert_eq!(rest, "m");

        let (name, rest) = PitchName::parse_prefix("C-7").unwrap();
        assert_eq!(name, PitchName::new(Step::C, 0));
        assert_eq!(rest, "-7");
    }

    #[test]
    fn test_negative_octave() {
        let pitch = Pitch::parse("C-1").unwrap();
        assert_eq!(pitch.octave, -1);
        assert_eq!(pitch.midi(), 0);
    }

    #[test]
    fn test_circle_of_fifths_round_trip() {
        for fifths in -7..=7 {
            assert_eq!(PitchName::from_fifths(fifths).fifths(), fifths);
        }
        assert_eq!(PitchName::from_fifths(-2).to_string(), "Bb");
        assert_eq!(PitchName::from_fifths(6).to_string(), "F#");
        assert_eq!(PitchName::from_fifths(-6).to_string(), "Gb");
    }

    #[test]
    fn test_interval_above_root() {
        let root = Pitch::parse("A3").unwrap();
        assert_eq!(Pitch::above(root, 3).to_string(), "C4");
        assert_eq!(Pitch::above(root, 7).to_string(), "E4");

        let flat_root = Pitch::parse("Bb3").unwrap();
        assert_eq!(Pitch::above(flat_root, 3).to_string(), "Db4");
    }
}
