//! # Timed Values
//!
//! Every item in the music-data model (a chord, a note, a lyric, a key) is wrapped
//! in a [`Timed`] value that pins it to a position in the piece.
//!
//! ## Two clocks
//! - **Beat offset** ([`Beat`]): exact rational position in quarter-note beats from
//!   the start of the piece. Set by the extractors, never rounded.
//! - **Time** (`Option<Seconds>`): wall-clock position, `None` until the timing pass
//!   (`timing::resolve_timing`) maps the offset through the tempo.
//!
//! Offsets are always "flattened": already expressed in the global frame of the
//! whole piece, not relative to a measure or voice.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// Exact position or length in quarter-note beats.
pub type Beat = Rational64;

/// Wall-clock time in seconds.
pub type Seconds = f64;

/// Where an item sits in the piece, on both clocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub offset: Beat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Seconds>,
}

impl Timing {
    pub fn at(offset: Beat) -> Self {
        Self { offset, time: None }
    }
}

/// A value positioned in the piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timed<T> {
    pub value: T,
    #[serde(flatten)]
    pub timing: Timing,
}

impl<T> Timed<T> {
    /// Wrap `value` at `offset`, with time still unresolved.
    pub fn new(value: T, offset: Beat) -> Self {
        Self {
            value,
            timing: Timing::at(offset),
        }
    }

    pub fn offset(&self) -> Beat {
        self.timing.offset
    }

    pub fn time(&self) -> Option<Seconds> {
        self.timing.time
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            timing: self.timing,
        }
    }
}

/// Half-open beat interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatRange {
    pub start: Beat,
    pub end: Beat,
}

impl BeatRange {
    pub fn new(start: Beat, end: Beat) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: Beat) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Lossy conversion for the wall-clock domain.
pub fn beat_to_f64(beat: Beat) -> f64 {
    *beat.numer() as f64 / *beat.denom() as f64
}

/// Parse a non-negative beat value written as an integer (`6`), a decimal
/// (`1.5`, `.5`) or a fraction (`3/2`). The decimal form is converted exactly.
pub fn parse_beat(s: &str) -> Option<Beat> {
    let s = s.trim();
    if let Some((numer, denom)) = s.split_once('/') {
        let numer: i64 = numer.trim().parse().ok()?;
        let denom: i64 = denom.trim().parse().ok()?;
        if numer < 0 || denom <= 0 {
            return None;
        }
        return Some(Beat::new(numer, denom));
    }

    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let scale = 10i64.checked_pow(fraction.len() as u32)?;
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };
    let numer = whole.checked_mul(scale)?.checked_add(fraction)?;
    Some(Beat::new(numer, scale))
}
