//! # Error Types
//!
//! This module defines all error types for chordscape.
//!
//! Every error that comes out of the harmonic analysis carries the beat offset
//! (and, where relevant, the offending annotation text) so that a user can find
//! the problem in their score.
//!
//! ## Error Types
//! - `MalformedAnnotation` - directive text that does not match the annotation grammar
//! - `ConflictingHarmonicAnnotation` - several different explicit chords in one span
//! - `AmbiguousSpanDirective` - parts disagree on harmonic rhythm or part scope
//! - `ConflictingKeyAnnotation` - two different keys at the same offset
//! - `InvalidRange` - a range filter with reversed bounds, or a time filter before timing
//! - `MusicXml` - the input document could not be read
//! - `Config` / `Snapshot` / `Io` - ambient failures of the binary and loaders
//!
//! All errors are fatal for the score being processed: no partial music data is
//! returned once one of them has been raised.
//!
//! ## Usage
//! ```rust
//! use chordscape::{extract_music_data, AnalysisError, Beat, Score};
//!
//! let score = Score::new(Beat::from_integer(4));
//! match extract_music_data(&score) {
//!     Ok(data) => println!("{} chords", data.chords.len()),
//!     Err(AnalysisError::MalformedAnnotation { offset, text, .. }) => {
//!         eprintln!("bad annotation '{}' at beat {}", text, offset);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use crate::timed::Beat;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A directive annotation's text does not follow the annotation grammar.
    ///
    /// # Example
    /// ```
    /// # use chordscape::{AnalysisError, Beat};
    /// let err = AnalysisError::MalformedAnnotation {
    ///     offset: Beat::new(3, 2),
    ///     text: "mm".to_string(),
    ///     reason: "expected harmonic rhythm and/or part scope".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Malformed annotation 'mm' at beat 3/2: expected harmonic rhythm and/or part scope"
    /// );
    /// ```
    #[error("Malformed annotation '{text}' at beat {offset}: {reason}")]
    MalformedAnnotation {
        offset: Beat,
        text: String,
        reason: String,
    },

    /// More than one distinct annotation in a span that names an explicit chord.
    #[error("Conflicting harmonic annotations at beat {offset}: {}", annotations.join(", "))]
    ConflictingHarmonicAnnotation {
        offset: Beat,
        annotations: Vec<String>,
    },

    /// Parts disagree on how to subdivide a span or which parts to include.
    #[error("Ambiguous span directive at beat {offset}: {message}")]
    AmbiguousSpanDirective { offset: Beat, message: String },

    /// Two different keys claimed at the same offset.
    #[error("Conflicting key annotations at beat {offset}: {}", keys.join(", "))]
    ConflictingKeyAnnotation { offset: Beat, keys: Vec<String> },

    /// A range filter request that cannot be satisfied.
    #[error("Invalid range: {message}")]
    InvalidRange { message: String },

    /// The MusicXML input could not be read.
    #[error("MusicXML error: {message}")]
    MusicXml { message: String },

    /// Invalid YAML configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A snapshot could not be written or read back.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Error accessing '{path}': {message}")]
    Io { path: String, message: String },
}
