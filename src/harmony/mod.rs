//! # Harmony Module
//!
//! Derives one chord per stretch of the piece, either from explicit chord symbols
//! or by clustering the notes of the score, as steered by "no chord" directives.
//!
//! ## Purpose
//! Chord symbols written in the score are used as-is. Everywhere else the notes
//! are grouped into harmonic clusters; annotations whose text is not a chord tell
//! the analysis how to do that grouping.
//!
//! ## Annotation Rules
//! 1. Without any annotation, notes across all parts are grouped per measure
//!    (equivalent to the directive `ma` at beat 0).
//! 2. Every annotation sets the harmonic behaviour until the next annotation.
//! 3. A chord symbol on any part fixes the chord for its span, bypassing analysis.
//!    Different chord symbols in the same span are an error.
//! 4. No-chord text is either:
//!    - `x`: ignore the notes of this part at this beat, or
//!    - a directive made of a harmonic rhythm (`n` never / `m` every measure /
//!      a number of beats) and a part scope (`a` all parts / `p` only the parts
//!      annotated `p` at this beat). Parts must agree on both.
//!
//! ## Sub-modules
//! - `annotation` - directive grammar
//! - `chord_symbol` - explicit chord symbols, `Chord`, root estimation
//! - `spans` - grouping annotations into spans, collecting exclusions
//! - `cluster` - turning spans into timed chords
//!
//! ## Entry Point
//! [`extract_harmonic_clusters()`] - all chords of a score, ordered by offset
//!
//! ## Example
//! ```rust
//! use chordscape::harmony::extract_harmonic_clusters;
//! use chordscape::{Beat, Part, Pitch, Score};
//!
//! let mut score = Score::new(Beat::from_integer(8));
//! score.set_regular_measures(Beat::from_integer(4));
//! let mut piano = Part::new("P1");
//! piano
//!     .push_note(Beat::from_integer(0), Beat::from_integer(4), vec![Pitch::parse("C4").unwrap()])
//!     .push_note(Beat::from_integer(4), Beat::from_integer(4), vec![Pitch::parse("G4").unwrap()]);
//! score.parts.push(piano);
//!
//! let chords = extract_harmonic_clusters(&score).unwrap();
//! assert_eq!(chords.len(), 2); // one per measure by default
//! assert_eq!(chords[1].offset(), Beat::from_integer(4));
//! ```

pub mod annotation;
pub mod chord_symbol;
pub mod cluster;
pub mod spans;

#[cfg(test)]
mod tests;

pub use annotation::{parse_directive, HarmonicParts, HarmonicRhythm, SpanDirective};
pub use chord_symbol::{estimate_root, Chord, ChordQuality, ChordSymbol};
pub use cluster::{extract_harmonic_clusters, resolve_span};
pub use spans::{build_spans, Exclusions, HarmonicSpan, SpanPlan, DEFAULT_DIRECTIVE};
