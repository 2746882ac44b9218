//! Harmonic span building.
//!
//! Collects every chord annotation of every part, splits off the `x` exclusion
//! markers, and groups the rest by offset. Each group opens a span that lasts
//! until the next group (or the end of the piece), so the spans partition
//! `[0, length)` with no gaps or overlaps.

use crate::error::AnalysisError;
use crate::score::{ChordAnnotation, PartId, Score};
use crate::timed::{Beat, BeatRange};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Directive applied from the start of a piece that has no annotation at beat 0:
/// one chord per measure, across all parts.
pub const DEFAULT_DIRECTIVE: &str = "ma";

/// A stretch of the piece governed by the annotations found at its start.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicSpan {
    pub range: BeatRange,
    pub annotations: BTreeMap<PartId, ChordAnnotation>,
}

/// Offsets excluded with `x`, per part.
pub type Exclusions = BTreeMap<PartId, Vec<Beat>>;

/// Output of [`build_spans`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanPlan {
    pub spans: Vec<HarmonicSpan>,
    pub exclusions: Exclusions,
}

impl SpanPlan {
    /// Whether `part` has its notes at `offset` excluded.
    pub fn is_excluded(&self, part: &str, offset: Beat) -> bool {
        self.exclusions
            .get(part)
            .map_or(false, |offsets| offsets.contains(&offset))
    }
}

/// Build the ordered spans and the per-part exclusions for `score`.
///
/// Two different annotations on the same part at the same offset are reported as
/// [`AnalysisError::ConflictingHarmonicAnnotation`] when either names a chord, and
/// as [`AnalysisError::AmbiguousSpanDirective`] when both are directives.
pub fn build_spans(score: &Score) -> Result<SpanPlan, AnalysisError> {
    let mut annotated: Vec<(Beat, &PartId, &ChordAnnotation)> = score
        .parts
        .iter()
        .flat_map(|part| {
            part.annotations
                .iter()
                .map(move |a| (a.offset(), &part.id, &a.value))
        })
        .collect();
    annotated.sort_by_key(|(offset, _, _)| *offset);

    let mut exclusions = Exclusions::new();
    let mut grouped: Vec<(Beat, BTreeMap<PartId, ChordAnnotation>)> = Vec::new();

    for (offset, part, annotation) in annotated {
        if annotation.is_exclusion() {
            exclusions.entry(part.clone()).or_default().push(offset);
            continue;
        }

        if grouped.last().map_or(true, |(last, _)| *last != offset) {
            grouped.push((offset, BTreeMap::new()));
        }
        let Some((_, at_offset)) = grouped.last_mut() else {
            continue;
        };
        match at_offset.entry(part.clone()) {
            Entry::Occupied(existing) if existing.get().same_as(annotation) => {}
            Entry::Occupied(existing)
                if existing.get().is_explicit_chord() || annotation.is_explicit_chord() =>
            {
                return Err(AnalysisError::ConflictingHarmonicAnnotation {
                    offset,
                    annotations: vec![
                        existing.get().text().to_string(),
                        annotation.text().to_string(),
                    ],
                });
            }
            Entry::Occupied(existing) => {
                return Err(AnalysisError::AmbiguousSpanDirective {
                    offset,
                    message: format!(
                        "part '{}' carries two directives: '{}' and '{}'",
                        part,
                        existing.get().text(),
                        annotation.text()
                    ),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(annotation.clone());
            }
        }
    }

    if grouped
        .first()
        .map_or(true, |(offset, _)| *offset > Beat::from_integer(0))
    {
        let default_part = score.parts.first().map(|p| p.id.clone()).unwrap_or_default();
        log::debug!(
            "no annotation at beat 0, inserting default '{}' directive on part '{}'",
            DEFAULT_DIRECTIVE,
            default_part
        );
        let mut defaults = BTreeMap::new();
        defaults.insert(
            default_part,
            ChordAnnotation::NoChord(DEFAULT_DIRECTIVE.to_string()),
        );
        grouped.insert(0, (Beat::from_integer(0), defaults));
    }

    let mut spans = Vec::with_capacity(grouped.len());
    for (idx, (start, annotations)) in grouped.iter().enumerate() {
        let end = grouped
            .get(idx + 1)
            .map_or(score.length, |(next, _)| *next)
            .min(score.length);
        let range = BeatRange::new(*start, end);
        if range.is_empty() {
            log::warn!(
                "ignoring chord annotations at beat {} (piece ends at beat {})",
                start,
                score.length
            );
            continue;
        }
        spans.push(HarmonicSpan {
            range,
            annotations: annotations.clone(),
        });
    }

    log::debug!(
        "built {} harmonic span(s), {} part(s) with exclusions",
        spans.len(),
        exclusions.len()
    );
    Ok(SpanPlan { spans, exclusions })
}
