//! Harmonic cluster resolution.
//!
//! Turns each [`HarmonicSpan`] into one or more timed chords.
//!
//! - **Explicit path**: the span carries a named chord. It must be the only distinct
//!   annotation in the span (chord symbols compare by root and quality, so `G` and
//!   `Gmaj` agree); the chord is emitted once at the span start.
//! - **Directive path**: every annotation is a directive. The directives must agree
//!   on harmonic rhythm and part scope; the span is then cut into sub-spans and the
//!   notes of the included parts in each sub-span are folded into one chord.

use super::annotation::{parse_directive, HarmonicParts, HarmonicRhythm};
use super::chord_symbol::Chord;
use super::spans::{build_spans, HarmonicSpan, SpanPlan};
use crate::error::AnalysisError;
use crate::pitch::Pitch;
use crate::score::{ChordAnnotation, PartId, Score};
use crate::timed::{Beat, BeatRange, Timed};
use std::collections::BTreeSet;

/// Most chords a numeric harmonic rhythm may cut one span into.
pub const MAX_SUB_SPANS: i64 = 100_000;

/// Resolve every span of `score` into chords.
///
/// The chords are ordered by offset and together cover `[0, length)`.
pub fn extract_harmonic_clusters(score: &Score) -> Result<Vec<Timed<Chord>>, AnalysisError> {
    let plan = build_spans(score)?;
    let mut chords = Vec::new();
    for span in &plan.spans {
        chords.extend(resolve_span(score, span, &plan)?);
    }
    log::info!(
        "resolved {} chord(s) from {} harmonic span(s)",
        chords.len(),
        plan.spans.len()
    );
    Ok(chords)
}

/// Resolve a single span.
pub fn resolve_span(
    score: &Score,
    span: &HarmonicSpan,
    plan: &SpanPlan,
) -> Result<Vec<Timed<Chord>>, AnalysisError> {
    if span.annotations.values().any(ChordAnnotation::is_explicit_chord) {
        return resolve_explicit(span).map(|chord| vec![chord]);
    }
    resolve_directives(score, span, plan)
}

fn resolve_explicit(span: &HarmonicSpan) -> Result<Timed<Chord>, AnalysisError> {
    let mut distinct: Vec<&ChordAnnotation> = Vec::new();
    for annotation in span.annotations.values() {
        if !distinct.iter().any(|seen| seen.same_as(annotation)) {
            distinct.push(annotation);
        }
    }

    match distinct.as_slice() {
        [ChordAnnotation::Chord(symbol)] => {
            log::debug!("beat {}: explicit chord {}", span.range.start, symbol.text);
            Ok(Timed::new(Chord::from_symbol(symbol), span.range.start))
        }
        _ => Err(AnalysisError::ConflictingHarmonicAnnotation {
            offset: span.range.start,
            annotations: distinct.iter().map(|a| a.text().to_string()).collect(),
        }),
    }
}

fn resolve_directives(
    score: &Score,
    span: &HarmonicSpan,
    plan: &SpanPlan,
) -> Result<Vec<Timed<Chord>>, AnalysisError> {
    let start = span.range.start;

    let mut rhythms: Vec<HarmonicRhythm> = Vec::new();
    let mut rhythm_text = "";
    let mut scopes: Vec<HarmonicParts> = Vec::new();
    let mut tagged_parts: BTreeSet<&PartId> = BTreeSet::new();
    for (part, annotation) in &span.annotations {
        let directive = parse_directive(annotation.text(), start)?;
        if let Some(rhythm) = directive.rhythm {
            if !rhythms.contains(&rhythm) {
                if rhythms.is_empty() {
                    rhythm_text = annotation.text();
                }
                rhythms.push(rhythm);
            }
        }
        if let Some(scope) = directive.parts {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
            if scope == HarmonicParts::TaggedParts {
                tagged_parts.insert(part);
            }
        }
    }

    if rhythms.len() > 1 {
        return Err(AnalysisError::AmbiguousSpanDirective {
            offset: start,
            message: format!("parts disagree on harmonic rhythm: {:?}", rhythms),
        });
    }
    if scopes.len() > 1 {
        return Err(AnalysisError::AmbiguousSpanDirective {
            offset: start,
            message: "parts disagree on harmonic part scope (p vs a)".to_string(),
        });
    }

    let included: Vec<&PartId> = if tagged_parts.is_empty() {
        score.parts.iter().map(|p| &p.id).collect()
    } else {
        tagged_parts.into_iter().collect()
    };

    let pool = candidate_pool(score, span.range, &included, plan);
    let starts = sub_span_starts(score, span.range, rhythms.first().copied()).ok_or_else(|| {
        AnalysisError::MalformedAnnotation {
            offset: start,
            text: rhythm_text.to_string(),
            reason: format!(
                "harmonic rhythm would cut the {}-beat span into more than {} chords",
                span.range.end - span.range.start,
                MAX_SUB_SPANS
            ),
        }
    })?;
    log::debug!(
        "beat {}: {} sub-span(s) over {} part(s), {} candidate event(s)",
        start,
        starts.len(),
        included.len(),
        pool.len()
    );

    let chords = starts
        .iter()
        .enumerate()
        .map(|(idx, &sub_start)| {
            let sub_end = starts.get(idx + 1).copied().unwrap_or(span.range.end);
            let sub_span = BeatRange::new(sub_start, sub_end);
            let pitches = pool
                .iter()
                .filter(|event| sub_span.contains(event.offset))
                .flat_map(|event| event.pitches.iter().copied());
            Timed::new(Chord::from_cluster(pitches), sub_start)
        })
        .collect();
    Ok(chords)
}

/// A pitched event eligible for clustering, borrowed from its part.
struct Candidate<'a> {
    offset: Beat,
    pitches: &'a [Pitch],
}

/// Events of the included parts inside `range`, minus the `x`-excluded ones.
///
/// Each event appears once, so the pool is already deduplicated by identity.
fn candidate_pool<'a>(
    score: &'a Score,
    range: BeatRange,
    included: &[&PartId],
    plan: &SpanPlan,
) -> Vec<Candidate<'a>> {
    score
        .parts
        .iter()
        .filter(|part| included.contains(&&part.id))
        .flat_map(|part| {
            part.notes
                .iter()
                .filter(move |note| range.contains(note.offset()))
                .filter(move |note| !plan.is_excluded(&part.id, note.offset()))
                .map(|note| Candidate {
                    offset: note.offset(),
                    pitches: &note.value.pitches,
                })
        })
        .collect()
}

/// Start offsets of the sub-spans of `range` for the given rhythm.
///
/// `None` when a numeric rhythm would produce more than [`MAX_SUB_SPANS`] starts.
fn sub_span_starts(
    score: &Score,
    range: BeatRange,
    rhythm: Option<HarmonicRhythm>,
) -> Option<Vec<Beat>> {
    let starts = match rhythm {
        None | Some(HarmonicRhythm::Never) => vec![range.start],
        Some(HarmonicRhythm::PerMeasure) => {
            let mut starts = vec![range.start];
            starts.extend(
                score
                    .measure_offsets
                    .iter()
                    .copied()
                    .filter(|&m| range.start < m && m < range.end)
                    .collect::<BTreeSet<Beat>>(),
            );
            starts
        }
        Some(HarmonicRhythm::EveryBeats(step)) => {
            let count = ((range.end - range.start) / step).ceil().to_integer();
            if count > MAX_SUB_SPANS {
                return None;
            }
            (0..count)
                .map(|i| range.start + step * Beat::from_integer(i))
                .collect()
        }
    };
    Some(starts)
}
