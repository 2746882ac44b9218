use super::*;
use crate::error::AnalysisError;
use crate::pitch::Pitch;
use crate::score::{Part, Score};
use crate::timed::{Beat, Timed};

fn beat(n: i64) -> Beat {
    Beat::from_integer(n)
}

fn p(name: &str) -> Pitch {
    Pitch::parse(name).unwrap()
}

fn names(chord: &Chord) -> Vec<String> {
    chord.pitches.iter().map(|p| p.to_string()).collect()
}

fn offsets(chords: &[Timed<Chord>]) -> Vec<Beat> {
    chords.iter().map(|c| c.offset()).collect()
}

/// One note per beat, cycling through `pitches`, for `length` beats.
fn part_with_notes(id: &str, length: i64, pitches: &[&str]) -> Part {
    let mut part = Part::new(id);
    for i in 0..length {
        let pitch = pitches[i as usize % pitches.len()];
        part.push_note(beat(i), beat(1), vec![p(pitch)]);
    }
    part
}

fn score_with(parts: Vec<Part>, length: i64, measure: i64) -> Score {
    let mut score = Score::new(beat(length));
    score.set_regular_measures(beat(measure));
    score.parts = parts;
    score
}

fn assert_partition(chords: &[Timed<Chord>], length: Beat) {
    assert_eq!(chords.first().map(|c| c.offset()), Some(beat(0)));
    for pair in chords.windows(2) {
        assert!(pair[0].offset() < pair[1].offset(), "chords must be strictly ordered");
    }
    assert!(chords.last().unwrap().offset() < length);
}

#[test]
fn test_default_is_one_chord_per_measure() {
    let score = score_with(vec![part_with_notes("P1", 16, &["C4", "E4", "G4"])], 16, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(offsets(&chords), vec![beat(0), beat(4), beat(8), beat(12)]);
    assert_partition(&chords, score.length);
}

#[test]
fn test_measure_rhythm_example() {
    let mut part = part_with_notes("P1", 16, &["C4", "D4", "E4", "F4"]);
    part.push_no_chord(beat(0), "m");
    let score = score_with(vec![part], 16, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(offsets(&chords), vec![beat(0), beat(4), beat(8), beat(12)]);
    assert_eq!(names(&chords[0].value), vec!["C4", "D4", "E4", "F4"]);
}

#[test]
fn test_numeric_rhythm_example() {
    let mut part = part_with_notes("P1", 10, &["C4", "E4"]);
    part.push_no_chord(beat(0), "2");
    let score = score_with(vec![part], 10, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(
        offsets(&chords),
        vec![beat(0), beat(2), beat(4), beat(6), beat(8)]
    );
    for chord in &chords {
        assert_eq!(names(&chord.value), vec!["C4", "E4"]);
    }
}

#[test]
fn test_fractional_rhythm() {
    let mut part = part_with_notes("P1", 3, &["C4"]);
    part.push_no_chord(beat(0), ".5");
    let score = score_with(vec![part], 3, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 6);
    assert_eq!(chords[1].offset(), Beat::new(1, 2));
    // Notes sit on whole beats, so every other half beat is silent.
    assert!(!chords[0].value.is_silent());
    assert!(chords[1].value.is_silent());
}

#[test]
fn test_never_rhythm_holds_until_next_annotation() {
    let mut part = part_with_notes("P1", 8, &["C4", "E4", "G4", "B4"]);
    part.push_no_chord(beat(0), "n").push_no_chord(beat(6), "n");
    let score = score_with(vec![part], 8, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(offsets(&chords), vec![beat(0), beat(6)]);
    assert_eq!(names(&chords[0].value), vec!["C4", "E4", "G4", "B4"]);
    assert_eq!(names(&chords[1].value), vec!["G4", "B4"]);
}

#[test]
fn test_measure_rhythm_starting_mid_measure() {
    let mut part = part_with_notes("P1", 8, &["C4"]);
    part.push_no_chord(beat(0), "n").push_no_chord(beat(2), "m");
    let score = score_with(vec![part], 8, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(offsets(&chords), vec![beat(0), beat(2), beat(4)]);
}

#[test]
fn test_scope_p_restricts_to_tagged_parts() {
    let mut a = part_with_notes("A", 4, &["C4"]);
    a.push_no_chord(beat(0), "p");
    let b = part_with_notes("B", 4, &["F#2"]);
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
    assert_eq!(names(&chords[0].value), vec!["C4"]);
}

#[test]
fn test_scope_p_includes_every_tagged_part() {
    let mut a = part_with_notes("A", 4, &["C4"]);
    a.push_no_chord(beat(0), "np");
    let mut b = part_with_notes("B", 4, &["E4"]);
    b.push_no_chord(beat(0), "p");
    let c = part_with_notes("C", 4, &["G2"]);
    let score = score_with(vec![a, b, c], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(names(&chords[0].value), vec!["C4", "E4"]);
}

#[test]
fn test_scope_a_includes_unannotated_parts() {
    let mut a = part_with_notes("A", 4, &["C4"]);
    a.push_no_chord(beat(0), "na");
    let b = part_with_notes("B", 4, &["G2"]);
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(names(&chords[0].value), vec!["G2", "C4"]);
}

#[test]
fn test_exclusion_drops_only_that_event() {
    let mut part = Part::new("P1");
    part.push_note(beat(0), beat(3), vec![p("C4")])
        .push_note(beat(3), beat(1), vec![p("F#4")])
        .push_no_chord(beat(0), "n")
        .push_no_chord(beat(3), "x");
    let score = score_with(vec![part], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
    assert_eq!(names(&chords[0].value), vec!["C4"]);
}

#[test]
fn test_exclusion_is_per_part() {
    let mut a = Part::new("A");
    a.push_note(beat(2), beat(1), vec![p("C4")])
        .push_no_chord(beat(2), "x");
    let mut b = Part::new("B");
    b.push_note(beat(2), beat(1), vec![p("E4")]);
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(names(&chords[0].value), vec!["E4"]);
}

#[test]
fn test_chord_events_contribute_all_pitches() {
    let mut part = Part::new("P1");
    part.push_note(beat(0), beat(4), vec![p("C4"), p("E4"), p("G4")])
        .push_note(beat(1), beat(1), vec![p("C5")]);
    let score = score_with(vec![part], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(names(&chords[0].value), vec!["C4", "E4", "G4", "C5"]);
    assert_eq!(chords[0].value.root.unwrap().to_string(), "C");
}

#[test]
fn test_duplicate_pitches_fold_into_one() {
    let mut a = part_with_notes("A", 4, &["C4"]);
    a.push_no_chord(beat(0), "n");
    let b = part_with_notes("B", 4, &["C4"]);
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(names(&chords[0].value), vec!["C4"]);
}

#[test]
fn test_silent_span_is_empty_chord() {
    let mut part = Part::new("P1");
    part.push_no_chord(beat(0), "n");
    let score = score_with(vec![part], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
    assert!(chords[0].value.is_silent());
    assert_eq!(chords[0].value.root, None);
}

#[test]
fn test_explicit_chord_bypasses_clustering() {
    let mut part = part_with_notes("P1", 8, &["C4", "E4"]);
    part.push_chord_symbol(beat(0), ChordSymbol::parse("Am7").unwrap());
    let score = score_with(vec![part], 8, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
    assert_eq!(chords[0].value.symbol.as_deref(), Some("Am7"));
    assert_eq!(names(&chords[0].value), vec!["A3", "C4", "E4", "G4"]);
}

#[test]
fn test_same_explicit_chord_on_two_parts_is_fine() {
    let mut a = Part::new("A");
    a.push_chord_symbol(beat(0), ChordSymbol::parse("G").unwrap());
    let mut b = Part::new("B");
    b.push_chord_symbol(beat(0), ChordSymbol::parse("G").unwrap());
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
}

#[test]
fn test_conflicting_explicit_chords() {
    let mut a = Part::new("A");
    a.push_chord_symbol(beat(0), ChordSymbol::parse("C").unwrap());
    let mut b = Part::new("B");
    b.push_chord_symbol(beat(0), ChordSymbol::parse("F").unwrap());
    let score = score_with(vec![a, b], 4, 4);
    let err = extract_harmonic_clusters(&score).unwrap_err();
    match err {
        AnalysisError::ConflictingHarmonicAnnotation { offset, annotations } => {
            assert_eq!(offset, beat(0));
            assert_eq!(annotations, vec!["C".to_string(), "F".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_explicit_chord_with_directive_conflicts() {
    let mut a = Part::new("A");
    a.push_chord_symbol(beat(0), ChordSymbol::parse("C").unwrap());
    let mut b = Part::new("B");
    b.push_no_chord(beat(0), "m");
    let score = score_with(vec![a, b], 4, 4);
    assert!(matches!(
        extract_harmonic_clusters(&score),
        Err(AnalysisError::ConflictingHarmonicAnnotation { .. })
    ));
}

#[test]
fn test_disagreeing_rhythms_are_ambiguous() {
    let mut a = Part::new("A");
    a.push_no_chord(beat(0), "m");
    let mut b = Part::new("B");
    b.push_no_chord(beat(0), "2");
    let score = score_with(vec![a, b], 8, 4);
    assert!(matches!(
        extract_harmonic_clusters(&score),
        Err(AnalysisError::AmbiguousSpanDirective { .. })
    ));
}

#[test]
fn test_disagreeing_scopes_are_ambiguous() {
    let mut a = Part::new("A");
    a.push_no_chord(beat(0), "p");
    let mut b = Part::new("B");
    b.push_no_chord(beat(0), "a");
    let score = score_with(vec![a, b], 8, 4);
    assert!(matches!(
        extract_harmonic_clusters(&score),
        Err(AnalysisError::AmbiguousSpanDirective { .. })
    ));
}

#[test]
fn test_two_directives_on_one_part_are_ambiguous() {
    let mut part = part_with_notes("P1", 8, &["C4"]);
    part.push_no_chord(beat(0), "m").push_no_chord(beat(0), "2");
    let score = score_with(vec![part], 8, 4);
    match extract_harmonic_clusters(&score) {
        Err(AnalysisError::AmbiguousSpanDirective { offset, message }) => {
            assert_eq!(offset, beat(0));
            assert!(message.contains("P1"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_repeated_directive_on_one_part_is_fine() {
    let mut part = part_with_notes("P1", 8, &["C4"]);
    part.push_no_chord(beat(0), "m").push_no_chord(beat(0), " M ");
    let score = score_with(vec![part], 8, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(offsets(&chords), vec![beat(0), beat(4)]);
}

#[test]
fn test_chord_and_directive_on_one_part_conflict() {
    let mut part = Part::new("P1");
    part.push_chord_symbol(beat(0), ChordSymbol::parse("C").unwrap())
        .push_no_chord(beat(0), "m");
    let score = score_with(vec![part], 4, 4);
    assert!(matches!(
        extract_harmonic_clusters(&score),
        Err(AnalysisError::ConflictingHarmonicAnnotation { .. })
    ));
}

#[test]
fn test_same_chord_spelled_differently_is_fine() {
    let mut a = Part::new("A");
    a.push_chord_symbol(beat(0), ChordSymbol::parse("G").unwrap());
    let mut b = Part::new("B");
    b.push_chord_symbol(beat(0), ChordSymbol::parse("Gmaj").unwrap());
    let score = score_with(vec![a, b], 4, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 1);
    assert_eq!(chords[0].value.symbol.as_deref(), Some("G"));
}

#[test]
fn test_too_fine_rhythm_is_rejected() {
    let mut part = part_with_notes("P1", 64, &["C4"]);
    part.push_no_chord(beat(0), ".000001");
    let score = score_with(vec![part], 64, 4);
    match extract_harmonic_clusters(&score) {
        Err(AnalysisError::MalformedAnnotation { offset, text, reason }) => {
            assert_eq!(offset, beat(0));
            assert_eq!(text, ".000001");
            assert!(reason.contains("100000"), "{reason}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_rhythm_at_the_sub_span_limit() {
    let mut part = part_with_notes("P1", 1, &["C4"]);
    part.push_no_chord(beat(0), ".00001");
    let score = score_with(vec![part], 1, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_eq!(chords.len(), 100_000);
    assert_eq!(chords[1].offset(), Beat::new(1, 100_000));
}

#[test]
fn test_unspecified_tokens_do_not_conflict() {
    let mut a = part_with_notes("A", 8, &["C4"]);
    a.push_no_chord(beat(0), "m");
    let mut b = part_with_notes("B", 8, &["E4"]);
    b.push_no_chord(beat(0), "p");
    let score = score_with(vec![a, b], 8, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    // Rhythm from A, scope from B: per measure, only B is tagged.
    assert_eq!(offsets(&chords), vec![beat(0), beat(4)]);
    assert_eq!(names(&chords[0].value), vec!["E4"]);
}

#[test]
fn test_malformed_directive_fails_the_score() {
    let mut part = Part::new("P1");
    part.push_no_chord(beat(4), "mm");
    let score = score_with(vec![part], 8, 4);
    match extract_harmonic_clusters(&score) {
        Err(AnalysisError::MalformedAnnotation { offset, text, .. }) => {
            assert_eq!(offset, beat(4));
            assert_eq!(text, "mm");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_mixed_spans_partition_the_piece() {
    let mut a = part_with_notes("A", 20, &["C4", "E4", "G4"]);
    a.push_no_chord(beat(0), "1.5")
        .push_chord_symbol(beat(5), ChordSymbol::parse("F").unwrap())
        .push_no_chord(beat(9), "m");
    let b = part_with_notes("B", 20, &["C3"]);
    let score = score_with(vec![a, b], 20, 4);
    let chords = extract_harmonic_clusters(&score).unwrap();
    assert_partition(&chords, score.length);
    // 0, 1.5, 3, 4.5 | 5 | 9, 12, 16
    assert_eq!(chords.len(), 8);
    assert_eq!(chords[4].offset(), beat(5));
    assert_eq!(chords[5].offset(), beat(9));
}

#[test]
fn test_empty_score_has_no_chords() {
    let score = Score::new(beat(0));
    assert!(extract_harmonic_clusters(&score).unwrap().is_empty());
}
