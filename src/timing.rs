//! Timing resolution: maps every beat offset of a [`MusicData`] to wall-clock
//! seconds, in place.
//!
//! The tempo is a single value for the whole piece. A lead-in is added so that
//! beat 0 does not land on the very first frame of playback.

use crate::error::AnalysisError;
use crate::music_data::MusicData;
use crate::timed::{beat_to_f64, Beat, Seconds};

/// Pre-roll before beat 0, in seconds.
pub const DEFAULT_LEAD_IN_SECONDS: Seconds = 2.0;

/// Seconds at which `offset` sounds for the given tempo and lead-in.
pub fn beat_to_seconds(offset: Beat, bpm: f64, lead_in: Seconds) -> Seconds {
    let beats_per_second = bpm / 60.0;
    beat_to_f64(offset) / beats_per_second + lead_in
}

/// Tempo must be a positive, finite number of beats per minute.
pub fn validate_bpm(bpm: f64) -> Result<f64, AnalysisError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(bpm)
    } else {
        Err(AnalysisError::Config(format!(
            "tempo must be a positive number of beats per minute, got {}",
            bpm
        )))
    }
}

/// Lead-in must be finite and not negative.
pub fn validate_lead_in(lead_in: Seconds) -> Result<Seconds, AnalysisError> {
    if lead_in.is_finite() && lead_in >= 0.0 {
        Ok(lead_in)
    } else {
        Err(AnalysisError::Config(format!(
            "lead-in must be zero or more seconds, got {}",
            lead_in
        )))
    }
}

/// Set the time of every item in `data` from its offset.
///
/// Times are computed from offsets only, so running this again with the same
/// tempo gives the same result. The tempo used is recorded in `data.bpm`.
pub fn resolve_timing(data: &mut MusicData, bpm: f64, lead_in: Seconds) -> Result<(), AnalysisError> {
    let bpm = validate_bpm(bpm)?;
    let lead_in = validate_lead_in(lead_in)?;

    let mut resolved = 0usize;
    data.for_each_timing_mut(|timing| {
        timing.time = Some(beat_to_seconds(timing.offset, bpm, lead_in));
        resolved += 1;
    });
    data.bpm = bpm;
    log::info!(
        "resolved timing of {} item(s) at {} bpm, {}s lead-in",
        resolved,
        bpm,
        lead_in
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_data::extract_music_data;
    use crate::pitch::Pitch;
    use crate::score::{Part, Score, Syllabic};

    fn beat(n: i64) -> Beat {
        Beat::from_integer(n)
    }

    fn sample() -> MusicData {
        let mut score = Score::new(beat(8));
        score.set_regular_measures(beat(4));
        let mut part = Part::new("P1");
        part.push_note(beat(0), beat(2), vec![Pitch::parse("C4").unwrap()])
            .push_note(Beat::new(3, 2), beat(2), vec![Pitch::parse("E4").unwrap()])
            .push_lyric(beat(2), 1, Syllabic::Begin, "a")
            .push_lyric(beat(6), 1, Syllabic::End, "men");
        score.parts.push(part);
        extract_music_data(&score).unwrap()
    }

    #[test]
    fn test_beat_to_seconds() {
        assert_eq!(beat_to_seconds(beat(0), 120.0, 2.0), 2.0);
        assert_eq!(beat_to_seconds(beat(4), 120.0, 2.0), 4.0);
        assert_eq!(beat_to_seconds(Beat::new(3, 2), 60.0, 0.0), 1.5);
    }

    #[test]
    fn test_resolves_every_item() {
        let mut data = sample();
        resolve_timing(&mut data, 120.0, DEFAULT_LEAD_IN_SECONDS).unwrap();
        assert!(data.is_timed());
        assert_eq!(data.notes[1].time(), Some(2.75));
        let syllables = &data.lyrics[0].value;
        assert_eq!(syllables[0].time(), Some(3.0));
        assert_eq!(syllables[1].time(), Some(5.0));
        assert_eq!(data.chords[1].time(), Some(4.0));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut once = sample();
        resolve_timing(&mut once, 96.0, 1.0).unwrap();
        let mut twice = once.clone();
        resolve_timing(&mut twice, 96.0, 1.0).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_bad_tempo() {
        let mut data = sample();
        assert!(matches!(
            resolve_timing(&mut data, 0.0, 2.0),
            Err(AnalysisError::Config(_))
        ));
        assert!(matches!(
            resolve_timing(&mut data, f64::NAN, 2.0),
            Err(AnalysisError::Config(_))
        ));
        assert!(matches!(
            resolve_timing(&mut data, 120.0, -1.0),
            Err(AnalysisError::Config(_))
        ));
        assert!(!data.is_timed());
    }
}
