//! Analysis configuration.
//!
//! Read from YAML in two steps: [`RawConfig`] accepts whatever the file says
//! (every key optional), then [`Config::from_raw`] validates it into typed values.
//!
//! ```yaml
//! bpm: 96
//! default-bpm: 120
//! lead-in: 2.0
//! beat-range: "0:16"
//! time-range: "2:10.5"
//! ```

use crate::error::AnalysisError;
use crate::music_data::DEFAULT_BPM;
use crate::timed::{parse_beat, Beat, Seconds};
use crate::timing::{validate_bpm, validate_lead_in, DEFAULT_LEAD_IN_SECONDS};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Configuration as written, before validation.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub bpm: Option<f64>,
    pub default_bpm: Option<f64>,
    pub lead_in: Option<f64>,
    pub beat_range: Option<String>,
    pub time_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Overrides the score's tempo when set.
    pub bpm: Option<f64>,
    pub default_bpm: f64,
    pub lead_in: Seconds,
    pub beat_range: Option<(Beat, Beat)>,
    pub time_range: Option<(Seconds, Seconds)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: None,
            default_bpm: DEFAULT_BPM,
            lead_in: DEFAULT_LEAD_IN_SECONDS,
            beat_range: None,
            time_range: None,
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, AnalysisError> {
        // An empty document deserializes as unit, not as a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path).map_err(|e| AnalysisError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_yaml(&content)?;
        log::debug!("loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, AnalysisError> {
        let bpm = raw.bpm.map(validate_bpm).transpose()?;
        let default_bpm = validate_bpm(raw.default_bpm.unwrap_or(DEFAULT_BPM))?;
        let lead_in = validate_lead_in(raw.lead_in.unwrap_or(DEFAULT_LEAD_IN_SECONDS))?;
        let beat_range = raw.beat_range.as_deref().map(parse_beat_range).transpose()?;
        let time_range = raw.time_range.as_deref().map(parse_time_range).transpose()?;

        Ok(Config {
            bpm,
            default_bpm,
            lead_in,
            beat_range,
            time_range,
        })
    }

    /// Tempo to resolve timing with: the override, else the score's tempo, else
    /// the configured default.
    pub fn effective_bpm(&self, score_tempo: Option<f64>) -> f64 {
        self.bpm
            .or(score_tempo.filter(|t| t.is_finite() && *t > 0.0))
            .unwrap_or(self.default_bpm)
    }
}

fn split_range(s: &str) -> Result<(&str, &str), AnalysisError> {
    s.split_once(':').ok_or_else(|| AnalysisError::InvalidRange {
        message: format!("expected 'start:end', got '{}'", s),
    })
}

/// Parse `"b0:b1"`; each bound may be an integer, decimal or fraction.
pub fn parse_beat_range(s: &str) -> Result<(Beat, Beat), AnalysisError> {
    let (start, end) = split_range(s)?;
    let bound = |b: &str| {
        parse_beat(b).ok_or_else(|| AnalysisError::InvalidRange {
            message: format!("invalid beat '{}' in range '{}'", b.trim(), s),
        })
    };
    let (start, end) = (bound(start)?, bound(end)?);
    if end < start {
        return Err(AnalysisError::InvalidRange {
            message: format!("beat range '{}' ends before it starts", s),
        });
    }
    Ok((start, end))
}

/// Parse `"t0:t1"` in seconds.
pub fn parse_time_range(s: &str) -> Result<(Seconds, Seconds), AnalysisError> {
    let (start, end) = split_range(s)?;
    let bound = |t: &str| {
        t.trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .ok_or_else(|| AnalysisError::InvalidRange {
                message: format!("invalid time '{}' in range '{}'", t.trim(), s),
            })
    };
    let (start, end) = (bound(start)?, bound(end)?);
    if end < start {
        return Err(AnalysisError::InvalidRange {
            message: format!("time range '{}' ends before it starts", s),
        });
    }
    Ok((start, end))
}
