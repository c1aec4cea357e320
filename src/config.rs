//! Session configuration, read from the JSON settings file.
//!
//! ```json
//! {
//!     "sampleRate": 44100,
//!     "frameSize": "2 * 1024",
//!     "hopSize": 512,
//!     "confidenceCoefficient": 1.0,
//!     "confidenceShift": 0.0,
//!     "notes": [[0, 261.63, 0.8, "c'"], [1, 293.66, 0.8, "d'"]]
//! }
//! ```
//!
//! Keys used only by the user interface or the score typesetter may be present
//! and are ignored.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::common::midi_note_to_freq;
use crate::error::{Error, Result};

/// Number of level meter samples averaged per level event.
pub const DEFAULT_LEVEL_BATCH_SIZE: usize = 2048;

/// Confidence stored for every note of the generated equal tempered table.
pub const DEFAULT_STORED_CONFIDENCE: f32 = 0.8;

/// One row of the note table: `[number, frequency, stored confidence, name]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(usize, f32, f32, String)")]
pub struct NoteEntry {
    pub number: usize,
    /// Frequency in Hz.
    pub frequency: f32,
    /// The confidence value as written in the settings file, before shaping.
    /// 0 means full confidence is required.
    pub stored_confidence: f32,
    /// Name used by the score typesetter.
    pub name: String,
}

impl From<(usize, f32, f32, String)> for NoteEntry {
    fn from((number, frequency, stored_confidence, name): (usize, f32, f32, String)) -> Self {
        NoteEntry {
            number,
            frequency,
            stored_confidence,
            name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Audio sample rate in Hz.
    #[serde(deserialize_with = "deserialize_count")]
    pub sample_rate: u32,
    /// Number of samples in each analysis frame. Must be even.
    #[serde(deserialize_with = "deserialize_count")]
    pub frame_size: usize,
    /// Number of samples the analysis frame advances between pitch estimates.
    #[serde(deserialize_with = "deserialize_count")]
    pub hop_size: usize,
    #[serde(deserialize_with = "deserialize_real")]
    pub confidence_coefficient: f32,
    #[serde(deserialize_with = "deserialize_real")]
    pub confidence_shift: f32,
    pub notes: Vec<NoteEntry>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(
        default = "default_level_batch_size",
        deserialize_with = "deserialize_count"
    )]
    pub level_batch_size: usize,
}

fn default_level_batch_size() -> usize {
    DEFAULT_LEVEL_BATCH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Config::with_equal_tempered_notes(44100, 2048, 512, 0..128, DEFAULT_STORED_CONFIDENCE)
    }
}

impl Config {
    /// Builds a configuration whose note table covers `note_range` in MIDI
    /// numbering, starting at note number 0 in the table. Table note `i` is the
    /// equal tempered MIDI note `note_range.start + i`.
    pub fn with_equal_tempered_notes(
        sample_rate: u32,
        frame_size: usize,
        hop_size: usize,
        note_range: core::ops::Range<usize>,
        stored_confidence: f32,
    ) -> Self {
        let first = note_range.start;
        let notes = note_range
            .map(|midi_note| NoteEntry {
                number: midi_note - first,
                frequency: midi_note_to_freq(midi_note as f32),
                stored_confidence,
                name: String::new(),
            })
            .collect();
        Config {
            sample_rate,
            frame_size,
            hop_size,
            confidence_coefficient: 1.0,
            confidence_shift: 0.0,
            notes,
            verbose: false,
            level_batch_size: DEFAULT_LEVEL_BATCH_SIZE,
        }
    }

    /// Parses and validates a JSON settings document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.notes.sort_by_key(|note| note.number);
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Config::from_json_str(&json)?;
        log::info!(
            "Read settings from {}: {} Hz, frame {}, hop {}, {} notes",
            path.display(),
            config.sample_rate,
            config.frame_size,
            config.hop_size,
            config.notes.len()
        );
        Ok(config)
    }

    /// Checks the invariants the pipeline relies on. `notes` must be sorted
    /// by number.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("Sample rate must be greater than 0".into()));
        }
        if self.frame_size == 0 || self.frame_size % 2 == 1 {
            return Err(Error::InvalidConfig(format!(
                "Frame size must be even and greater than 0. Read value: {}",
                self.frame_size
            )));
        }
        if self.hop_size == 0 || self.hop_size >= self.frame_size {
            return Err(Error::InvalidConfig(format!(
                "Hop size must be > 0 and < frame size {}. Read value: {}",
                self.frame_size, self.hop_size
            )));
        }
        if self.level_batch_size == 0 {
            return Err(Error::InvalidConfig("Level batch size must be greater than 0".into()));
        }
        if !(self.confidence_coefficient.is_finite() && self.confidence_shift.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "Confidence coefficient and shift must be finite. Read values: {}, {}",
                self.confidence_coefficient, self.confidence_shift
            )));
        }
        if self.notes.is_empty() {
            return Err(Error::InvalidConfig("Note table is empty".into()));
        }
        for (index, note) in self.notes.iter().enumerate() {
            if note.number != index {
                return Err(Error::InvalidConfig(format!(
                    "Note numbers must be contiguous from 0, found {} at position {}",
                    note.number, index
                )));
            }
            if !(note.frequency.is_finite() && note.frequency > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "Note {} has invalid frequency {}",
                    note.number, note.frequency
                )));
            }
        }
        for pair in self.notes.windows(2) {
            if pair[1].frequency <= pair[0].frequency {
                return Err(Error::InvalidConfig(format!(
                    "Note frequencies must be strictly increasing: note {} ({} Hz) follows {} Hz",
                    pair[1].number, pair[1].frequency, pair[0].frequency
                )));
            }
        }
        Ok(())
    }

    /// The minimal confidence required to accept each note: a stored value of 0
    /// requires full confidence, anything else is `stored * coefficient + shift`
    /// floored at 0.
    pub fn minimal_confidence(&self) -> Vec<f32> {
        self.notes
            .iter()
            .map(|note| {
                if note.stored_confidence == 0.0 {
                    1.0
                } else {
                    (note.stored_confidence * self.confidence_coefficient + self.confidence_shift)
                        .max(0.0)
                }
            })
            .collect()
    }

    pub fn frequencies(&self) -> Vec<f32> {
        self.notes.iter().map(|note| note.frequency).collect()
    }
}

/// A numeric settings value. Strings may hold a plain number or a product
/// of two integers, `"a * b"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Value(f64),
    Text(String),
}

impl Number {
    fn resolve(&self) -> Option<f64> {
        match self {
            Number::Value(value) => Some(*value),
            Number::Text(text) => {
                let pieces: Vec<&str> = text.split_whitespace().collect();
                match pieces.as_slice() {
                    [value] => value.parse().ok(),
                    [a, "*", b] => {
                        let a: i64 = a.parse().ok()?;
                        let b: i64 = b.parse().ok()?;
                        Some(a.checked_mul(b)? as f64)
                    }
                    _ => None,
                }
            }
        }
    }
}

fn deserialize_real<'de, D>(deserializer: D) -> core::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    number
        .resolve()
        .map(|value| value as f32)
        .ok_or_else(|| serde::de::Error::custom("expected a number or \"a * b\""))
}

fn deserialize_count<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let number = Number::deserialize(deserializer)?;
    let value = number
        .resolve()
        .ok_or_else(|| serde::de::Error::custom("expected a number or \"a * b\""))?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            value
        )));
    }
    T::try_from(value as u64).map_err(|_| serde::de::Error::custom("value out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"{
        "sampleRate": 48000,
        "frameSize": "2 * 1024",
        "hopSize": "512",
        "confidenceCoefficient": 0.5,
        "confidenceShift": 0.1,
        "indicatorWidth": 4,
        "lilypondHeader": "\\version",
        "notes": [
            [1, 200.0, 0.0, "b"],
            [0, 100.0, 0.8, "a"],
            [2, 400.0, 0.1, "c"]
        ]
    }"#;

    #[test]
    fn test_parse_settings() {
        let config = Config::from_json_str(SETTINGS).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.hop_size, 512);
        assert_eq!(config.level_batch_size, DEFAULT_LEVEL_BATCH_SIZE);
        assert!(!config.verbose);
        assert_eq!(config.frequencies(), vec![100.0, 200.0, 400.0]);
        assert_eq!(config.notes[1].name, "b");
    }

    #[test]
    fn test_minimal_confidence_shaping() {
        let config = Config::from_json_str(SETTINGS).unwrap();
        let confidence = config.minimal_confidence();
        assert!((confidence[0] - 0.5).abs() < 1e-6);
        // A stored 0 requires full confidence.
        assert_eq!(confidence[1], 1.0);
        assert!((confidence[2] - 0.15).abs() < 1e-6);

        let mut floored = config.clone();
        floored.confidence_shift = -1.0;
        assert_eq!(floored.minimal_confidence()[0], 0.0);
    }

    #[test]
    fn test_odd_frame_size() {
        let json = SETTINGS.replace("\"2 * 1024\"", "1025");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_hop_not_smaller_than_frame() {
        let json = SETTINGS.replace("\"512\"", "2048");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_gap_in_note_numbers() {
        let json = SETTINGS.replace("[2, 400.0", "[3, 400.0");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_decreasing_frequencies() {
        let json = SETTINGS.replace("400.0", "150.0");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_number() {
        let json = SETTINGS.replace("\"2 * 1024\"", "\"2 x 1024\"");
        assert!(matches!(Config::from_json_str(&json), Err(Error::Json(_))));
    }

    #[test]
    fn test_product_overflow() {
        let json = SETTINGS.replace("\"2 * 1024\"", "\"9223372036854775807 * 2\"");
        assert!(matches!(Config::from_json_str(&json), Err(Error::Json(_))));
    }

    #[test]
    fn test_non_finite_confidence() {
        let json = SETTINGS.replace("\"confidenceShift\": 0.1", "\"confidenceShift\": \"NaN\"");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
        let json = SETTINGS.replace("\"confidenceCoefficient\": 0.5", "\"confidenceCoefficient\": \"inf\"");
        assert!(matches!(Config::from_json_str(&json), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notes.len(), 128);
        assert!((config.notes[69].frequency - 440.0).abs() < 2.0);
    }
}
