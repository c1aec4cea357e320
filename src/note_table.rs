//! Note frequencies and the pitch ranges that map to each note.

use crate::config::Config;
use crate::error::{Error, Result};

/// Inclusive range of pitches, in Hz, classified as one note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteBoundary {
    pub low: f32,
    pub high: f32,
}

impl NoteBoundary {
    pub fn contains(&self, pitch: f32) -> bool {
        self.low <= pitch && pitch <= self.high
    }
}

/// Immutable note table derived from the configuration.
///
/// Boundaries lie halfway between adjacent note frequencies. The first note
/// starts at 0 Hz and the last one extends to infinity, so the ranges cover
/// `[0, inf)` without gaps. Adjacent ranges share their boundary value.
#[derive(Debug, Clone)]
pub struct NoteTable {
    frequencies: Vec<f32>,
    boundaries: Vec<NoteBoundary>,
    min_confidence: Vec<f32>,
}

impl NoteTable {
    pub fn from_config(config: &Config) -> Result<Self> {
        NoteTable::new(config.frequencies(), config.minimal_confidence())
    }

    /// `frequencies` must be strictly increasing and `min_confidence` must have
    /// one entry per note.
    pub fn new(frequencies: Vec<f32>, min_confidence: Vec<f32>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::InvalidConfig("Note table is empty".into()));
        }
        if frequencies.len() != min_confidence.len() {
            return Err(Error::InvalidConfig(format!(
                "Got {} note frequencies but {} confidence thresholds",
                frequencies.len(),
                min_confidence.len()
            )));
        }
        if let Some(frequency) = frequencies.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(Error::InvalidConfig(format!("Invalid note frequency {}", frequency)));
        }
        if frequencies.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(Error::InvalidConfig(
                "Note frequencies must be strictly increasing".into(),
            ));
        }

        let mut boundaries = Vec::with_capacity(frequencies.len());
        let mut last_boundary = 0.0;
        for pair in frequencies.windows(2) {
            let boundary = (pair[0] + pair[1]) / 2.0;
            boundaries.push(NoteBoundary {
                low: last_boundary,
                high: boundary,
            });
            last_boundary = boundary;
        }
        boundaries.push(NoteBoundary {
            low: last_boundary,
            high: f32::INFINITY,
        });

        Ok(NoteTable {
            frequencies,
            boundaries,
            min_confidence,
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequency(&self, note: usize) -> f32 {
        self.frequencies[note]
    }

    pub fn boundary(&self, note: usize) -> NoteBoundary {
        self.boundaries[note]
    }

    pub fn boundaries(&self) -> &[NoteBoundary] {
        &self.boundaries
    }

    /// The confidence a detection must reach to be accepted as `note`.
    pub fn min_confidence(&self, note: usize) -> f32 {
        self.min_confidence[note]
    }

    /// Binary search for the note whose range contains `pitch`.
    ///
    /// A pitch exactly on a shared boundary maps to whichever of the two
    /// adjacent notes the search reaches first; both ranges contain it.
    /// Negative pitches map to note 0.
    pub fn find_note(&self, pitch: f32) -> usize {
        let boundaries = &self.boundaries;
        let mut beg = 0;
        let mut end = boundaries.len() - 1;
        while beg < end {
            let mid = (beg + end) / 2;
            if boundaries[mid].high < pitch {
                beg = mid + 1;
            } else if boundaries[mid].low > pitch {
                if mid == 0 {
                    break;
                }
                end = mid - 1;
            } else {
                beg = mid;
                end = mid;
            }
        }
        beg
    }
}
