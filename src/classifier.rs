//! Turns per-frame pitch estimates into note events.

use std::sync::Arc;

use crate::estimator::PitchEstimate;
use crate::note_table::NoteTable;

/// Outcome of classifying one pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The pitch is still within the current note, or is not a usable pitch.
    Unchanged,
    /// A new note was detected with sufficient confidence.
    Accepted(usize),
    /// A new note was detected, but below its confidence threshold.
    Skipped(usize),
}

/// Consecutive low confidence detections of the same note.
#[derive(Debug, Clone, Default)]
pub struct SkipTracker {
    last_skipped_note: usize,
    skipped_count: usize,
    was_last_skipped: bool,
}

impl SkipTracker {
    /// The note of the active streak and its length.
    pub fn streak(&self) -> Option<(usize, usize)> {
        if self.was_last_skipped {
            Some((self.last_skipped_note, self.skipped_count))
        } else {
            None
        }
    }

    fn record(&mut self, note: usize, table: &NoteTable) {
        if self.was_last_skipped && self.last_skipped_note != note {
            self.log_streak(table);
            self.skipped_count = 0;
        }
        self.was_last_skipped = true;
        self.last_skipped_note = note;
        self.skipped_count += 1;
    }

    fn finish(&mut self, table: &NoteTable) {
        if self.was_last_skipped {
            self.log_streak(table);
        }
        self.clear();
    }

    fn clear(&mut self) {
        *self = SkipTracker::default();
    }

    fn log_streak(&self, table: &NoteTable) {
        log::debug!(
            "Note {} was skipped {} times (< {})",
            self.last_skipped_note,
            self.skipped_count,
            table.min_confidence(self.last_skipped_note)
        );
    }
}

/// Quantizes pitch estimates to note numbers with hysteresis and a per-note
/// confidence gate.
///
/// The current note is only re-evaluated once the pitch leaves its range, so
/// a held note produces a single event however many frames it lasts.
pub struct PitchClassifier {
    table: Arc<NoteTable>,
    current_note: usize,
    skips: SkipTracker,
}

impl PitchClassifier {
    pub fn new(table: Arc<NoteTable>) -> Self {
        PitchClassifier {
            table,
            current_note: 0,
            skips: SkipTracker::default(),
        }
    }

    pub fn table(&self) -> &NoteTable {
        &self.table
    }

    pub fn current_note(&self) -> usize {
        self.current_note
    }

    pub fn skips(&self) -> &SkipTracker {
        &self.skips
    }

    pub fn reset(&mut self) {
        self.current_note = 0;
        self.skips.clear();
    }

    pub fn classify(&mut self, estimate: PitchEstimate) -> Classification {
        let pitch = estimate.pitch;
        if !pitch.is_finite() || pitch < 0.0 {
            return Classification::Unchanged;
        }
        if self.table.boundary(self.current_note).contains(pitch) {
            return Classification::Unchanged;
        }

        let candidate = self.table.find_note(pitch);
        if estimate.confidence >= self.table.min_confidence(candidate) {
            self.skips.finish(&self.table);
            self.current_note = candidate;
            log::info!("Detected note {}", candidate);
            Classification::Accepted(candidate)
        } else {
            self.skips.record(candidate, &self.table);
            Classification::Skipped(candidate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PitchClassifier {
        // Notes 0..4 at 100, 200, 300, 400 Hz; note 2 needs full confidence.
        let table = NoteTable::new(
            vec![100.0, 200.0, 300.0, 400.0],
            vec![0.5, 0.5, 1.0, 0.5],
        )
        .unwrap();
        PitchClassifier::new(Arc::new(table))
    }

    #[test]
    fn test_silence_stays_on_first_note() {
        let mut classifier = classifier();
        assert_eq!(
            classifier.classify(PitchEstimate::none()),
            Classification::Unchanged
        );
        assert_eq!(classifier.current_note(), 0);
    }

    #[test]
    fn test_hysteresis() {
        let mut classifier = classifier();
        assert_eq!(
            classifier.classify(PitchEstimate::new(205.0, 0.9)),
            Classification::Accepted(1)
        );
        // Anywhere within [150, 250] keeps note 1 without a new event.
        for pitch in [150.0, 180.0, 220.0, 250.0] {
            assert_eq!(
                classifier.classify(PitchEstimate::new(pitch, 0.9)),
                Classification::Unchanged
            );
        }
        assert_eq!(
            classifier.classify(PitchEstimate::new(390.0, 0.6)),
            Classification::Accepted(3)
        );
        assert_eq!(classifier.current_note(), 3);
    }

    #[test]
    fn test_confidence_gate() {
        let mut classifier = classifier();
        classifier.classify(PitchEstimate::new(200.0, 0.9));

        assert_eq!(
            classifier.classify(PitchEstimate::new(300.0, 0.99)),
            Classification::Skipped(2)
        );
        assert_eq!(classifier.current_note(), 1);
        assert_eq!(
            classifier.classify(PitchEstimate::new(310.0, 0.99)),
            Classification::Skipped(2)
        );
        assert_eq!(classifier.skips().streak(), Some((2, 2)));

        assert_eq!(
            classifier.classify(PitchEstimate::new(100.0, 0.4)),
            Classification::Skipped(0)
        );
        assert_eq!(classifier.skips().streak(), Some((0, 1)));

        assert_eq!(
            classifier.classify(PitchEstimate::new(300.0, 1.0)),
            Classification::Accepted(2)
        );
        assert_eq!(classifier.skips().streak(), None);
    }

    #[test]
    fn test_unusable_pitch_is_ignored() {
        let mut classifier = classifier();
        for pitch in [f32::NAN, f32::INFINITY, -10.0] {
            assert_eq!(
                classifier.classify(PitchEstimate::new(pitch, 1.0)),
                Classification::Unchanged
            );
        }
        assert_eq!(classifier.current_note(), 0);
    }

    #[test]
    fn test_reset() {
        let mut classifier = classifier();
        classifier.classify(PitchEstimate::new(400.0, 0.9));
        classifier.classify(PitchEstimate::new(300.0, 0.1));
        classifier.reset();
        assert_eq!(classifier.current_note(), 0);
        assert_eq!(classifier.skips().streak(), None);
    }
}
