//! Online alignment of detected notes against the score.
//!
//! Each accepted note adds one row to a dynamic time warping cost matrix
//! whose columns are the score positions. Only the latest row is kept, and
//! the column with the lowest cumulative cost is the reported position.

use crate::score::Score;

pub struct PositionTracker {
    score: Score,
    row: Vec<u64>,
    next_row: Vec<u64>,
    position: Option<usize>,
}

impl PositionTracker {
    pub fn new(score: Score) -> Self {
        let length = score.len();
        PositionTracker {
            score,
            row: vec![0; length],
            next_row: vec![0; length],
            position: None,
        }
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    /// The last reported position, `None` before the first note.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Cumulative alignment costs per score position.
    pub fn row(&self) -> &[u64] {
        &self.row
    }

    /// Replaces the score and starts over.
    pub fn set_score(&mut self, score: Score) {
        *self = PositionTracker::new(score);
    }

    pub fn reset(&mut self) {
        self.row.iter_mut().for_each(|cost| *cost = 0);
        self.position = None;
    }

    /// Advances the alignment by one detected note. Returns the new position
    /// if it differs from the previous one.
    pub fn update(&mut self, note: usize) -> Option<usize> {
        let notes = self.score.notes();
        let row = &self.row;
        let next_row = &mut self.next_row;

        next_row[0] = row[0].saturating_add(note.abs_diff(notes[0]) as u64);
        let mut best_index = 0;
        let mut best_value = next_row[0];
        for i in 1..notes.len() {
            let predecessor = next_row[i - 1].min(row[i]).min(row[i - 1]);
            next_row[i] = predecessor.saturating_add(note.abs_diff(notes[i]) as u64);
            if next_row[i] < best_value {
                best_value = next_row[i];
                best_index = i;
            }
        }
        std::mem::swap(&mut self.row, &mut self.next_row);

        let changed = self.position != Some(best_index);
        self.position = Some(best_index);
        if changed {
            Some(best_index)
        } else {
            None
        }
    }
}
