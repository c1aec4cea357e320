use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Collects an unbounded stream of samples into fixed size, overlapping
/// analysis frames.
///
/// Incoming samples are queued in a pending FIFO. [`FrameAccumulator::process`]
/// moves them into the frame, hands every completed frame to a handler and
/// slides the frame forward by one hop. Whatever is left after the last
/// complete frame stays in the frame buffer for the next call.
pub struct FrameAccumulator {
    frame: Vec<f32>,
    pending: VecDeque<f32>,
    frame_size: usize,
    hop_size: usize,
    processed_frame_count: usize,
}

impl FrameAccumulator {
    /// `frame_size` must be even and `hop_size` must satisfy `0 < hop_size < frame_size`.
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self> {
        if frame_size == 0 || frame_size % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "Frame size must be even and greater than 0, got {}",
                frame_size
            )));
        }
        if hop_size == 0 || hop_size >= frame_size {
            return Err(Error::InvalidConfig(format!(
                "Hop size must be > 0 and < frame size {}, got {}",
                frame_size, hop_size
            )));
        }
        Ok(FrameAccumulator {
            frame: Vec::with_capacity(frame_size),
            pending: VecDeque::new(),
            frame_size,
            hop_size,
            processed_frame_count: 0,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of samples currently in the frame.
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frame.len() >= self.frame_size
    }

    pub fn frame(&self) -> &[f32] {
        &self.frame
    }

    /// Number of queued samples not yet moved into the frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The queue that incoming samples are appended to.
    pub fn pending_mut(&mut self) -> &mut VecDeque<f32> {
        &mut self.pending
    }

    pub fn processed_frame_count(&self) -> usize {
        self.processed_frame_count
    }

    /// Appends a sample directly to the frame.
    pub fn push(&mut self, sample: f32) {
        self.frame.push(sample);
    }

    /// Drops the first `hop_size` samples of the frame, or all of them if
    /// fewer are present.
    pub fn erase_hop(&mut self) {
        let count = self.hop_size.min(self.frame.len());
        self.frame.drain(..count);
    }

    /// Discards the partial frame and any queued samples.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.pending.clear();
    }

    /// Queues `samples` and processes every frame they complete.
    pub fn process<F>(&mut self, samples: &[f32], handler: F)
    where
        F: FnMut(&[f32]),
    {
        self.pending.extend(samples.iter().copied());
        self.process_pending(handler)
    }

    /// Fills the frame from the pending queue, invoking `handler` once per
    /// complete frame and sliding by one hop after each. Leaves the pending
    /// queue empty.
    pub fn process_pending<F>(&mut self, mut handler: F)
    where
        F: FnMut(&[f32]),
    {
        while self.frame.len() + self.pending.len() >= self.frame_size {
            let missing = self.frame_size - self.frame.len().min(self.frame_size);
            self.frame.extend(self.pending.drain(..missing));
            handler(&self.frame[..self.frame_size]);
            self.processed_frame_count += 1;
            self.erase_hop();
        }
        self.frame.extend(self.pending.drain(..));
    }
}

#[cfg(test)]
mod tests {
    use super::FrameAccumulator;

    #[test]
    fn test_frame_then_hop() {
        let mut accumulator = FrameAccumulator::new(8, 3).unwrap();
        for i in 0..8 {
            accumulator.push(i as f32);
        }
        assert!(accumulator.is_full());
        accumulator.erase_hop();
        assert_eq!(accumulator.len(), 5);
        assert_eq!(accumulator.frame(), &[3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_erase_hop_never_underflows() {
        let mut accumulator = FrameAccumulator::new(8, 6).unwrap();
        accumulator.push(1.0);
        accumulator.erase_hop();
        assert_eq!(accumulator.len(), 0);
        accumulator.erase_hop();
        assert!(accumulator.is_empty());
    }

    #[test]
    fn test_overlapping_frames_across_buffers() {
        const FRAME_SIZE: usize = 8;
        const HOP_SIZE: usize = 2;
        let mut accumulator = FrameAccumulator::new(FRAME_SIZE, HOP_SIZE).unwrap();
        let signal: Vec<f32> = (0..40).map(|i| i as f32).collect();

        let mut frames: Vec<Vec<f32>> = Vec::new();
        // Buffer sizes unrelated to the frame and hop sizes.
        for chunk in signal.chunks(5) {
            accumulator.process(chunk, |frame| frames.push(frame.to_vec()));
            assert_eq!(accumulator.pending_len(), 0);
            assert!(accumulator.len() < FRAME_SIZE);
        }

        // Frames start at 0, 2, 4, ... and the last complete one ends at sample 39.
        assert_eq!(frames.len(), (40 - FRAME_SIZE) / HOP_SIZE + 1);
        for (index, frame) in frames.iter().enumerate() {
            let start = (index * HOP_SIZE) as f32;
            let expected: Vec<f32> = (0..FRAME_SIZE).map(|i| start + i as f32).collect();
            assert_eq!(frame, &expected);
        }
        assert_eq!(accumulator.processed_frame_count(), frames.len());
        assert_eq!(accumulator.len(), FRAME_SIZE - HOP_SIZE);
    }

    #[test]
    fn test_large_buffer_yields_many_frames() {
        let mut accumulator = FrameAccumulator::new(4, 2).unwrap();
        let mut count = 0;
        accumulator.process(&[0.0; 11], |frame| {
            assert_eq!(frame.len(), 4);
            count += 1;
        });
        assert_eq!(count, 4);
        assert_eq!(accumulator.len(), 3);
    }

    #[test]
    fn test_clear_discards_partial_frame() {
        let mut accumulator = FrameAccumulator::new(4, 2).unwrap();
        accumulator.process(&[1.0, 2.0, 3.0], |_| panic!("frame is not complete"));
        accumulator.clear();
        assert!(accumulator.is_empty());
        let mut count = 0;
        accumulator.process(&[1.0, 2.0, 3.0], |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(FrameAccumulator::new(7, 2).is_err());
        assert!(FrameAccumulator::new(8, 8).is_err());
        assert!(FrameAccumulator::new(8, 0).is_err());
        assert!(FrameAccumulator::new(0, 0).is_err());
    }
}
