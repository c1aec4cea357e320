//! Pitch estimation on complete analysis frames.
//!
//! The follower only needs a pitch and a confidence for each frame. Any
//! [`PitchEstimator`] can be plugged in; [`MpmEstimator`] is provided as a
//! ready to use implementation, and closures work too:
//!
//! ```
//! use score_follower::estimator::{PitchEstimate, PitchEstimator};
//!
//! let mut fixed = |_frame: &[f32]| PitchEstimate::new(440.0, 0.9);
//! let estimate = fixed.estimate(&[0.0; 16]);
//! assert_eq!(estimate.pitch, 440.0);
//! ```

mod key_maximum;
mod mpm;

pub use mpm::MpmEstimator;

/// The output of a pitch estimator for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz, 0 if none was found.
    pub pitch: f32,
    /// How reliable the estimate is, between 0 and 1.
    pub confidence: f32,
}

impl PitchEstimate {
    pub fn new(pitch: f32, confidence: f32) -> Self {
        PitchEstimate { pitch, confidence }
    }

    /// No discernible pitch.
    pub fn none() -> Self {
        PitchEstimate {
            pitch: 0.0,
            confidence: 0.0,
        }
    }
}

/// Computes the pitch of a single frame. Called synchronously, once per
/// complete frame, always with frames of the same size.
pub trait PitchEstimator: Send {
    fn estimate(&mut self, frame: &[f32]) -> PitchEstimate;
}

impl<F> PitchEstimator for F
where
    F: FnMut(&[f32]) -> PitchEstimate + Send,
{
    fn estimate(&mut self, frame: &[f32]) -> PitchEstimate {
        self(frame)
    }
}
