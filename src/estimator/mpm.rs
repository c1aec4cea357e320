//! Pitch estimation with the MPM (McLeod Pitch Method), described in the paper
//! [A smarter way to find pitch](http://www.cs.otago.ac.nz/tartini/papers/A_Smarter_Way_to_Find_Pitch.pdf)
//! by Philip McLeod and Geoff Wyvill.
//!
//! * Autocorrelation is computed using real-only FFT.
//! * The NSDF uses the incremental scheme described in the paper.
//! * Clarity, the NSDF value at the selected maximum, is reported as confidence.

use super::key_maximum::KeyMaximum;
use super::{PitchEstimate, PitchEstimator};
use crate::common::{autocorr_fft, autocorr_fft_size, MAX_FFT_SIZE};
use crate::error::{Error, Result};

/// The maximum number of key maxima to gather during the peak finding phase.
const MAX_KEY_MAXIMA_COUNT: usize = 16;
/// Key maxima within this fraction of the largest one are pitch candidates.
const KEY_MAXIMUM_THRESHOLD: f32 = 0.9;

pub struct MpmEstimator {
    sample_rate: f32,
    frame_size: usize,
    nsdf: Vec<f32>,
    r_prime: Vec<f32>,
    scratch: Vec<f32>,
    key_maxima: Vec<KeyMaximum>,
}

impl MpmEstimator {
    /// Creates an estimator for frames of `frame_size` samples using
    /// `frame_size / 2` lags.
    pub fn new(sample_rate: f32, frame_size: usize) -> Result<Self> {
        MpmEstimator::from_options(sample_rate, frame_size, frame_size / 2)
    }

    pub fn from_options(sample_rate: f32, frame_size: usize, lag_count: usize) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::EstimatorUnavailable(format!(
                "unsupported sample rate {}",
                sample_rate
            )));
        }
        if lag_count < 2 || lag_count > frame_size {
            return Err(Error::EstimatorUnavailable(format!(
                "lag count {} must be between 2 and the frame size {}",
                lag_count, frame_size
            )));
        }
        let fft_size = autocorr_fft_size(frame_size, lag_count);
        if fft_size > MAX_FFT_SIZE {
            return Err(Error::EstimatorUnavailable(format!(
                "frame size {} needs a {} point FFT, at most {} is supported",
                frame_size, fft_size, MAX_FFT_SIZE
            )));
        }

        Ok(MpmEstimator {
            sample_rate,
            frame_size,
            nsdf: vec![0.0; lag_count],
            r_prime: vec![0.0; fft_size],
            scratch: vec![0.0; fft_size],
            key_maxima: Vec::with_capacity(MAX_KEY_MAXIMA_COUNT),
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// The normalized square difference function of the last frame.
    pub fn nsdf(&self) -> &[f32] {
        &self.nsdf
    }

    fn compute_nsdf(&mut self, frame: &[f32]) -> Option<()> {
        let lag_count = self.nsdf.len();
        autocorr_fft(frame, &mut self.r_prime, &mut self.scratch, lag_count)?;

        // m' from eq (6), by incremental subtraction (section 6)
        let nsdf = &mut self.nsdf[..];
        nsdf[0] = 2.0 * self.r_prime[0];
        for i in 1..lag_count {
            let v1 = frame[frame.len() - i];
            let v2 = frame[i - 1];
            nsdf[i] = nsdf[i - 1] - v1 * v1 - v2 * v2;
        }

        // NSDF = 2 * r' / m'
        for (value, r) in nsdf.iter_mut().zip(self.r_prime.iter()) {
            let denominator = *value;
            *value = if denominator.abs() <= f32::EPSILON {
                0.0
            } else {
                2.0 * r / denominator
            };
        }
        Some(())
    }

    /// Gathers the highest NSDF value between each positive and the
    /// following negative zero crossing.
    fn gather_key_maxima(&mut self) {
        let nsdf = &self.nsdf[..];
        self.key_maxima.clear();
        let mut is_detecting = false;
        let mut maximum_value: f32 = 0.0;
        let mut maximum_index: usize = 0;
        let mut prev = nsdf[0];
        for (i, &curr) in nsdf.iter().enumerate().skip(1) {
            if self.key_maxima.len() == MAX_KEY_MAXIMA_COUNT {
                break;
            }
            if prev <= 0.0 && curr > 0.0 {
                is_detecting = true;
                maximum_value = curr;
                maximum_index = i;
            } else if prev >= 0.0 && curr < 0.0 {
                if is_detecting {
                    self.key_maxima.push(KeyMaximum::at(nsdf, maximum_index));
                }
                is_detecting = false;
            }

            if is_detecting {
                if curr > maximum_value {
                    maximum_value = curr;
                    maximum_index = i;
                }
                if i == nsdf.len() - 1 {
                    // Reached the last lag while looking for a maximum.
                    self.key_maxima.push(KeyMaximum::at(nsdf, maximum_index));
                }
            }
            prev = curr;
        }
    }

    /// Picks the first key maximum close enough to the largest one.
    fn select_key_maximum(&self) -> Option<KeyMaximum> {
        let largest = self
            .key_maxima
            .iter()
            .map(|key_max| key_max.value_at_lag_index)
            .fold(f32::MIN, f32::max);
        let threshold = KEY_MAXIMUM_THRESHOLD * largest;
        self.key_maxima
            .iter()
            .find(|key_max| key_max.value >= threshold)
            .copied()
    }
}

impl PitchEstimator for MpmEstimator {
    fn estimate(&mut self, frame: &[f32]) -> PitchEstimate {
        if frame.len() != self.frame_size {
            log::warn!(
                "Expected a frame of {} samples, got {}",
                self.frame_size,
                frame.len()
            );
            return PitchEstimate::none();
        }
        if self.compute_nsdf(frame).is_none() {
            return PitchEstimate::none();
        }
        self.gather_key_maxima();

        match self.select_key_maximum() {
            Some(selected) if selected.lag > 0.0 => PitchEstimate {
                pitch: self.sample_rate / selected.lag,
                confidence: selected.value.clamp(0.0, 1.0),
            },
            _ => PitchEstimate::none(),
        }
    }
}
