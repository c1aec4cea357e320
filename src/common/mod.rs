//! Common algorithms and utilities.

mod autocorr;
mod fft;
mod midi;

pub use autocorr::{autocorr_fft, autocorr_fft_size};
pub use fft::{real_fft, MAX_FFT_SIZE};
pub use midi::{midi_note_to_freq, A4_FREQUENCY};
