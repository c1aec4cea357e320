use super::fft::real_fft;

/// Smallest supported FFT length that holds `buffer_size + lag_count - 1`
/// samples, so that the first `lag_count` lags are free of wrap around.
pub fn autocorr_fft_size(buffer_size: usize, lag_count: usize) -> usize {
    let min_length = buffer_size + lag_count.max(1) - 1;
    let mut result: usize = 8; // Start at microfft's minimum size
    while result < min_length {
        result <<= 1;
    }
    result
}

/// FFT based [autocorrelation](https://en.wikipedia.org/wiki/Autocorrelation)
/// of `buffer`. The first `lag_count` values of `result` hold the
/// autocorrelation when this returns `Some`.
///
/// `result` and `scratch_buffer` must both have the length given by
/// [`autocorr_fft_size`]. Returns `None` if that length is not a supported FFT size.
pub fn autocorr_fft(
    buffer: &[f32],
    result: &mut [f32],
    scratch_buffer: &mut [f32],
    lag_count: usize,
) -> Option<()> {
    let fft_size = autocorr_fft_size(buffer.len(), lag_count);
    if result.len() != fft_size || scratch_buffer.len() != fft_size {
        return None;
    }

    // Zero padded FFT input
    result[..buffer.len()].copy_from_slice(buffer);
    for element in result.iter_mut().skip(buffer.len()) {
        *element = 0.0
    }

    let fft = real_fft(result)?;

    // Power spectral density, mirrored so that the following forward FFT
    // acts as an inverse FFT.
    let half = fft.len();
    scratch_buffer[0] = fft[0].re * fft[0].re;
    for (index, fft_value) in fft.iter().enumerate().skip(1) {
        let norm_sq = fft_value.norm_sqr();
        scratch_buffer[index] = norm_sq;
        scratch_buffer[fft_size - index] = norm_sq;
    }
    scratch_buffer[half] = fft[0].im * fft[0].im;

    let ifft = real_fft(scratch_buffer)?;

    let scale = 1.0 / (fft_size as f32);
    for (value, bin) in result.iter_mut().zip(ifft.iter()).take(lag_count) {
        *value = scale * bin.re;
    }
    Some(())
}

/// Direct time domain autocorrelation, the reference for the FFT version.
#[cfg(test)]
pub fn autocorr_conv(window: &[f32], result: &mut [f32]) {
    let window_size = window.len();
    for (tau, value) in result.iter_mut().enumerate() {
        let mut sum: f32 = 0.0;
        for j in 0..window_size - tau {
            sum += window[j] * window[j + tau];
        }
        *value = sum;
    }
}
