/// The largest real FFT size available.
pub const MAX_FFT_SIZE: usize = 4096;

/// Performs an in-place real FFT with microfft. The real valued coefficient at the
/// Nyquist frequency is packed into the imaginary part of the DC bin.
///
/// Returns `None` if `buffer.len()` is not a supported power of two.
pub fn real_fft(buffer: &mut [f32]) -> Option<&mut [microfft::Complex32]> {
    match buffer.len() {
        8 => <&mut [f32; 8]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_8(b)[..]),
        16 => <&mut [f32; 16]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_16(b)[..]),
        32 => <&mut [f32; 32]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_32(b)[..]),
        64 => <&mut [f32; 64]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_64(b)[..]),
        128 => <&mut [f32; 128]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_128(b)[..]),
        256 => <&mut [f32; 256]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_256(b)[..]),
        512 => <&mut [f32; 512]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_512(b)[..]),
        1024 => <&mut [f32; 1024]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_1024(b)[..]),
        2048 => <&mut [f32; 2048]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_2048(b)[..]),
        4096 => <&mut [f32; 4096]>::try_from(buffer)
            .ok()
            .map(|b| &mut microfft::real::rfft_4096(b)[..]),
        _ => None,
    }
}
