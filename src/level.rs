use crate::decoder::SampleFormat;
use crate::error::{Error, Result};

/// Full scale values are divided by this so that the level reacts visibly to
/// normal playing volumes.
pub const DAMPING_FACTOR: f32 = 4.0;

/// Average absolute sample level over fixed size batches, relative to the
/// damped full scale value of the sample format.
pub struct LevelMeter {
    batch_size: usize,
    format: Option<SampleFormat>,
    max_amplitude: Option<f32>,
    sum: f32,
    count: usize,
}

impl LevelMeter {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig(
                "Level batch size must be greater than 0".into(),
            ));
        }
        Ok(LevelMeter {
            batch_size,
            format: None,
            max_amplitude: None,
            sum: 0.0,
            count: 0,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The value a sample is divided by, `None` for unsupported formats.
    pub fn max_amplitude(&self) -> Option<f32> {
        self.max_amplitude
    }

    /// Updates the reference amplitude when the format differs from the
    /// previous one.
    pub fn set_format(&mut self, format: SampleFormat) {
        if self.format == Some(format) {
            return;
        }
        self.format = Some(format);
        self.max_amplitude = format.full_scale().map(|full_scale| full_scale / DAMPING_FACTOR);
        if self.max_amplitude.is_none() {
            log::warn!("No level available for {}", format);
        }
    }

    /// Discards the partially accumulated batch.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    /// Accumulates decoded `samples` of the given format, calling `handler`
    /// with the mean level each time a batch completes.
    pub fn process<F>(&mut self, samples: &[f32], format: SampleFormat, mut handler: F)
    where
        F: FnMut(f32),
    {
        self.set_format(format);
        let max_amplitude = match self.max_amplitude {
            Some(max_amplitude) => max_amplitude,
            None => return,
        };

        for sample in samples {
            self.sum += (sample / max_amplitude).abs();
            self.count += 1;
            if self.count == self.batch_size {
                handler(self.sum / self.batch_size as f32);
                self.reset();
            }
        }
    }
}
