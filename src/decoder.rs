//! Conversion of raw audio buffers into float samples.
//!
//! Integer samples keep their integer scale (a 16 bit sample of 1000 decodes to
//! `1000.0`); float samples are reinterpreted bit for bit. Samples that cannot
//! be decoded are replaced by silence so that a bad buffer never stalls the
//! pipeline.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    SignedInt,
    UnsignedInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Layout of the samples in a raw mono buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    /// Bits per sample.
    pub sample_size: u16,
    pub sample_type: SampleType,
    pub byte_order: ByteOrder,
}

impl SampleFormat {
    pub const fn new(sample_size: u16, sample_type: SampleType, byte_order: ByteOrder) -> Self {
        SampleFormat {
            sample_size,
            sample_type,
            byte_order,
        }
    }

    /// Number of bytes each sample occupies in a raw buffer.
    pub fn bytes_per_sample(&self) -> usize {
        (self.sample_size as usize) / 8
    }

    /// Whether [`decode_sample`] understands this format.
    pub fn is_supported(&self) -> bool {
        matches!(
            (self.sample_size, self.sample_type),
            (8, SampleType::SignedInt)
                | (8, SampleType::UnsignedInt)
                | (16, SampleType::SignedInt)
                | (16, SampleType::UnsignedInt)
                | (32, SampleType::SignedInt)
                | (32, SampleType::UnsignedInt)
                | (32, SampleType::Float)
        )
    }

    /// The full scale value of a sample, or `None` for unsupported formats.
    pub fn full_scale(&self) -> Option<f32> {
        match (self.sample_size, self.sample_type) {
            (8, SampleType::UnsignedInt) => Some(255.0),
            (8, SampleType::SignedInt) => Some(127.0),
            (16, SampleType::UnsignedInt) => Some(65535.0),
            (16, SampleType::SignedInt) => Some(32767.0),
            (32, SampleType::UnsignedInt) => Some(4294967295.0),
            (32, SampleType::SignedInt) => Some(2147483647.0),
            (32, SampleType::Float) => Some(1.0),
            _ => None,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sample_type = match self.sample_type {
            SampleType::SignedInt => "signed int",
            SampleType::UnsignedInt => "unsigned int",
            SampleType::Float => "float",
        };
        let byte_order = match self.byte_order {
            ByteOrder::LittleEndian => "LE",
            ByteOrder::BigEndian => "BE",
        };
        write!(f, "{} bit {} {}", self.sample_size, sample_type, byte_order)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(SampleFormat),

    #[error("Truncated sample: needed {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },
}

/// Decodes the sample at the start of `bytes`.
///
/// 8 and 16 bit samples are read as signed integers whatever their declared
/// signedness. 32 bit integers honor the declared signedness.
pub fn decode_sample(bytes: &[u8], format: SampleFormat) -> Result<f32, DecodeError> {
    if !format.is_supported() {
        return Err(DecodeError::UnsupportedFormat(format));
    }
    let needed = format.bytes_per_sample();
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: bytes.len(),
        });
    }

    let little_endian = format.byte_order == ByteOrder::LittleEndian;
    let value = match format.sample_size {
        8 => bytes[0] as i8 as f32,
        16 => {
            let raw = [bytes[0], bytes[1]];
            if little_endian {
                i16::from_le_bytes(raw) as f32
            } else {
                i16::from_be_bytes(raw) as f32
            }
        }
        _ => {
            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
            match (format.sample_type, little_endian) {
                (SampleType::SignedInt, true) => i32::from_le_bytes(raw) as f32,
                (SampleType::SignedInt, false) => i32::from_be_bytes(raw) as f32,
                (SampleType::UnsignedInt, true) => u32::from_le_bytes(raw) as f32,
                (SampleType::UnsignedInt, false) => u32::from_be_bytes(raw) as f32,
                (SampleType::Float, true) => f32::from_le_bytes(raw),
                (SampleType::Float, false) => f32::from_be_bytes(raw),
            }
        }
    };
    Ok(value)
}

/// Decodes `sample_count` samples from `bytes` and appends them to `output`.
///
/// Samples that fail to decode are appended as `0.0`. Returns the number of
/// such samples; a warning is logged once per call when it is non-zero.
pub fn decode_into<E: Extend<f32>>(
    bytes: &[u8],
    sample_count: usize,
    format: SampleFormat,
    output: &mut E,
) -> usize {
    let stride = format.bytes_per_sample().max(1);
    let mut failed = 0;
    let mut first_error = None;
    output.extend((0..sample_count).map(|index| {
        let start = (index * stride).min(bytes.len());
        match decode_sample(&bytes[start..], format) {
            Ok(value) => value,
            Err(error) => {
                failed += 1;
                if first_error.is_none() {
                    first_error = Some(error);
                }
                0.0
            }
        }
    }));

    if let Some(error) = first_error {
        log::warn!(
            "{} of {} samples replaced by silence: {}",
            failed,
            sample_count,
            error
        );
    }
    failed
}

/// Decodes a whole buffer into a new vector.
pub fn decode(bytes: &[u8], sample_count: usize, format: SampleFormat) -> Vec<f32> {
    let mut samples = Vec::with_capacity(sample_count);
    decode_into(bytes, sample_count, format, &mut samples);
    samples
}
