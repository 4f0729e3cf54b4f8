//! Linear PCM helpers for the delivery wire format.
//!
//! Audio crosses the delivery boundary as mono signed 16-bit little-endian
//! samples. Synthesizers produce `f32` in `[-1.0, 1.0]`.

/// Convert `f32` samples to signed 16-bit little-endian bytes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn f32_to_pcm16le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let value = (clamped * 32_767.0) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Convert signed 16-bit little-endian bytes to `f32` samples.
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn pcm16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect()
}

/// Duration in milliseconds of `samples` at `sample_rate`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_ms(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / f64::from(sample_rate) * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_samples() {
        let bytes = f32_to_pcm16le(&[2.0, -2.0, 0.0]);
        assert_eq!(bytes.len(), 6);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 32_767);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), -32_767);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), 0);
    }

    #[test]
    fn decode_is_close_to_source() {
        let source = [0.5_f32, -0.25, 0.999];
        let decoded = pcm16le_to_f32(&f32_to_pcm16le(&source));
        for (a, b) in source.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        assert_eq!(pcm16le_to_f32(&[0, 0, 7]).len(), 1);
    }

    #[test]
    fn duration_from_sample_count() {
        assert!((duration_ms(24_000, 24_000) - 1000.0).abs() < f64::EPSILON);
        assert!((duration_ms(12_000, 24_000) - 500.0).abs() < f64::EPSILON);
        assert!(duration_ms(100, 0).abs() < f64::EPSILON);
    }
}
