/// Encode mono f32 samples as signed 16-bit little-endian PCM.
///
/// Out-of-range samples are clamped to [-1, 1] before scaling.
pub fn encode_s16le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bytes_per_sample() {
        let bytes = encode_s16le(&[0.0, 0.5, -0.5]);
        assert_eq!(bytes.len(), 6);
    }

    #[test]
    fn silence_encodes_to_zero() {
        assert_eq!(encode_s16le(&[0.0]), vec![0, 0]);
    }

    #[test]
    fn full_scale_and_overdrive_clamp_to_i16_max() {
        let max = i16::MAX.to_le_bytes().to_vec();
        assert_eq!(encode_s16le(&[1.0]), max);
        assert_eq!(encode_s16le(&[2.5]), max);

        let min = (-i16::MAX).to_le_bytes().to_vec();
        assert_eq!(encode_s16le(&[-1.0]), min);
        assert_eq!(encode_s16le(&[-3.0]), min);
    }
}
