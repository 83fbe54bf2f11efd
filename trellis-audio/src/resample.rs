use anyhow::Context;
use rubato::Resampler;

use crate::session::CapturedAudio;

/// Upload rate expected by the transcription endpoint.
pub const STT_SAMPLE_RATE_HZ: u32 = 16_000;

/// Resample captured mono audio to a target sample rate.
///
/// Samples are PCM in [-1, 1]. Matching rates pass through unchanged.
pub fn resample(audio: &CapturedAudio, target_sample_rate_hz: u32) -> anyhow::Result<CapturedAudio> {
    if audio.sample_rate_hz == target_sample_rate_hz {
        return Ok(audio.clone());
    }

    let input_rate: usize = audio
        .sample_rate_hz
        .try_into()
        .context("invalid input sample rate")?;
    let target_rate: usize = target_sample_rate_hz
        .try_into()
        .context("invalid target sample rate")?;

    let params = rubato::SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: rubato::SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: rubato::WindowFunction::BlackmanHarris2,
    };

    let mut resampler = rubato::SincFixedIn::<f32>::new(
        target_rate as f64 / input_rate as f64,
        2.0,
        params,
        audio.samples.len(),
        1,
    )
    .context("create resampler")?;

    let input = vec![audio.samples.clone()];
    let out = resampler.process(&input, None).context("resample")?;
    Ok(CapturedAudio {
        sample_rate_hz: target_sample_rate_hz,
        samples: out.into_iter().next().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_returns_same() {
        let audio = CapturedAudio {
            sample_rate_hz: 16_000,
            samples: vec![0.0, 0.5, -0.5, 0.25],
        };
        let out = resample(&audio, 16_000).unwrap();
        assert_eq!(out, audio);
    }

    #[test]
    fn upsampling_roughly_doubles_the_sample_count() {
        let audio = CapturedAudio {
            sample_rate_hz: 8_000,
            samples: (0..4_000)
                .map(|i| (i as f32 * 0.05).sin() * 0.5)
                .collect(),
        };
        let out = resample(&audio, STT_SAMPLE_RATE_HZ).unwrap();
        assert_eq!(out.sample_rate_hz, STT_SAMPLE_RATE_HZ);
        assert!(
            (7_000..=9_000).contains(&out.samples.len()),
            "got {} samples",
            out.samples.len()
        );
    }
}
