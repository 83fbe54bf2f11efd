use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Number of bars in the live recording visualization.
pub const LIVE_BARS: usize = 30;

const FFT_SIZE: usize = 1024;
const SMOOTHING: f32 = 0.3;
const MIN_HEIGHT: f32 = 10.0;

/// Live waveform for the recording overlay.
///
/// Each `update` turns the newest chunk of samples into an overall volume
/// estimate via FFT magnitude, then eases every bar toward a jittered target
/// so the display animates instead of snapping.
pub struct LiveWaveform {
    heights: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    rng: u64,
}

impl LiveWaveform {
    pub fn new() -> Self {
        Self::with_seed(0x9e37_79b9_7f4a_7c15)
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            heights: vec![MIN_HEIGHT; LIVE_BARS],
            fft: planner.plan_fft_forward(FFT_SIZE),
            rng: seed.max(1),
        }
    }

    /// Feed the latest chunk and get the updated bar heights (0..=100).
    pub fn update(&mut self, samples: &[f32]) -> &[f32] {
        let volume = self.volume(samples);
        for i in 0..LIVE_BARS {
            let jitter = 0.7 + 0.3 * self.next_unit();
            let target = MIN_HEIGHT + volume * 90.0 * jitter;
            self.heights[i] += (target - self.heights[i]) * SMOOTHING;
        }
        &self.heights
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn reset(&mut self) {
        self.heights.fill(MIN_HEIGHT);
    }

    fn volume(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0))
            .take(FFT_SIZE)
            .map(|s| Complex::new(s, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        // Mean magnitude over the first half of the spectrum, normalized.
        let half = FFT_SIZE / 2;
        let sum: f32 = buffer[..half].iter().map(|c| c.norm()).sum();
        (sum / half as f32).clamp(0.0, 1.0)
    }

    fn next_unit(&mut self) -> f32 {
        // xorshift64
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        (x >> 40) as f32 / (1u64 << 24) as f32
    }
}

impl Default for LiveWaveform {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse a finished recording into per-column (min, max) pairs for the
/// preview strip. Columns past the end of short recordings are flat.
pub fn static_waveform(samples: &[f32], columns: usize) -> Vec<(f32, f32)> {
    if columns == 0 {
        return Vec::new();
    }
    if samples.is_empty() {
        return vec![(0.0, 0.0); columns];
    }

    let step = samples.len().div_ceil(columns);
    let mut out = Vec::with_capacity(columns);
    for chunk in samples.chunks(step) {
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for &s in chunk {
            lo = lo.min(s);
            hi = hi.max(s);
        }
        out.push((lo, hi));
    }
    out.resize(columns, (0.0, 0.0));
    out
}
