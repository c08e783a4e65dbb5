use crate::utils::{
    ANALYSER_FFT_SIZE, ANALYSER_MAX_DECIBELS, ANALYSER_MIN_DECIBELS, ANALYSER_SMOOTHING,
};
use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

/// Mean of byte spectrum magnitudes; 0 for an empty spectrum.
pub fn mean_energy(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&b| b as f64).sum::<f64>() / bins.len() as f64
}

/// Byte spectrum of the most recent `fft_size` PCM samples, computed the way
/// a browser `AnalyserNode` does: Blackman window, magnitude scaled by
/// 1/N, exponential smoothing over calls, decibel range mapped onto 0..=255.
pub struct FrequencyAnalyser {
    fft: Arc<dyn RealToComplex<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    smoothed: Vec<f32>,
    smoothing: f32,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FrequencyAnalyser {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();

        Self {
            fft,
            fft_size,
            window: blackman_window(fft_size),
            samples: VecDeque::from(vec![0.0; fft_size]),
            smoothed: vec![0.0; fft_size / 2],
            smoothing: smoothing.clamp(0.0, 1.0),
            input,
            spectrum,
            scratch,
        }
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Appends mono PCM in [-1, 1], keeping only the newest window.
    pub fn push_samples(&mut self, pcm: &[f32]) {
        let skip = pcm.len().saturating_sub(self.fft_size);
        for &s in &pcm[skip..] {
            if self.samples.len() == self.fft_size {
                self.samples.pop_front();
            }
            self.samples.push_back(s);
        }
    }

    /// Forgets buffered samples and smoothing history.
    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.smoothed.fill(0.0);
    }

    /// Fills `out` with up to `frequency_bin_count` byte magnitudes.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyse();

        let range = ANALYSER_MAX_DECIBELS - ANALYSER_MIN_DECIBELS;
        for (byte, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            let db = 20.0 * magnitude.log10();
            let scaled = 255.0 / range * (db - ANALYSER_MIN_DECIBELS);
            *byte = if scaled.is_nan() { 0 } else { scaled.clamp(0.0, 255.0) as u8 };
        }
    }

    fn analyse(&mut self) {
        for ((dst, &sample), &w) in self.input.iter_mut().zip(&self.samples).zip(&self.window) {
            *dst = sample * w;
        }

        if self
            .fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .is_err()
        {
            self.smoothed.fill(0.0);
            return;
        }

        let scale = 1.0 / self.fft_size as f32;
        let tau = self.smoothing;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.spectrum) {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
        }
    }
}

impl Default for FrequencyAnalyser {
    fn default() -> Self {
        Self::new(ANALYSER_FFT_SIZE, ANALYSER_SMOOTHING)
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
