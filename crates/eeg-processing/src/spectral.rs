//! Welch power spectral density estimation
//!
//! Each channel is cut into overlapping segments of `window_seconds`, every
//! segment is detrended (mean removed), tapered and transformed with a real
//! FFT, and the one-sided periodograms are averaged. Scaling follows the
//! usual density convention so the result is in units²/Hz:
//!
//! ```text
//! P[k] = c[k] * mean_s |FFT(w * (x_s - mean(x_s)))[k]|² / (fs * Σ w²)
//! ```
//!
//! with `c[k] = 2` for every bin except DC and (even length) Nyquist.
//!
//! Blocks shorter than one segment are rejected. Zero-padding them would
//! feed a smeared spectrum into the baseline.

use crate::preprocessor::CleanedBlock;
use eeg_core::{config_error, EegError, EegResult};
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Taper applied to each Welch segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowFunction {
    Hann,
    Hamming,
    Rectangular,
}

impl WindowFunction {
    /// Periodic (DFT-even) window coefficients
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        if len == 1 {
            return vec![1.0];
        }
        let n = len as f64;
        (0..len)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 / n;
                match self {
                    WindowFunction::Hann => 0.5 - 0.5 * phase.cos(),
                    WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                    WindowFunction::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// Welch estimator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Segment length in seconds (2 s gives 0.5 Hz resolution)
    pub window_seconds: f64,
    /// Fraction of each segment shared with the next, in [0, 1)
    pub overlap: f64,
    /// Segment taper
    pub window: WindowFunction,
}

impl SpectralConfig {
    /// Segment length in samples at `sampling_rate`
    pub fn window_samples(&self, sampling_rate: f64) -> usize {
        (sampling_rate * self.window_seconds).round() as usize
    }

    pub fn validate(&self, sampling_rate: f64) -> EegResult<()> {
        if !self.window_seconds.is_finite() || self.window_seconds <= 0.0 {
            return Err(config_error!(
                "window length must be positive, got {} s",
                self.window_seconds
            ));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(config_error!("overlap must be in [0, 1), got {}", self.overlap));
        }
        if self.window_samples(sampling_rate) < 2 {
            return Err(config_error!(
                "window of {} s at {} Hz is shorter than two samples",
                self.window_seconds, sampling_rate
            ));
        }
        Ok(())
    }
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            overlap: 0.5,
            window: WindowFunction::Hann,
        }
    }
}

/// One-sided PSD per channel on a shared frequency axis
#[derive(Debug, Clone)]
pub struct PowerSpectrum {
    frequencies: Vec<f64>,
    power: Vec<Vec<f64>>, // channel -> bins
    segments: usize,
}

impl PowerSpectrum {
    /// Build a spectrum from precomputed values
    pub fn from_parts(frequencies: Vec<f64>, power: Vec<Vec<f64>>, segments: usize) -> EegResult<Self> {
        if power.iter().any(|channel| channel.len() != frequencies.len()) {
            return Err(EegError::InvalidSignalData {
                reason: "power rows must match the frequency axis".to_string(),
            });
        }
        if frequencies.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(EegError::InvalidSignalData {
                reason: "frequency axis must be strictly increasing".to_string(),
            });
        }
        Ok(Self {
            frequencies,
            power,
            segments,
        })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn channel_power(&self, channel: usize) -> Option<&[f64]> {
        self.power.get(channel).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.power
    }

    pub fn channel_count(&self) -> usize {
        self.power.len()
    }

    /// Number of segments averaged per channel
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Bin spacing in Hz
    pub fn resolution_hz(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Frequency of the strongest bin of a channel
    pub fn peak_frequency(&self, channel: usize) -> Option<f64> {
        let power = self.power.get(channel)?;
        power
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| self.frequencies[i])
    }
}

/// Welch PSD estimator with a cached real FFT plan
pub struct WelchEstimator {
    sampling_rate: f64,
    window_len: usize,
    step: usize,
    window: Vec<f64>,
    window_power: f64,
    fft: Arc<dyn RealToComplex<f64>>,
}

impl WelchEstimator {
    pub fn new(config: &SpectralConfig, sampling_rate: f64) -> EegResult<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(config_error!("sampling rate must be positive, got {}", sampling_rate));
        }
        config.validate(sampling_rate)?;

        let window_len = config.window_samples(sampling_rate);
        let overlap = (window_len as f64 * config.overlap).floor() as usize;
        let window = config.window.coefficients(window_len);
        let window_power = window.iter().map(|w| w * w).sum();

        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_len);

        Ok(Self {
            sampling_rate,
            window_len,
            step: window_len - overlap,
            window,
            window_power,
            fft,
        })
    }

    /// Segment length in samples
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Hop between segment starts in samples
    pub fn step(&self) -> usize {
        self.step
    }

    /// Segments that fit into `samples`, trailing remainder dropped
    pub fn segment_count(&self, samples: usize) -> usize {
        if samples < self.window_len {
            0
        } else {
            (samples - self.window_len) / self.step + 1
        }
    }

    pub fn frequencies(&self) -> Vec<f64> {
        let resolution = self.sampling_rate / self.window_len as f64;
        (0..=self.window_len / 2).map(|k| k as f64 * resolution).collect()
    }

    pub fn estimate(&self, block: &CleanedBlock) -> EegResult<PowerSpectrum> {
        if (block.sampling_rate() - self.sampling_rate).abs() > f64::EPSILON * self.sampling_rate {
            return Err(EegError::InvalidSignalData {
                reason: format!(
                    "sampling rate mismatch: estimator {} Hz, block {} Hz",
                    self.sampling_rate,
                    block.sampling_rate()
                ),
            });
        }

        let samples = block.samples_per_channel();
        let segments = self.segment_count(samples);
        if segments == 0 {
            return Err(EegError::InsufficientSamples {
                required: self.window_len,
                actual: samples,
            });
        }

        let mut input = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();
        let power = block
            .channels()
            .iter()
            .map(|channel| self.channel_psd(channel, segments, &mut input, &mut spectrum))
            .collect::<EegResult<Vec<_>>>()?;

        tracing::debug!(
            channels = power.len(),
            segments,
            window_len = self.window_len,
            "welch estimate complete"
        );

        PowerSpectrum::from_parts(self.frequencies(), power, segments)
    }

    fn channel_psd(
        &self,
        channel: &[f64],
        segments: usize,
        input: &mut [f64],
        spectrum: &mut [Complex<f64>],
    ) -> EegResult<Vec<f64>> {
        let mut accumulated = vec![0.0; spectrum.len()];

        for segment_index in 0..segments {
            let start = segment_index * self.step;
            let segment = &channel[start..start + self.window_len];
            let mean = segment.iter().sum::<f64>() / self.window_len as f64;

            for ((slot, &x), &w) in input.iter_mut().zip(segment).zip(&self.window) {
                *slot = (x - mean) * w;
            }

            self.fft
                .process(input, spectrum)
                .map_err(|e| EegError::InvalidSignalData {
                    reason: format!("fft failed: {}", e),
                })?;

            for (acc, bin) in accumulated.iter_mut().zip(spectrum.iter()) {
                *acc += bin.norm_sqr();
            }
        }

        let scale = 1.0 / (self.sampling_rate * self.window_power * segments as f64);
        let nyquist = (self.window_len % 2 == 0).then_some(self.window_len / 2);
        Ok(accumulated
            .iter()
            .enumerate()
            .map(|(k, &acc)| {
                let one_sided = if k == 0 || Some(k) == nyquist { 1.0 } else { 2.0 };
                acc * scale * one_sided
            })
            .collect())
    }
}

impl std::fmt::Debug for WelchEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WelchEstimator")
            .field("sampling_rate", &self.sampling_rate)
            .field("window_len", &self.window_len)
            .field("step", &self.step)
            .finish()
    }
}
