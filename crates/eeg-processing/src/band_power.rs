//! Band power integration over a power spectral density

use crate::spectral::PowerSpectrum;
use eeg_core::{BandDefinition, EegResult};
use serde::{Deserialize, Serialize};

/// Channels x bands matrix of integrated power
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPowerMatrix {
    bands: Vec<String>,
    values: Vec<Vec<f64>>, // channel -> band
}

impl BandPowerMatrix {
    pub fn new(bands: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        Self { bands, values }
    }

    /// Band names in column order
    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn channel_count(&self) -> usize {
        self.values.len()
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn value(&self, channel: usize, band: usize) -> Option<f64> {
        self.values.get(channel)?.get(band).copied()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// All channel values of one band column
    pub fn column(&self, band: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(move |row| row.get(band).copied())
    }

    pub fn band_index(&self, name: &str) -> Option<usize> {
        self.bands.iter().position(|b| b == name)
    }
}

/// Integrates each channel's PSD over the configured bands
#[derive(Debug, Clone)]
pub struct BandPowerIntegrator {
    bands: Vec<BandDefinition>,
}

impl BandPowerIntegrator {
    pub fn new(bands: Vec<BandDefinition>) -> EegResult<Self> {
        BandDefinition::validate_set(&bands)?;
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[BandDefinition] {
        &self.bands
    }

    pub fn integrate(&self, psd: &PowerSpectrum) -> BandPowerMatrix {
        let frequencies = psd.frequencies();
        let values = psd
            .channels()
            .iter()
            .map(|power| {
                self.bands
                    .iter()
                    .map(|band| band_power(frequencies, power, band))
                    .collect()
            })
            .collect();

        BandPowerMatrix {
            bands: self.bands.iter().map(|b| b.name.clone()).collect(),
            values,
        }
    }
}

/// Trapezoidal integral of `power` over the bins inside `band`.
///
/// A band that selects fewer than two bins has no width on this grid and
/// integrates to zero. NaN power yields NaN rather than zero.
pub fn band_power(frequencies: &[f64], power: &[f64], band: &BandDefinition) -> f64 {
    let Some(first) = frequencies.iter().position(|&f| band.contains(f)) else {
        return 0.0;
    };
    let last = frequencies
        .iter()
        .rposition(|&f| band.contains(f))
        .unwrap_or(first);

    let area = trapezoid(&frequencies[first..=last], &power[first..=last]);
    if area.is_nan() {
        area
    } else {
        area.max(0.0)
    }
}

/// Trapezoidal rule over paired samples
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) * 0.5)
        .sum()
}
