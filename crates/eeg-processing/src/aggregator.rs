//! Cross-channel reduction of band powers

use crate::band_power::BandPowerMatrix;
use eeg_core::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// One scalar per band, averaged over channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBandPowers {
    bands: Vec<String>,
    values: Vec<f64>,
}

impl AggregatedBandPowers {
    pub fn new(bands: Vec<String>, values: Vec<f64>) -> EegResult<Self> {
        if bands.len() != values.len() {
            return Err(EegError::InvalidSignalData {
                reason: format!("{} band names for {} values", bands.len(), values.len()),
            });
        }
        Ok(Self { bands, values })
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, band: &str) -> Option<f64> {
        self.bands
            .iter()
            .position(|b| b == band)
            .map(|i| self.values[i])
    }

    /// Like [`get`](Self::get) but fails with `UnknownBand`
    pub fn require(&self, band: &str) -> EegResult<f64> {
        self.get(band).ok_or_else(|| EegError::UnknownBand {
            name: band.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.bands.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

/// Mean of every band column over the channel axis
pub fn aggregate_channels(matrix: &BandPowerMatrix) -> EegResult<AggregatedBandPowers> {
    let channels = matrix.channel_count();
    if channels == 0 {
        return Err(EegError::InvalidSignalData {
            reason: "cannot aggregate a band power matrix without channels".to_string(),
        });
    }

    let values = (0..matrix.band_count())
        .map(|band| matrix.column(band).fold(0.0, |sum, v| sum + v) / channels as f64)
        .collect();

    Ok(AggregatedBandPowers {
        bands: matrix.bands().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["alpha".to_string(), "beta".to_string()]
    }

    #[test]
    fn test_mean_over_channels() {
        let matrix = BandPowerMatrix::new(names(), vec![vec![1.0, 10.0], vec![3.0, 30.0]]);
        let aggregated = aggregate_channels(&matrix).unwrap();

        assert_eq!(aggregated.get("alpha"), Some(2.0));
        assert_eq!(aggregated.get("beta"), Some(20.0));
        assert_eq!(aggregated.get("gamma"), None);
    }

    #[test]
    fn test_single_channel_is_identity() {
        let matrix = BandPowerMatrix::new(names(), vec![vec![0.25, 7.5]]);
        let aggregated = aggregate_channels(&matrix).unwrap();

        assert_eq!(aggregated.values(), &[0.25, 7.5]);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let matrix = BandPowerMatrix::new(names(), Vec::new());
        assert!(matches!(
            aggregate_channels(&matrix),
            Err(EegError::InvalidSignalData { .. })
        ));
    }

    #[test]
    fn test_require_unknown_band() {
        let aggregated = AggregatedBandPowers::new(names(), vec![1.0, 2.0]).unwrap();
        assert_eq!(
            aggregated.require("theta").unwrap_err(),
            EegError::UnknownBand {
                name: "theta".to_string()
            }
        );
        assert_eq!(aggregated.iter().count(), 2);
        assert!(AggregatedBandPowers::new(names(), vec![1.0]).is_err());
    }
}
