//! Baseline-relative stress classification

use crate::aggregator::AggregatedBandPowers;
use crate::baseline::Baseline;
use eeg_core::{config_error, BandDefinition, EegError, EegResult, StateLabel};
use serde::{Deserialize, Serialize};

/// Which bands are compared and where the decision thresholds sit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Band expected to drop under stress
    pub low_band: String,
    /// Band expected to rise under stress
    pub high_band: String,
    /// Stressed needs baseline/current of the low band above this
    pub threshold_low: f64,
    /// Stressed needs baseline/current of the high band below this
    pub threshold_high: f64,
}

impl ClassifierConfig {
    pub fn validate(&self, bands: &[BandDefinition]) -> EegResult<()> {
        if self.low_band == self.high_band {
            return Err(config_error!("low and high band are both '{}'", self.low_band));
        }
        for name in [&self.low_band, &self.high_band] {
            if !bands.iter().any(|b| &b.name == name) {
                return Err(config_error!("classifier band '{}' is not configured", name));
            }
        }
        for (label, value) in [("low", self.threshold_low), ("high", self.threshold_high)] {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error!(
                    "{} threshold must be finite and non-negative, got {}",
                    label,
                    value
                ));
            }
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            low_band: "alpha".to_string(),
            high_band: "beta".to_string(),
            threshold_low: 1.0,
            threshold_high: 1.0,
        }
    }
}

/// Label together with the ratios that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: StateLabel,
    /// baseline / current for the low band
    pub low_ratio: f64,
    /// baseline / current for the high band
    pub high_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct StateClassifier {
    config: ClassifierConfig,
}

impl StateClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Stressed iff the low band fell and the high band rose past their
    /// thresholds relative to the baseline.
    pub fn classify(
        &self,
        baseline: &Baseline,
        current: &AggregatedBandPowers,
    ) -> EegResult<Classification> {
        let low_ratio = ratio(baseline, current, &self.config.low_band)?;
        let high_ratio = ratio(baseline, current, &self.config.high_band)?;

        let label = if low_ratio > self.config.threshold_low && high_ratio < self.config.threshold_high {
            StateLabel::Stressed
        } else {
            StateLabel::Relaxed
        };

        Ok(Classification {
            label,
            low_ratio,
            high_ratio,
        })
    }
}

fn ratio(baseline: &Baseline, current: &AggregatedBandPowers, band: &str) -> EegResult<f64> {
    let reference = baseline.require(band)?;
    let value = current.require(band)?;
    if value == 0.0 || !value.is_finite() {
        return Err(EegError::DegenerateBandPower {
            band: band.to_string(),
            value,
        });
    }
    Ok(reference / value)
}
