//! Single-assignment baseline for a monitoring session

use crate::aggregator::AggregatedBandPowers;
use eeg_core::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// Reference band powers captured once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    powers: AggregatedBandPowers,
}

impl Baseline {
    pub fn powers(&self) -> &AggregatedBandPowers {
        &self.powers
    }

    pub fn require(&self, band: &str) -> EegResult<f64> {
        self.powers.require(band)
    }
}

#[derive(Debug, Clone, Default)]
enum BaselineState {
    #[default]
    Empty,
    Set(Baseline),
}

/// Owns the session baseline: Empty until the first capture, then Set for good
#[derive(Debug, Clone, Default)]
pub struct BaselineTracker {
    state: BaselineState,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, values: AggregatedBandPowers) -> EegResult<&Baseline> {
        if let BaselineState::Set(_) = self.state {
            return Err(EegError::BaselineAlreadyCaptured);
        }

        tracing::info!(
            bands = ?values.iter().collect::<Vec<_>>(),
            "baseline captured"
        );
        self.state = BaselineState::Set(Baseline { powers: values });
        self.get()
    }

    pub fn get(&self) -> EegResult<&Baseline> {
        match &self.state {
            BaselineState::Set(baseline) => Ok(baseline),
            BaselineState::Empty => Err(EegError::NoBaselineCaptured),
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.state, BaselineState::Set(_))
    }
}
