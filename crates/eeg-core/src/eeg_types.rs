//! EEG-specific configuration value types and state labels

use crate::config_error;
use crate::error::EegResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Half-open range of board rows holding the electrodes of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    /// First selected row
    pub start: usize,
    /// One past the last selected row
    pub end: usize,
}

impl ChannelRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Cyton board: row 0 is the packet counter, rows 1..9 are EEG
    pub fn cyton() -> Self {
        Self::new(1, 9)
    }

    /// Ganglion board: four EEG rows after the packet counter
    pub fn ganglion() -> Self {
        Self::new(1, 5)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> EegResult<()> {
        if self.is_empty() {
            return Err(config_error!(
                "channel range {}..{} selects no channels",
                self.start,
                self.end
            ));
        }
        Ok(())
    }
}

impl Default for ChannelRange {
    fn default() -> Self {
        Self::cyton()
    }
}

/// Named closed frequency interval [low, high] in Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub name: String,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl BandDefinition {
    pub fn new(name: &str, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name: name.to_string(),
            low_hz,
            high_hz,
        }
    }

    pub fn alpha() -> Self {
        Self::new("alpha", 8.0, 13.0)
    }

    pub fn beta() -> Self {
        Self::new("beta", 13.0, 30.0)
    }

    /// Default band set used for stress classification
    pub fn stress_bands() -> Vec<BandDefinition> {
        vec![Self::alpha(), Self::beta()]
    }

    /// True when `frequency_hz` falls inside the closed interval
    pub fn contains(&self, frequency_hz: f64) -> bool {
        frequency_hz >= self.low_hz && frequency_hz <= self.high_hz
    }

    pub fn validate(&self) -> EegResult<()> {
        if self.name.trim().is_empty() {
            return Err(config_error!("band name cannot be empty"));
        }
        if !self.low_hz.is_finite() || !self.high_hz.is_finite() || self.low_hz < 0.0 {
            return Err(config_error!(
                "band '{}' has invalid bounds [{}, {}]",
                self.name, self.low_hz, self.high_hz
            ));
        }
        if self.low_hz >= self.high_hz {
            return Err(config_error!(
                "band '{}' low edge {} Hz must be below high edge {} Hz",
                self.name, self.low_hz, self.high_hz
            ));
        }
        Ok(())
    }

    /// Validate a whole band set: non-empty, valid intervals, unique names
    pub fn validate_set(bands: &[BandDefinition]) -> EegResult<()> {
        if bands.is_empty() {
            return Err(config_error!("at least one band must be configured"));
        }

        let mut seen = HashSet::with_capacity(bands.len());
        for band in bands {
            band.validate()?;
            if !seen.insert(band.name.as_str()) {
                return Err(config_error!("duplicate band name '{}'", band.name));
            }
        }
        Ok(())
    }
}

/// Instantaneous state relative to the session baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateLabel {
    Stressed,
    Relaxed,
}

impl StateLabel {
    pub fn is_stressed(&self) -> bool {
        matches!(self, StateLabel::Stressed)
    }
}

impl std::fmt::Display for StateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateLabel::Stressed => write!(f, "Stressed"),
            StateLabel::Relaxed => write!(f, "Relaxed"),
        }
    }
}
