//! Configuration management for band power processing

use crate::classifier::ClassifierConfig;
use crate::spectral::SpectralConfig;
use eeg_core::{config_error, BandDefinition, ChannelRange, EegResult};
use serde::{Deserialize, Serialize};

/// Board families with known row layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardProfile {
    /// OpenBCI Cyton: 8 EEG rows at 250 Hz
    Cyton,
    /// OpenBCI Ganglion: 4 EEG rows at 200 Hz
    Ganglion,
    /// Anything else
    Custom,
}

/// Everything the per-cycle processing chain needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Configuration name/profile
    pub name: String,
    /// Board layout this configuration targets
    pub board: BoardProfile,
    /// Sampling frequency in Hz, constant for a session
    pub sampling_rate: f64,
    /// Electrode rows of interest
    pub channels: ChannelRange,
    /// Bands integrated every cycle, in output order
    pub bands: Vec<BandDefinition>,
    /// Welch estimator settings
    pub spectral: SpectralConfig,
    /// Stress decision settings
    pub classifier: ClassifierConfig,
}

impl ProcessingConfig {
    /// OpenBCI Cyton defaults
    pub fn cyton() -> Self {
        ProcessingConfig {
            name: "Cyton stress monitor".to_string(),
            board: BoardProfile::Cyton,
            sampling_rate: 250.0,
            channels: ChannelRange::cyton(),
            bands: BandDefinition::stress_bands(),
            spectral: SpectralConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }

    /// OpenBCI Ganglion defaults
    pub fn ganglion() -> Self {
        ProcessingConfig {
            name: "Ganglion stress monitor".to_string(),
            board: BoardProfile::Ganglion,
            sampling_rate: 200.0,
            channels: ChannelRange::ganglion(),
            ..Self::cyton()
        }
    }

    /// Create configuration suitable for given board
    pub fn for_board(board: BoardProfile) -> Self {
        match board {
            BoardProfile::Cyton => Self::cyton(),
            BoardProfile::Ganglion => Self::ganglion(),
            BoardProfile::Custom => ProcessingConfig {
                name: "Custom stress monitor".to_string(),
                board: BoardProfile::Custom,
                ..Self::cyton()
            },
        }
    }

    /// Welch segment length in samples
    pub fn window_samples(&self) -> usize {
        self.spectral.window_samples(self.sampling_rate)
    }

    pub fn band(&self, name: &str) -> Option<&BandDefinition> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Validate entire configuration
    pub fn validate(&self) -> EegResult<()> {
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(config_error!(
                "sampling rate must be positive, got {}",
                self.sampling_rate
            ));
        }

        self.channels.validate()?;
        BandDefinition::validate_set(&self.bands)?;
        self.spectral.validate(self.sampling_rate)?;
        self.classifier.validate(&self.bands)?;

        let nyquist = self.sampling_rate / 2.0;
        for band in self.bands.iter().filter(|b| b.low_hz >= nyquist) {
            tracing::warn!(
                band = %band.name,
                nyquist,
                "band lies above the Nyquist frequency and will always integrate to zero"
            );
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("Failed to serialize configuration: {}", e))
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| config_error!("Failed to deserialize configuration: {}", e))
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self::cyton()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyton_config() {
        let config = ProcessingConfig::cyton();
        assert_eq!(config.board, BoardProfile::Cyton);
        assert_eq!(config.channels.len(), 8);
        assert_eq!(config.window_samples(), 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ganglion_config() {
        let config = ProcessingConfig::for_board(BoardProfile::Ganglion);
        assert_eq!(config.sampling_rate, 200.0);
        assert_eq!(config.window_samples(), 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProcessingConfig::cyton();
        assert!(config.validate().is_ok());

        config.sampling_rate = -1.0;
        assert!(config.validate().is_err());

        config.sampling_rate = 250.0;
        config.bands.push(BandDefinition::new("beta", 20.0, 25.0));
        assert!(config.validate().is_err());

        config.bands = vec![BandDefinition::alpha()];
        assert!(config.validate().is_err(), "classifier needs the beta band");

        config.bands = BandDefinition::stress_bands();
        config.channels = ChannelRange::new(4, 4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_serialization() {
        let config = ProcessingConfig::ganglion();

        let json = config.to_json().unwrap();
        assert!(json.contains("\"alpha\""));

        let restored = ProcessingConfig::from_json(&json).unwrap();
        assert_eq!(restored.name, config.name);
        assert_eq!(restored.board, config.board);
        assert_eq!(restored.channels, config.channels);
        assert_eq!(restored.bands, config.bands);
        assert_eq!(restored.classifier, config.classifier);

        assert!(ProcessingConfig::from_json("{").is_err());
    }

    #[test]
    fn test_validation_errors_are_configuration_errors() {
        use eeg_core::EegError;

        let config = ProcessingConfig {
            sampling_rate: 0.0,
            ..ProcessingConfig::cyton()
        };
        assert_eq!(
            config.validate(),
            Err(EegError::ConfigurationError {
                message: "sampling rate must be positive, got 0".to_string()
            })
        );

        match ProcessingConfig::from_json("{") {
            Err(EegError::ConfigurationError { message }) => {
                assert!(message.starts_with("Failed to deserialize configuration"));
            }
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_band_lookup() {
        let config = ProcessingConfig::cyton();
        assert_eq!(config.band("beta").map(|b| b.high_hz), Some(30.0));
        assert!(config.band("theta").is_none());
    }
}
