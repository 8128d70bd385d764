//! Monitor configuration: processing, session timing and simulated board

use crate::session::SessionConfig;
use eeg_core::{config_error, EegResult};
use eeg_processing::{BoardProfile, ProcessingConfig};
use eeg_simulation::{SimulationConfig, StreamConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub processing: ProcessingConfig,
    pub session: SessionConfig,
    /// Simulated board standing in for hardware
    pub simulation: StreamConfig,
}

impl MonitorConfig {
    pub fn for_board(board: BoardProfile) -> Self {
        let simulation = match board {
            BoardProfile::Ganglion => SimulationConfig::ganglion(),
            BoardProfile::Cyton | BoardProfile::Custom => SimulationConfig::cyton(),
        };

        Self {
            processing: ProcessingConfig::for_board(board),
            session: SessionConfig::default(),
            simulation: StreamConfig {
                chunk_samples: (simulation.sampling_rate / 10.0).round().max(1.0) as usize,
                simulation,
                ..StreamConfig::default()
            },
        }
    }

    /// Validate every section and the way they fit together
    pub fn validate(&self) -> EegResult<()> {
        self.processing.validate()?;
        self.session.validate()?;
        self.simulation.validate()?;

        let board_rate = self.simulation.simulation.sampling_rate;
        if (board_rate - self.processing.sampling_rate).abs() > f64::EPSILON {
            return Err(config_error!(
                "simulated board runs at {} Hz but processing expects {} Hz",
                board_rate,
                self.processing.sampling_rate
            ));
        }

        let rows = self.simulation.simulation.row_count();
        if self.processing.channels.end > rows {
            return Err(config_error!(
                "channel range {}..{} exceeds the {} rows of the simulated board",
                self.processing.channels.start,
                self.processing.channels.end,
                rows
            ));
        }

        if self.session.samples_per_cycle > self.simulation.buffer_capacity {
            return Err(config_error!(
                "cycles request {} samples but the board buffers only {}",
                self.session.samples_per_cycle,
                self.simulation.buffer_capacity
            ));
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> EegResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| config_error!("Failed to read {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("Failed to serialize configuration: {}", e))
    }

    pub fn from_json(json: &str) -> EegResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| config_error!("Failed to deserialize configuration: {}", e))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::for_board(BoardProfile::Cyton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_core::{ChannelRange, EegError};

    #[test]
    fn test_board_presets_are_consistent() {
        for board in [BoardProfile::Cyton, BoardProfile::Ganglion, BoardProfile::Custom] {
            let config = MonitorConfig::for_board(board);
            assert!(config.validate().is_ok(), "{:?}", board);
        }

        let ganglion = MonitorConfig::for_board(BoardProfile::Ganglion);
        assert_eq!(ganglion.simulation.chunk_samples, 20);
        assert_eq!(ganglion.simulation.simulation.row_count(), 5);
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let mut config = MonitorConfig::default();
        config.processing.sampling_rate = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channels_beyond_board_rejected() {
        let mut config = MonitorConfig::for_board(BoardProfile::Ganglion);
        config.processing.channels = ChannelRange::new(1, 9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_and_load() {
        let config = MonitorConfig::default();
        let json = config.to_json().unwrap();

        let path = std::env::temp_dir().join(format!("eeg-monitor-config-{}.json", std::process::id()));
        std::fs::write(&path, &json).unwrap();
        let loaded = MonitorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.session, config.session);
        assert_eq!(loaded.simulation, config.simulation);
        assert_eq!(loaded.processing.channels, config.processing.channels);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let result = MonitorConfig::load("/nonexistent/eeg-monitor.json");
        assert!(matches!(result, Err(EegError::ConfigurationError { .. })));
    }
}
