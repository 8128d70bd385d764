//! Synthetic EEG board with scenario-driven rhythms

use crate::signal_patterns::Scenario;
use eeg_core::{EegError, EegResult, SampleBlock};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Cyton packet counters wrap at this value
const PACKET_COUNTER_MODULUS: u64 = 256;

/// Noise configuration for realistic EEG simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation in µV (0.0 = no noise)
    pub gaussian_std: f64,
    /// Electrode DC offset in µV, scaled by channel index
    pub dc_offset: f64,
    /// Power line interference frequency (50/60 Hz)
    pub powerline_freq: Option<f64>,
    /// Power line interference amplitude in µV
    pub powerline_amplitude: f64,
}

impl NoiseConfig {
    /// Pure pattern output, no noise or offsets
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            dc_offset: 0.0,
            powerline_freq: None,
            powerline_amplitude: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 2.0,
            dc_offset: 40.0,
            powerline_freq: Some(50.0),
            powerline_amplitude: 3.0,
        }
    }
}

/// Configuration for EEG simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Number of electrode rows
    pub eeg_channels: usize,
    /// Emit a packet counter in row 0 ahead of the electrodes
    pub packet_counter: bool,
    /// Timeline of rhythms to generate
    pub scenario: Scenario,
    pub noise: NoiseConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Cyton layout: counter row plus 8 electrodes at 250 Hz
    pub fn cyton() -> Self {
        Self {
            sampling_rate: 250.0,
            eeg_channels: 8,
            packet_counter: true,
            scenario: Scenario::default(),
            noise: NoiseConfig::default(),
            seed: None,
        }
    }

    /// Ganglion layout: counter row plus 4 electrodes at 200 Hz
    pub fn ganglion() -> Self {
        Self {
            sampling_rate: 200.0,
            eeg_channels: 4,
            ..Self::cyton()
        }
    }

    /// Total rows per block
    pub fn row_count(&self) -> usize {
        self.eeg_channels + usize::from(self.packet_counter)
    }

    pub fn validate(&self) -> EegResult<()> {
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(EegError::SimulationError {
                message: format!("sampling rate must be positive, got {}", self.sampling_rate),
            });
        }
        if self.eeg_channels == 0 {
            return Err(EegError::SimulationError {
                message: "at least one EEG channel is required".to_string(),
            });
        }
        if !self.noise.gaussian_std.is_finite() || self.noise.gaussian_std < 0.0 {
            return Err(EegError::SimulationError {
                message: format!("noise std must be non-negative, got {}", self.noise.gaussian_std),
            });
        }
        self.scenario.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::cyton()
    }
}

/// EEG signal simulator
///
/// Time advances with every generated sample, so consecutive blocks form a
/// continuous recording.
pub struct EegSimulator {
    config: SimulationConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f64>,
    sample_index: u64,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: SimulationConfig) -> EegResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| {
            EegError::SimulationError {
                message: format!("Failed to create normal distribution: {}", e),
            }
        })?;

        Ok(EegSimulator {
            config,
            rng,
            normal_dist,
            sample_index: 0,
        })
    }

    /// Generate the next `num_samples` samples for every row
    pub fn generate(&mut self, num_samples: usize) -> EegResult<SampleBlock> {
        let rows = self.config.row_count();
        let mut channels: Vec<Vec<f64>> = (0..rows).map(|_| Vec::with_capacity(num_samples)).collect();
        let first_eeg_row = usize::from(self.config.packet_counter);

        for offset in 0..num_samples as u64 {
            let index = self.sample_index + offset;
            let time = index as f64 / self.config.sampling_rate;

            if self.config.packet_counter {
                channels[0].push((index % PACKET_COUNTER_MODULUS) as f64);
            }

            let pattern = self.config.scenario.pattern_at(time);
            for channel in 0..self.config.eeg_channels {
                let mut value = pattern.value_at(time, channel);
                value += self.config.noise.dc_offset * (channel + 1) as f64;
                value += self.normal_dist.sample(&mut self.rng);
                if let Some(freq) = self.config.noise.powerline_freq {
                    value += self.config.noise.powerline_amplitude
                        * (2.0 * std::f64::consts::PI * freq * time).sin();
                }
                channels[first_eeg_row + channel].push(value);
            }
        }

        self.sample_index += num_samples as u64;
        SampleBlock::new(channels, self.config.sampling_rate)
    }

    /// Seconds of signal generated so far
    pub fn elapsed(&self) -> f64 {
        self.sample_index as f64 / self.config.sampling_rate
    }

    /// Label of the scenario phase at the current time
    pub fn current_phase(&self) -> Option<&str> {
        self.config
            .scenario
            .phase_at(self.elapsed())
            .map(|p| p.label.as_str())
    }

    /// Reset time offset (useful for restarting simulation)
    pub fn reset_time(&mut self) {
        self.sample_index = 0;
    }

    pub fn set_scenario(&mut self, scenario: Scenario) -> EegResult<()> {
        scenario.validate()?;
        self.config.scenario = scenario;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
