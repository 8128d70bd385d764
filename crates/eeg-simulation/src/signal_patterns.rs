//! Pre-defined EEG rhythm patterns and timed scenarios for simulation

use eeg_core::{config_error, EegError, EegResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// One sinusoidal component of a rhythm, amplitude in µV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub frequency: f64,
    pub amplitude: f64,
}

impl Oscillation {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Predefined EEG signal patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPattern {
    /// No cortical activity, noise only
    Flat,
    /// Single pure tone
    Tone { frequency: f64, amplitude: f64 },
    /// Sum of oscillations
    Rhythm { components: Vec<Oscillation> },
}

impl SignalPattern {
    /// Eyes-closed resting state: strong alpha, weak beta
    pub fn relaxed() -> Self {
        SignalPattern::Rhythm {
            components: vec![
                Oscillation::new(6.0, 5.0),
                Oscillation::new(10.0, 20.0),
                Oscillation::new(20.0, 4.0),
            ],
        }
    }

    /// Alpha suppression with elevated beta
    pub fn stressed() -> Self {
        SignalPattern::Rhythm {
            components: vec![
                Oscillation::new(6.0, 5.0),
                Oscillation::new(10.0, 6.0),
                Oscillation::new(20.0, 14.0),
                Oscillation::new(25.0, 6.0),
            ],
        }
    }

    /// Value at `time` seconds for `channel`; channels differ by phase and gain
    pub fn value_at(&self, time: f64, channel: usize) -> f64 {
        let phase = channel as f64 * 0.7;
        let gain = 1.0 + 0.05 * channel as f64;
        let tone = |osc: &Oscillation| osc.amplitude * (2.0 * PI * osc.frequency * time + phase).sin();

        match self {
            SignalPattern::Flat => 0.0,
            SignalPattern::Tone {
                frequency,
                amplitude,
            } => gain * tone(&Oscillation::new(*frequency, *amplitude)),
            SignalPattern::Rhythm { components } => gain * components.iter().map(tone).sum::<f64>(),
        }
    }

    pub fn validate(&self) -> EegResult<()> {
        let components: Vec<Oscillation> = match self {
            SignalPattern::Flat => Vec::new(),
            SignalPattern::Tone {
                frequency,
                amplitude,
            } => vec![Oscillation::new(*frequency, *amplitude)],
            SignalPattern::Rhythm { components } => components.clone(),
        };

        for osc in components {
            if !osc.frequency.is_finite() || osc.frequency < 0.0 || !osc.amplitude.is_finite() {
                return Err(EegError::SimulationError {
                    message: format!(
                        "invalid oscillation {} Hz / {} µV",
                        osc.frequency, osc.amplitude
                    ),
                });
            }
        }
        Ok(())
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Flat => "Flat (noise only)",
            SignalPattern::Tone { .. } => "Pure tone",
            SignalPattern::Rhythm { .. } => "Mixed rhythm",
        }
    }
}

/// Pattern held for a fixed time within a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPhase {
    pub label: String,
    pub pattern: SignalPattern,
    /// Phase length in seconds; `None` holds the pattern indefinitely
    pub duration: Option<f64>,
}

impl ScenarioPhase {
    pub fn new(label: impl Into<String>, pattern: SignalPattern, duration: Option<f64>) -> Self {
        Self {
            label: label.into(),
            pattern,
            duration,
        }
    }
}

/// Timeline of patterns. The last phase holds once the timeline runs out,
/// unless `repeat` is set and every phase is bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub phases: Vec<ScenarioPhase>,
    #[serde(default)]
    pub repeat: bool,
}

impl Scenario {
    pub fn constant(name: impl Into<String>, pattern: SignalPattern) -> Self {
        let name = name.into();
        Scenario {
            phases: vec![ScenarioPhase::new(name.clone(), pattern, None)],
            name,
            repeat: false,
        }
    }

    pub fn relaxed() -> Self {
        Self::constant("relaxed", SignalPattern::relaxed())
    }

    pub fn stressed() -> Self {
        Self::constant("stressed", SignalPattern::stressed())
    }

    /// Calm for `calm_seconds`, stressed afterwards
    pub fn stress_onset(calm_seconds: f64) -> Self {
        Scenario {
            name: "stress-onset".to_string(),
            phases: vec![
                ScenarioPhase::new("calm", SignalPattern::relaxed(), Some(calm_seconds)),
                ScenarioPhase::new("stressed", SignalPattern::stressed(), None),
            ],
            repeat: false,
        }
    }

    /// Relaxed and stressed blocks of `period` seconds each, repeating
    pub fn alternating(period: f64) -> Self {
        Scenario {
            name: "alternating".to_string(),
            phases: vec![
                ScenarioPhase::new("calm", SignalPattern::relaxed(), Some(period)),
                ScenarioPhase::new("stressed", SignalPattern::stressed(), Some(period)),
            ],
            repeat: true,
        }
    }

    /// Names accepted by [`Scenario::from_str`]
    pub fn preset_names() -> &'static [&'static str] {
        &["relaxed", "stressed", "stress-onset", "alternating"]
    }

    /// Phase active at `time` seconds
    pub fn phase_at(&self, time: f64) -> Option<&ScenarioPhase> {
        let total: Option<f64> = self.phases.iter().map(|p| p.duration).sum();
        let mut t = match total {
            Some(total) if self.repeat && total > 0.0 => time % total,
            _ => time,
        };

        for phase in &self.phases {
            match phase.duration {
                Some(duration) if t >= duration => t -= duration,
                _ => return Some(phase),
            }
        }
        self.phases.last()
    }

    pub fn pattern_at(&self, time: f64) -> &SignalPattern {
        const FLAT: &SignalPattern = &SignalPattern::Flat;
        self.phase_at(time).map(|p| &p.pattern).unwrap_or(FLAT)
    }

    pub fn validate(&self) -> EegResult<()> {
        if self.phases.is_empty() {
            return Err(EegError::SimulationError {
                message: format!("scenario '{}' has no phases", self.name),
            });
        }
        for phase in &self.phases {
            if let Some(duration) = phase.duration {
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(EegError::SimulationError {
                        message: format!(
                            "phase '{}' needs a positive duration, got {}",
                            phase.label, duration
                        ),
                    });
                }
            }
            phase.pattern.validate()?;
        }
        Ok(())
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::stress_onset(30.0)
    }
}

impl FromStr for Scenario {
    type Err = EegError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "relaxed" => Ok(Self::relaxed()),
            "stressed" => Ok(Self::stressed()),
            "stress-onset" => Ok(Self::stress_onset(30.0)),
            "alternating" => Ok(Self::alternating(30.0)),
            other => Err(config_error!(
                "unknown scenario '{}', expected one of {:?}",
                other,
                Self::preset_names()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_is_zero() {
        assert_eq!(SignalPattern::Flat.value_at(1.234, 3), 0.0);
    }

    #[test]
    fn test_tone_matches_sine() {
        let pattern = SignalPattern::Tone {
            frequency: 10.0,
            amplitude: 2.0,
        };
        let expected = 2.0 * (2.0 * PI * 10.0 * 0.0125).sin();
        assert!((pattern.value_at(0.0125, 0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_stress_onset_switches_once() {
        let scenario = Scenario::stress_onset(10.0);
        assert_eq!(scenario.phase_at(0.0).unwrap().label, "calm");
        assert_eq!(scenario.phase_at(9.99).unwrap().label, "calm");
        assert_eq!(scenario.phase_at(10.0).unwrap().label, "stressed");
        assert_eq!(scenario.phase_at(1e6).unwrap().label, "stressed");
    }

    #[test]
    fn test_alternating_wraps() {
        let scenario = Scenario::alternating(5.0);
        assert_eq!(scenario.phase_at(2.0).unwrap().label, "calm");
        assert_eq!(scenario.phase_at(7.0).unwrap().label, "stressed");
        assert_eq!(scenario.phase_at(12.0).unwrap().label, "calm");
    }

    #[test]
    fn test_presets_parse_and_validate() {
        for name in Scenario::preset_names() {
            let scenario: Scenario = name.parse().unwrap();
            assert!(scenario.validate().is_ok(), "{}", name);
        }
        assert!("panic".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_scenario_json_roundtrip() {
        let scenario = Scenario::stress_onset(12.0);
        let json = serde_json::to_string(&scenario).unwrap();
        let restored: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, scenario);
    }

    #[test]
    fn test_invalid_scenarios() {
        let empty = Scenario {
            name: "empty".into(),
            phases: vec![],
            repeat: false,
        };
        assert!(empty.validate().is_err());

        let bad_tone = Scenario::constant(
            "bad",
            SignalPattern::Tone {
                frequency: f64::NAN,
                amplitude: 1.0,
            },
        );
        assert!(bad_tone.validate().is_err());
    }
}
