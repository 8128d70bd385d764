//! Error handling for the EEG monitor
//!
//! One error type covers every stage of a monitoring session. Each variant
//! knows whether it only spoils the current acquisition cycle or whether the
//! session as a whole has to stop, see [`EegError::scope`].

use thiserror::Error;

/// Result type alias for EEG monitor operations
pub type EegResult<T> = Result<T, EegError>;

/// How far an error reaches inside a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Abandon the current cycle, keep acquiring
    Cycle,
    /// Stop the session
    Session,
}

/// Error type for all EEG monitor operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EegError {
    /// Block is shorter than the analysis window
    #[error("insufficient samples: need {required}, got {actual}")]
    InsufficientSamples {
        /// Samples per channel the stage needs
        required: usize,
        /// Samples per channel that were supplied
        actual: usize,
    },

    /// Classification requested before a baseline exists
    #[error("no baseline captured yet")]
    NoBaselineCaptured,

    /// Second capture attempt within one session
    #[error("baseline already captured for this session")]
    BaselineAlreadyCaptured,

    /// Current band power is zero, the baseline ratio is undefined
    #[error("degenerate band power for band '{band}': {value}")]
    DegenerateBandPower {
        /// Band whose power cannot be used as a denominator
        band: String,
        /// Offending value
        value: f64,
    },

    /// The data source did not deliver within the allowed time
    #[error("data source timed out after {waited_ms} ms")]
    DataSourceTimeout {
        /// Time spent waiting in milliseconds
        waited_ms: u64,
    },

    /// The acquisition device went away
    #[error("device disconnected: {reason}")]
    DeviceDisconnected {
        /// What the source reported
        reason: String,
    },

    /// Malformed sample data
    #[error("invalid signal data: {reason}")]
    InvalidSignalData {
        /// Description of the problem
        reason: String,
    },

    /// Channel selection does not fit the block
    #[error("channel range {start}..{end} invalid for block with {available} channels")]
    InvalidChannelRange {
        /// First selected row
        start: usize,
        /// One past the last selected row
        end: usize,
        /// Rows present in the block
        available: usize,
    },

    /// Band name not present in the configured band set
    #[error("unknown band '{name}'")]
    UnknownBand {
        /// Requested band name
        name: String,
    },

    /// Invalid configuration
    #[error("configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem
        message: String,
    },

    /// Synthetic source failure
    #[error("simulation error: {message}")]
    SimulationError {
        /// Description of the failure
        message: String,
    },
}

impl EegError {
    /// Reach of this error inside a session.
    ///
    /// Preprocessing and spectral failures only cost one cycle. Sequencing,
    /// collaborator and configuration failures end the session.
    pub fn scope(&self) -> ErrorScope {
        match self {
            EegError::InsufficientSamples { .. }
            | EegError::InvalidSignalData { .. }
            | EegError::InvalidChannelRange { .. }
            | EegError::DegenerateBandPower { .. } => ErrorScope::Cycle,
            EegError::NoBaselineCaptured
            | EegError::BaselineAlreadyCaptured
            | EegError::DataSourceTimeout { .. }
            | EegError::DeviceDisconnected { .. }
            | EegError::UnknownBand { .. }
            | EegError::ConfigurationError { .. }
            | EegError::SimulationError { .. } => ErrorScope::Session,
        }
    }

    /// True when the session has to stop
    pub fn is_session_fatal(&self) -> bool {
        self.scope() == ErrorScope::Session
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::EegError::ConfigurationError {
            message: format!($($arg)+),
        }
    };
}
