//! EEG-Simulation: synthetic EEG boards for demos and tests
//!
//! Provides scenario-driven signal generation, a scripted replay source and a
//! real-time streaming board, all usable as a [`eeg_core::DataSource`].

pub mod eeg_simulator;
pub mod real_time_stream;
pub mod scripted_source;
pub mod signal_patterns;

pub use eeg_simulator::*;
pub use real_time_stream::*;
pub use scripted_source::*;
pub use signal_patterns::*;
