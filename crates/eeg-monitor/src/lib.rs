//! EEG-Monitor: session orchestration for the stress monitor
//!
//! Wires a data source, the band power pipeline and a presentation into a
//! cancellable sequence of monitoring cycles.

pub mod config;
pub mod presentation;
pub mod session;

pub use config::MonitorConfig;
pub use presentation::{CueCounter, LogPresentation};
pub use session::{
    CycleOutcome, CycleReport, SessionConfig, SessionEnd, SessionLoop, SessionReport,
    SessionSummary,
};
