//! EEG-Core: Foundation types for EEG stress monitoring
//!
//! Sample containers, band and label types, the error taxonomy and the
//! collaborator traits shared by every crate in the workspace.

pub mod collaborators;
pub mod eeg_types;
pub mod error;
pub mod sample_block;

pub use collaborators::{DataSource, Presentation};
pub use eeg_types::*;
pub use error::{EegError, EegResult, ErrorScope};
pub use sample_block::SampleBlock;
