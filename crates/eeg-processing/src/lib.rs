//! EEG-Processing: band power pipeline and stress classification
//!
//! DC removal, Welch PSD, band integration, channel aggregation, baseline
//! tracking and baseline-relative classification.

pub mod aggregator;
pub mod band_power;
pub mod baseline;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod preprocessor;
pub mod spectral;

pub use aggregator::{aggregate_channels, AggregatedBandPowers};
pub use band_power::{BandPowerIntegrator, BandPowerMatrix};
pub use baseline::{Baseline, BaselineTracker};
pub use classifier::{Classification, ClassifierConfig, StateClassifier};
pub use config::{BoardProfile, ProcessingConfig};
pub use pipeline::{BandPowerPipeline, CycleFeatures, PipelinePerformance};
pub use preprocessor::{CleanedBlock, Preprocessor};
pub use spectral::{PowerSpectrum, SpectralConfig, WelchEstimator, WindowFunction};
