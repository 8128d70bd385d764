//! Per-cycle feature chain: preprocess, estimate, integrate, aggregate

use crate::aggregator::{aggregate_channels, AggregatedBandPowers};
use crate::band_power::{BandPowerIntegrator, BandPowerMatrix};
use crate::config::ProcessingConfig;
use crate::preprocessor::Preprocessor;
use crate::spectral::WelchEstimator;
use eeg_core::{EegResult, SampleBlock};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Output of one successful pass through the pipeline
#[derive(Debug, Clone)]
pub struct CycleFeatures {
    /// Per-channel band powers
    pub band_powers: BandPowerMatrix,
    /// Cross-channel means, one per band
    pub aggregated: AggregatedBandPowers,
    /// Welch segments averaged per channel
    pub segments: usize,
    /// Wall time spent in the pipeline
    pub processing_time_us: u64,
}

/// Running pipeline statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelinePerformance {
    pub blocks_processed: u64,
    pub blocks_failed: u64,
    pub total_latency_us: u64,
    pub avg_latency_us: u64,
}

/// Chains the processing stages configured by a [`ProcessingConfig`]
#[derive(Debug)]
pub struct BandPowerPipeline {
    preprocessor: Preprocessor,
    estimator: WelchEstimator,
    integrator: BandPowerIntegrator,
    performance: PipelinePerformance,
}

impl BandPowerPipeline {
    pub fn new(config: &ProcessingConfig) -> EegResult<Self> {
        config.validate()?;

        Ok(BandPowerPipeline {
            preprocessor: Preprocessor::new(config.channels),
            estimator: WelchEstimator::new(&config.spectral, config.sampling_rate)?,
            integrator: BandPowerIntegrator::new(config.bands.clone())?,
            performance: PipelinePerformance::default(),
        })
    }

    /// Samples per channel the estimator needs at minimum
    pub fn min_samples(&self) -> usize {
        self.estimator.window_len()
    }

    /// Process one raw block. No partial output on failure.
    pub fn process(&mut self, block: &SampleBlock) -> EegResult<CycleFeatures> {
        let start_time = Instant::now();
        let result = self.run_stages(block);
        let elapsed = start_time.elapsed().as_micros() as u64;

        match result {
            Ok((band_powers, aggregated, segments)) => {
                self.performance.blocks_processed += 1;
                self.performance.total_latency_us += elapsed;
                self.performance.avg_latency_us =
                    self.performance.total_latency_us / self.performance.blocks_processed;

                Ok(CycleFeatures {
                    band_powers,
                    aggregated,
                    segments,
                    processing_time_us: elapsed,
                })
            }
            Err(e) => {
                self.performance.blocks_failed += 1;
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        block: &SampleBlock,
    ) -> EegResult<(BandPowerMatrix, AggregatedBandPowers, usize)> {
        let cleaned = self.preprocessor.clean(block)?;
        let psd = self.estimator.estimate(&cleaned)?;
        let band_powers = self.integrator.integrate(&psd);
        let aggregated = aggregate_channels(&band_powers)?;
        Ok((band_powers, aggregated, psd.segments()))
    }

    pub fn performance_summary(&self) -> PipelinePerformance {
        self.performance.clone()
    }
}
