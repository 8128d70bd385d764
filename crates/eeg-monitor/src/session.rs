//! Monitoring session: repeated acquire → process → classify cycles

use chrono::{DateTime, Utc};
use eeg_core::{DataSource, EegError, EegResult, ErrorScope, Presentation, StateLabel};
use eeg_processing::{
    AggregatedBandPowers, BandPowerPipeline, BaselineTracker, Classification, PipelinePerformance,
    ProcessingConfig, StateClassifier,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing and size of the monitoring cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of cycles before the session completes
    pub cycles: usize,
    /// Samples requested from the data source per cycle
    pub samples_per_cycle: usize,
    /// Pause between two cycles
    pub inter_cycle_delay_ms: u64,
    /// Upper bound on a single data source wait; `None` waits forever
    pub source_timeout_ms: Option<u64>,
    /// Buffered cycle reports per subscriber
    pub report_capacity: usize,
}

impl SessionConfig {
    pub fn inter_cycle_delay(&self) -> Duration {
        Duration::from_millis(self.inter_cycle_delay_ms)
    }

    pub fn source_timeout(&self) -> Option<Duration> {
        self.source_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> EegResult<()> {
        if self.cycles == 0 {
            return Err(eeg_core::config_error!("session needs at least one cycle"));
        }
        if self.samples_per_cycle == 0 {
            return Err(eeg_core::config_error!("samples per cycle must be positive"));
        }
        if self.source_timeout_ms == Some(0) {
            return Err(eeg_core::config_error!("source timeout must be positive when set"));
        }
        if self.report_capacity == 0 {
            return Err(eeg_core::config_error!("report capacity must be positive"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cycles: 120,
            samples_per_cycle: 1000,
            inter_cycle_delay_ms: 3000,
            source_timeout_ms: Some(10_000),
            report_capacity: 64,
        }
    }
}

/// What a single cycle produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// First processed cycle; its band powers became the baseline
    BaselineCaptured,
    Classified(Classification),
    /// Processed, but a band power was unusable for a ratio
    Indeterminate { reason: String },
    /// Dropped before producing band powers
    Skipped { reason: String },
}

impl CycleOutcome {
    pub fn label(&self) -> Option<StateLabel> {
        match self {
            CycleOutcome::Classified(c) => Some(c.label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: usize,
    pub timestamp: DateTime<Utc>,
    pub outcome: CycleOutcome,
    /// Cross-channel band powers; absent for skipped cycles
    pub band_powers: Option<AggregatedBandPowers>,
    pub processing_time_us: u64,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    Completed,
    Cancelled,
    Aborted(EegError),
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cycles: Vec<CycleReport>,
    pub end: SessionEnd,
    pub performance: PipelinePerformance,
}

/// Serializable digest of a [`SessionReport`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cycles_run: usize,
    pub stressed: usize,
    pub relaxed: usize,
    pub indeterminate: usize,
    pub skipped: usize,
    pub end: String,
    pub average_latency_us: u64,
}

impl SessionReport {
    pub fn count_label(&self, label: StateLabel) -> usize {
        self.cycles
            .iter()
            .filter(|r| r.outcome.label() == Some(label))
            .count()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.end, SessionEnd::Aborted(_))
    }

    pub fn summary(&self) -> SessionSummary {
        let count = |pred: fn(&CycleOutcome) -> bool| self.cycles.iter().filter(|r| pred(&r.outcome)).count();

        SessionSummary {
            started_at: self.started_at,
            finished_at: self.finished_at,
            cycles_run: self.cycles.len(),
            stressed: self.count_label(StateLabel::Stressed),
            relaxed: self.count_label(StateLabel::Relaxed),
            indeterminate: count(|o| matches!(o, CycleOutcome::Indeterminate { .. })),
            skipped: count(|o| matches!(o, CycleOutcome::Skipped { .. })),
            end: match &self.end {
                SessionEnd::Completed => "completed".to_string(),
                SessionEnd::Cancelled => "cancelled".to_string(),
                SessionEnd::Aborted(e) => format!("aborted: {}", e),
            },
            average_latency_us: self.performance.avg_latency_us,
        }
    }
}

/// Drives a monitoring session against a data source and a presentation
pub struct SessionLoop<S, P> {
    config: SessionConfig,
    processing: ProcessingConfig,
    source: S,
    presentation: P,
    cancel: CancellationToken,
    reports: broadcast::Sender<CycleReport>,
}

/// Per-session processing state
struct CycleContext {
    pipeline: BandPowerPipeline,
    tracker: BaselineTracker,
    classifier: StateClassifier,
}

impl<S: DataSource, P: Presentation> SessionLoop<S, P> {
    pub fn new(config: SessionConfig, source: S, presentation: P, cancel: CancellationToken) -> Self {
        let (reports, _) = broadcast::channel(config.report_capacity.max(1));
        Self {
            config,
            processing: ProcessingConfig::default(),
            source,
            presentation,
            cancel,
            reports,
        }
    }

    /// Replace the default (Cyton) processing configuration
    pub fn with_processing(mut self, processing: ProcessingConfig) -> Self {
        self.processing = processing;
        self
    }

    /// Receive every cycle report as it is produced
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    /// Run until all cycles are done, the token is cancelled or a session
    /// level error occurs. `Err` is returned only for invalid setup.
    pub async fn run(mut self) -> EegResult<SessionReport> {
        self.config.validate()?;
        let pipeline = BandPowerPipeline::new(&self.processing)?;

        let source_rate = self.source.sampling_rate();
        if (source_rate - self.processing.sampling_rate).abs() > f64::EPSILON {
            return Err(eeg_core::config_error!(
                "data source '{}' delivers {} Hz but processing expects {} Hz",
                self.source.name(),
                source_rate,
                self.processing.sampling_rate
            ));
        }
        if self.config.samples_per_cycle < pipeline.min_samples() {
            warn!(
                samples_per_cycle = self.config.samples_per_cycle,
                required = pipeline.min_samples(),
                "cycles are shorter than one spectral window and will be skipped"
            );
        }

        let mut ctx = CycleContext {
            pipeline,
            tracker: BaselineTracker::new(),
            classifier: StateClassifier::new(self.processing.classifier.clone()),
        };
        let started_at = Utc::now();
        let mut cycles = Vec::with_capacity(self.config.cycles);

        info!(
            source = self.source.name(),
            cycles = self.config.cycles,
            samples_per_cycle = self.config.samples_per_cycle,
            delay_ms = self.config.inter_cycle_delay_ms,
            "monitoring session started"
        );

        let end = 'session: {
            for cycle in 0..self.config.cycles {
                if self.cancel.is_cancelled() {
                    break 'session SessionEnd::Cancelled;
                }

                match self.run_cycle(cycle, &mut ctx).await {
                    Ok(report) => {
                        // No subscribers is fine
                        let _ = self.reports.send(report.clone());
                        cycles.push(report);
                    }
                    Err(e) => {
                        error!(cycle, error = %e, "session aborted");
                        break 'session SessionEnd::Aborted(e);
                    }
                }

                if cycle + 1 < self.config.cycles {
                    let cancelled = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => true,
                        _ = tokio::time::sleep(self.config.inter_cycle_delay()) => false,
                    };
                    if cancelled {
                        break 'session SessionEnd::Cancelled;
                    }
                }
            }
            SessionEnd::Completed
        };

        let report = SessionReport {
            started_at,
            finished_at: Utc::now(),
            cycles,
            end,
            performance: ctx.pipeline.performance_summary(),
        };
        info!(end = ?report.end, cycles_run = report.cycles.len(), "monitoring session finished");
        Ok(report)
    }

    async fn run_cycle(&mut self, cycle: usize, ctx: &mut CycleContext) -> EegResult<CycleReport> {
        let block = match self.fetch_block().await {
            Ok(block) => block,
            Err(e) => return skip_or_abort(cycle, e),
        };
        debug!(cycle, block = %block.id, samples = block.samples_per_channel(), "block received");

        let features = match ctx.pipeline.process(&block) {
            Ok(features) => features,
            Err(e) => return skip_or_abort(cycle, e),
        };

        let outcome = if !ctx.tracker.is_captured() {
            ctx.tracker.capture(features.aggregated.clone())?;
            info!(cycle, "baseline captured");
            CycleOutcome::BaselineCaptured
        } else {
            match ctx.classifier.classify(ctx.tracker.get()?, &features.aggregated) {
                Ok(classification) => {
                    info!(
                        cycle,
                        state = %classification.label,
                        low_ratio = classification.low_ratio,
                        high_ratio = classification.high_ratio,
                        "cycle classified"
                    );
                    if classification.label.is_stressed() {
                        self.presentation.trigger_attention_cue();
                    }
                    CycleOutcome::Classified(classification)
                }
                Err(e @ EegError::DegenerateBandPower { .. }) => {
                    warn!(cycle, error = %e, "cycle indeterminate");
                    CycleOutcome::Indeterminate {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            }
        };

        Ok(CycleReport {
            cycle,
            timestamp: Utc::now(),
            outcome,
            band_powers: Some(features.aggregated),
            processing_time_us: features.processing_time_us,
        })
    }

    async fn fetch_block(&mut self) -> EegResult<eeg_core::SampleBlock> {
        let samples = self.config.samples_per_cycle;
        match self.config.source_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.source.get_block(samples))
                .await
                .map_err(|_| EegError::DataSourceTimeout {
                    waited_ms: limit.as_millis() as u64,
                })?,
            None => self.source.get_block(samples).await,
        }
    }
}

fn skip_or_abort(cycle: usize, error: EegError) -> EegResult<CycleReport> {
    match error.scope() {
        ErrorScope::Cycle => {
            warn!(cycle, error = %error, "cycle skipped");
            Ok(CycleReport {
                cycle,
                timestamp: Utc::now(),
                outcome: CycleOutcome::Skipped {
                    reason: error.to_string(),
                },
                band_powers: None,
                processing_time_us: 0,
            })
        }
        ErrorScope::Session => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::LogPresentation;
    use eeg_core::{ChannelRange, SampleBlock};
    use eeg_simulation::{
        NoiseConfig, ScriptStep, ScriptedSource, SimulationConfig, StreamConfig, StreamingBoard,
    };
    use std::f64::consts::PI;

    const FS: f64 = 250.0;

    fn processing() -> ProcessingConfig {
        ProcessingConfig {
            channels: ChannelRange::new(0, 2),
            ..ProcessingConfig::cyton()
        }
    }

    fn session(cycles: usize) -> SessionConfig {
        SessionConfig {
            cycles,
            samples_per_cycle: 500,
            inter_cycle_delay_ms: 0,
            source_timeout_ms: Some(1000),
            ..SessionConfig::default()
        }
    }

    fn tone_block(dominant: f64, samples: usize) -> SampleBlock {
        let partner = if dominant < 13.0 { 20.0 } else { 10.0 };
        let row: Vec<f64> = (0..samples)
            .map(|i| {
                let t = i as f64 / FS;
                10.0 * (2.0 * PI * dominant * t).sin() + 0.5 * (2.0 * PI * partner * t).sin()
            })
            .collect();
        SampleBlock::new(vec![row.clone(), row], FS).unwrap()
    }

    fn alpha() -> SampleBlock {
        tone_block(10.0, 500)
    }

    fn beta() -> SampleBlock {
        tone_block(20.0, 500)
    }

    async fn run_script(
        source: ScriptedSource,
        config: SessionConfig,
    ) -> (SessionReport, usize) {
        run_script_with(source, config).await
    }

    async fn run_script_with<S: DataSource>(
        source: S,
        config: SessionConfig,
    ) -> (SessionReport, usize) {
        let presentation = LogPresentation::new();
        let cues = presentation.cue_counter();
        let report = SessionLoop::new(config, source, presentation, CancellationToken::new())
            .with_processing(processing())
            .run()
            .await
            .unwrap();
        (report, cues.count())
    }

    #[tokio::test]
    async fn test_cue_only_on_stressed_cycles() {
        let source = ScriptedSource::with_blocks(FS, vec![alpha(), beta(), alpha(), beta()]);
        let (report, cues) = run_script(source, session(4)).await;

        assert_eq!(report.end, SessionEnd::Completed);
        assert_eq!(report.cycles[0].outcome, CycleOutcome::BaselineCaptured);
        assert_eq!(report.cycles[1].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(report.cycles[2].outcome.label(), Some(StateLabel::Relaxed));
        assert_eq!(report.cycles[3].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(report.count_label(StateLabel::Stressed), 2);
        assert_eq!(cues, 2);
    }

    #[tokio::test]
    async fn test_short_block_skipped_and_baseline_deferred() {
        let source =
            ScriptedSource::with_blocks(FS, vec![tone_block(10.0, 100), alpha(), beta()]);
        let (report, cues) = run_script(source, session(3)).await;

        assert!(matches!(report.cycles[0].outcome, CycleOutcome::Skipped { .. }));
        assert!(report.cycles[0].band_powers.is_none());
        assert_eq!(report.cycles[1].outcome, CycleOutcome::BaselineCaptured);
        assert_eq!(report.cycles[2].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(cues, 1);

        let summary = report.summary();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.end, "completed");
    }

    #[tokio::test]
    async fn test_nan_block_skipped_and_baseline_deferred() {
        let mut rows = vec![vec![0.5; 500], vec![0.5; 500]];
        rows[0][3] = f64::NAN;
        rows[1][3] = f64::NAN;
        let rejected = SampleBlock::new(rows, FS).unwrap_err();

        let mut source = ScriptedSource::new(FS);
        source
            .push(ScriptStep::Fail(rejected))
            .push_block(alpha())
            .push_block(beta());
        let (report, cues) = run_script(source, session(3)).await;

        assert_eq!(report.end, SessionEnd::Completed);
        assert!(matches!(report.cycles[0].outcome, CycleOutcome::Skipped { .. }));
        assert!(report.cycles[0].band_powers.is_none());
        assert_eq!(report.cycles[1].outcome, CycleOutcome::BaselineCaptured);
        assert_eq!(report.cycles[2].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(cues, 1);
    }

    #[tokio::test]
    async fn test_pure_tones_alpha_then_beta() {
        let pure = |frequency: f64| {
            let row: Vec<f64> = (0..500)
                .map(|i| 10.0 * (2.0 * PI * frequency * i as f64 / FS).sin())
                .collect();
            SampleBlock::new(vec![row.clone(), row], FS).unwrap()
        };
        let source =
            ScriptedSource::with_blocks(FS, vec![pure(10.0), pure(20.0), pure(10.0)]);
        let (report, cues) = run_script(source, session(3)).await;

        assert_eq!(report.end, SessionEnd::Completed);
        assert_eq!(report.cycles[0].outcome, CycleOutcome::BaselineCaptured);
        assert_eq!(report.cycles[1].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(report.cycles[2].outcome.label(), Some(StateLabel::Relaxed));
        assert_eq!(cues, 1);
    }

    #[tokio::test]
    async fn test_request_beyond_board_buffer_aborts_session() {
        let board = StreamingBoard::start(StreamConfig {
            simulation: SimulationConfig {
                noise: NoiseConfig::none(),
                seed: Some(5),
                ..SimulationConfig::cyton()
            },
            chunk_samples: 25,
            buffer_capacity: 400,
        })
        .unwrap();

        let (report, cues) = run_script_with(board, session(120)).await;

        assert!(report.cycles.is_empty());
        assert!(matches!(
            report.end,
            SessionEnd::Aborted(EegError::SimulationError { .. })
        ));
        assert_eq!(cues, 0);
    }

    #[tokio::test]
    async fn test_flat_block_is_indeterminate() {
        let flat = SampleBlock::new(vec![vec![3.0; 500], vec![-1.0; 500]], FS).unwrap();
        let source = ScriptedSource::with_blocks(FS, vec![alpha(), flat, beta()]);
        let (report, cues) = run_script(source, session(3)).await;

        assert!(matches!(report.cycles[1].outcome, CycleOutcome::Indeterminate { .. }));
        assert_eq!(report.cycles[2].outcome.label(), Some(StateLabel::Stressed));
        assert_eq!(cues, 1);
    }

    #[tokio::test]
    async fn test_disconnect_aborts_session() {
        let source = ScriptedSource::with_blocks(FS, vec![alpha(), beta()]);
        let (report, cues) = run_script(source, session(5)).await;

        assert_eq!(report.cycles.len(), 2);
        assert!(report.is_aborted());
        assert!(matches!(
            report.end,
            SessionEnd::Aborted(EegError::DeviceDisconnected { .. })
        ));
        assert_eq!(cues, 1);
    }

    #[tokio::test]
    async fn test_source_timeout_aborts_session() {
        let mut source = ScriptedSource::new(FS);
        source
            .push_block(alpha())
            .push(ScriptStep::Stall(Duration::from_millis(500)))
            .push_block(beta());
        let config = SessionConfig {
            source_timeout_ms: Some(20),
            ..session(3)
        };

        let (report, _) = run_script(source, config).await;
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(
            report.end,
            SessionEnd::Aborted(EegError::DataSourceTimeout { waited_ms: 20 })
        );
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let source = ScriptedSource::with_blocks(FS, vec![alpha()]);

        let report = SessionLoop::new(session(3), source, LogPresentation::new(), cancel)
            .with_processing(processing())
            .run()
            .await
            .unwrap();

        assert_eq!(report.end, SessionEnd::Cancelled);
        assert!(report.cycles.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_delay() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::with_blocks(FS, vec![alpha(), beta(), beta()]);
        let config = SessionConfig {
            inter_cycle_delay_ms: 60_000,
            ..session(3)
        };
        let session = SessionLoop::new(config, source, LogPresentation::new(), cancel.clone())
            .with_processing(processing());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let report = tokio::time::timeout(Duration::from_secs(5), session.run())
            .await
            .expect("cancellation should interrupt the delay")
            .unwrap();
        canceller.await.unwrap();

        assert_eq!(report.end, SessionEnd::Cancelled);
        assert_eq!(report.cycles.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_receive_reports() {
        let source = ScriptedSource::with_blocks(FS, vec![alpha(), beta()]);
        let session = SessionLoop::new(session(2), source, LogPresentation::new(), CancellationToken::new())
            .with_processing(processing());
        let mut reports = session.subscribe();

        let report = session.run().await.unwrap();
        assert_eq!(report.cycles.len(), 2);

        let first = reports.recv().await.unwrap();
        let second = reports.recv().await.unwrap();
        assert_eq!(first.cycle, 0);
        assert_eq!(second.outcome.label(), Some(StateLabel::Stressed));
    }

    #[tokio::test]
    async fn test_sampling_rate_mismatch_is_setup_error() {
        let source = ScriptedSource::with_blocks(200.0, vec![alpha()]);
        let result = SessionLoop::new(session(1), source, LogPresentation::new(), CancellationToken::new())
            .with_processing(processing())
            .run()
            .await;

        assert!(matches!(result, Err(EegError::ConfigurationError { .. })));
    }

    #[test]
    fn test_session_config_validation() {
        assert!(SessionConfig::default().validate().is_ok());
        assert!(SessionConfig { cycles: 0, ..SessionConfig::default() }.validate().is_err());
        assert!(SessionConfig {
            source_timeout_ms: Some(0),
            ..SessionConfig::default()
        }
        .validate()
        .is_err());
    }
}
