//! Queue-backed data source replaying prepared blocks in order

use crate::eeg_simulator::EegSimulator;
use async_trait::async_trait;
use eeg_core::{DataSource, EegError, EegResult, SampleBlock};
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted response to a `get_block` call
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Hand out this block (trimmed to the requested length)
    Block(SampleBlock),
    /// Fail the call with this error
    Fail(EegError),
    /// Hang for the given time before moving on to the next step
    Stall(Duration),
}

/// Deterministic [`DataSource`] for tests and offline replays
///
/// Once the script is exhausted every call fails with `DeviceDisconnected`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    sampling_rate: f64,
    steps: VecDeque<ScriptStep>,
    calls: usize,
}

impl ScriptedSource {
    pub fn new(sampling_rate: f64) -> Self {
        Self {
            sampling_rate,
            steps: VecDeque::new(),
            calls: 0,
        }
    }

    pub fn with_blocks(sampling_rate: f64, blocks: impl IntoIterator<Item = SampleBlock>) -> Self {
        let mut source = Self::new(sampling_rate);
        source.steps.extend(blocks.into_iter().map(ScriptStep::Block));
        source
    }

    /// Pre-render `count` consecutive blocks of `samples` from a simulator
    pub fn from_simulator(
        simulator: &mut EegSimulator,
        count: usize,
        samples: usize,
    ) -> EegResult<Self> {
        let blocks = (0..count)
            .map(|_| simulator.generate(samples))
            .collect::<EegResult<Vec<_>>>()?;
        Ok(Self::with_blocks(simulator.config().sampling_rate, blocks))
    }

    pub fn push(&mut self, step: ScriptStep) -> &mut Self {
        self.steps.push_back(step);
        self
    }

    pub fn push_block(&mut self, block: SampleBlock) -> &mut Self {
        self.push(ScriptStep::Block(block))
    }

    /// Steps not consumed yet
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Number of `get_block` calls served so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn get_block(&mut self, num_samples: usize) -> EegResult<SampleBlock> {
        self.calls += 1;

        loop {
            match self.steps.pop_front() {
                Some(ScriptStep::Block(block)) => return Ok(block.tail(num_samples)),
                Some(ScriptStep::Fail(error)) => return Err(error),
                Some(ScriptStep::Stall(duration)) => tokio::time::sleep(duration).await,
                None => {
                    return Err(EegError::DeviceDisconnected {
                        reason: "scripted source exhausted".to_string(),
                    })
                }
            }
        }
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeg_simulator::SimulationConfig;

    fn block(samples: usize) -> SampleBlock {
        SampleBlock::new(vec![(0..samples).map(|i| i as f64).collect()], 250.0).unwrap()
    }

    #[tokio::test]
    async fn test_replays_in_order_then_disconnects() {
        let mut source = ScriptedSource::with_blocks(250.0, vec![block(10), block(20)]);

        assert_eq!(source.get_block(10).await.unwrap().samples_per_channel(), 10);
        assert_eq!(source.get_block(20).await.unwrap().samples_per_channel(), 20);
        assert!(matches!(
            source.get_block(10).await,
            Err(EegError::DeviceDisconnected { .. })
        ));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_returns_most_recent_samples() {
        let mut source = ScriptedSource::with_blocks(250.0, vec![block(10)]);
        let latest = source.get_block(4).await.unwrap();
        assert_eq!(latest.channel_data(0).unwrap(), &[6.0, 7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_short_block_is_not_padded() {
        let mut source = ScriptedSource::with_blocks(250.0, vec![block(100)]);
        assert_eq!(source.get_block(1000).await.unwrap().samples_per_channel(), 100);
    }

    #[tokio::test]
    async fn test_scripted_failure_and_stall() {
        let mut source = ScriptedSource::new(250.0);
        source
            .push(ScriptStep::Fail(EegError::DeviceDisconnected {
                reason: "unplugged".into(),
            }))
            .push(ScriptStep::Stall(Duration::from_millis(5)))
            .push_block(block(8));

        assert!(source.get_block(8).await.is_err());
        assert_eq!(source.get_block(8).await.unwrap().samples_per_channel(), 8);
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_from_simulator() {
        let mut simulator = EegSimulator::new(SimulationConfig {
            seed: Some(1),
            ..SimulationConfig::cyton()
        })
        .unwrap();
        let mut source = ScriptedSource::from_simulator(&mut simulator, 3, 500).unwrap();

        assert_eq!(source.remaining(), 3);
        assert_eq!(source.sampling_rate(), 250.0);
        assert_eq!(source.get_block(500).await.unwrap().channel_count(), 9);
        assert!((simulator.elapsed() - 6.0).abs() < 1e-12);
    }
}
