//! Real-time simulated board streaming into a bounded ring buffer
//!
//! A producer task generates a chunk on every tick and appends it to a ring
//! buffer shared with a [`StreamingBoard`] handle. The handle implements
//! [`DataSource`] by waiting until enough samples are buffered and then
//! copying out the most recent ones.

use crate::eeg_simulator::{EegSimulator, SimulationConfig};
use crate::signal_patterns::Scenario;
use async_trait::async_trait;
use eeg_core::{DataSource, EegError, EegResult, SampleBlock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// Configuration for real-time streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Board simulation configuration
    pub simulation: SimulationConfig,
    /// Samples generated per tick
    pub chunk_samples: usize,
    /// Ring buffer capacity in samples per row
    pub buffer_capacity: usize,
}

impl StreamConfig {
    /// Tick period that keeps the stream at the nominal sampling rate
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(self.chunk_samples as f64 / self.simulation.sampling_rate)
    }

    pub fn validate(&self) -> EegResult<()> {
        self.simulation.validate()?;
        if self.chunk_samples == 0 {
            return Err(EegError::SimulationError {
                message: "chunk size must be at least one sample".to_string(),
            });
        }
        if self.buffer_capacity < self.chunk_samples {
            return Err(EegError::SimulationError {
                message: format!(
                    "buffer capacity {} is smaller than one chunk of {}",
                    self.buffer_capacity, self.chunk_samples
                ),
            });
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            chunk_samples: 25,     // 100ms chunks at 250 Hz
            buffer_capacity: 45_000, // 3 minutes at 250 Hz
        }
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Pause,
    Resume,
    SetScenario(Scenario),
    Stop,
}

/// Stream statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamStats {
    pub chunks_generated: u64,
    pub samples_buffered: usize,
    pub is_paused: bool,
    pub is_connected: bool,
}

/// Per-row FIFO keeping only the newest `capacity` samples
#[derive(Debug)]
struct RingBuffer {
    rows: Vec<VecDeque<f64>>,
    capacity: usize,
    chunks_received: u64,
    paused: bool,
    connected: bool,
}

impl RingBuffer {
    fn new(rows: usize, capacity: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| VecDeque::with_capacity(capacity)).collect(),
            capacity,
            chunks_received: 0,
            paused: false,
            connected: true,
        }
    }

    fn len(&self) -> usize {
        self.rows.first().map(VecDeque::len).unwrap_or(0)
    }

    fn append(&mut self, block: &SampleBlock) {
        for (row, samples) in self.rows.iter_mut().zip(block.channels()) {
            row.extend(samples.iter().copied());
            let excess = row.len().saturating_sub(self.capacity);
            row.drain(..excess);
        }
        self.chunks_received += 1;
    }

    fn latest(&self, num_samples: usize) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| row.iter().skip(row.len() - num_samples).copied().collect())
            .collect()
    }
}

#[derive(Debug)]
struct SharedBuffer {
    ring: Mutex<RingBuffer>,
    notify: Notify,
}

/// Consumer handle of a simulated streaming board
pub struct StreamingBoard {
    shared: Arc<SharedBuffer>,
    control: mpsc::Sender<StreamCommand>,
    producer: JoinHandle<()>,
    sampling_rate: f64,
    capacity: usize,
}

impl StreamingBoard {
    /// Spawn the producer task and return the consumer handle
    pub fn start(config: StreamConfig) -> EegResult<Self> {
        config.validate()?;

        let simulator = EegSimulator::new(config.simulation.clone())?;
        let shared = Arc::new(SharedBuffer {
            ring: Mutex::new(RingBuffer::new(
                config.simulation.row_count(),
                config.buffer_capacity,
            )),
            notify: Notify::new(),
        });
        let (control, commands) = mpsc::channel(32);

        tracing::info!(
            sampling_rate = config.simulation.sampling_rate,
            rows = config.simulation.row_count(),
            chunk_samples = config.chunk_samples,
            scenario = %config.simulation.scenario.name,
            "simulated board streaming"
        );

        let producer = tokio::spawn(run_producer(
            simulator,
            config.clone(),
            Arc::clone(&shared),
            commands,
        ));

        Ok(StreamingBoard {
            shared,
            control,
            producer,
            sampling_rate: config.simulation.sampling_rate,
            capacity: config.buffer_capacity,
        })
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control.clone()
    }

    /// Stop streaming; later reads fail with `DeviceDisconnected`
    pub async fn stop(&self) {
        // A closed channel means the producer is already gone
        let _ = self.control.send(StreamCommand::Stop).await;
    }

    pub async fn stats(&self) -> StreamStats {
        let ring = self.shared.ring.lock().await;
        StreamStats {
            chunks_generated: ring.chunks_received,
            samples_buffered: ring.len(),
            is_paused: ring.paused,
            is_connected: ring.connected,
        }
    }
}

impl Drop for StreamingBoard {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

#[async_trait]
impl DataSource for StreamingBoard {
    async fn get_block(&mut self, num_samples: usize) -> EegResult<SampleBlock> {
        if num_samples > self.capacity {
            return Err(EegError::SimulationError {
                message: format!(
                    "requested {} samples but the board buffers only {}",
                    num_samples, self.capacity
                ),
            });
        }

        loop {
            // Registered before the check so a push in between is not missed
            let notified = self.shared.notify.notified();
            {
                let ring = self.shared.ring.lock().await;
                if !ring.connected {
                    return Err(EegError::DeviceDisconnected {
                        reason: "simulated board stopped".to_string(),
                    });
                }
                if ring.len() >= num_samples {
                    return SampleBlock::new(ring.latest(num_samples), self.sampling_rate);
                }
            }
            notified.await;
        }
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn name(&self) -> &str {
        "simulated-board"
    }
}

async fn run_producer(
    mut simulator: EegSimulator,
    config: StreamConfig,
    shared: Arc<SharedBuffer>,
    mut commands: mpsc::Receiver<StreamCommand>,
) {
    let chunk_budget = config.tick_period();
    let mut ticker = interval(chunk_budget);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if shared.ring.lock().await.paused {
                    continue;
                }

                let start_time = Instant::now();
                let chunk = match simulator.generate(config.chunk_samples) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::error!(error = %e, "chunk generation failed, stopping board");
                        break;
                    }
                };
                let generation_time = start_time.elapsed();

                shared.ring.lock().await.append(&chunk);
                shared.notify.notify_waiters();

                if generation_time > chunk_budget {
                    tracing::warn!(
                        elapsed_ms = generation_time.as_millis() as u64,
                        budget_ms = chunk_budget.as_millis() as u64,
                        "chunk generation slower than real time"
                    );
                }
            }

            command = commands.recv() => {
                match command {
                    Some(StreamCommand::Pause) => {
                        shared.ring.lock().await.paused = true;
                        tracing::info!("simulated board paused");
                    }
                    Some(StreamCommand::Resume) => {
                        shared.ring.lock().await.paused = false;
                        tracing::info!("simulated board resumed");
                    }
                    Some(StreamCommand::SetScenario(scenario)) => {
                        let name = scenario.name.clone();
                        match simulator.set_scenario(scenario) {
                            Ok(()) => tracing::info!(scenario = %name, "scenario updated"),
                            Err(e) => tracing::warn!(error = %e, "scenario rejected"),
                        }
                    }
                    Some(StreamCommand::Stop) | None => break,
                }
            }
        }
    }

    shared.ring.lock().await.connected = false;
    shared.notify.notify_waiters();
    tracing::info!("simulated board stopped");
}
