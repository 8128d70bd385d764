//! SampleBlock: raw multi-channel sample matrix handed over by a data source

use crate::eeg_types::ChannelRange;
use crate::error::{EegError, EegResult};
use uuid::Uuid;

/// Channels x samples matrix of raw board data
///
/// Rows follow the board layout, so a Cyton block carries the packet
/// counter in row 0 and the eight electrodes in rows 1..9.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    /// Unique identifier for this block
    pub id: Uuid,
    /// Sampling frequency in Hz
    sampling_rate: f64,
    /// Sample rows, one per channel
    channels: Vec<Vec<f64>>,
    /// Creation timestamp (ms since epoch)
    pub created_at: u64,
}

impl SampleBlock {
    /// Create a new block, validating shape and sampling rate
    pub fn new(channels: Vec<Vec<f64>>, sampling_rate: f64) -> EegResult<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(EegError::InvalidSignalData {
                reason: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }

        if channels.is_empty() {
            return Err(EegError::InvalidSignalData {
                reason: "block has no channels".to_string(),
            });
        }

        let expected = channels[0].len();
        if let Some((index, row)) = channels
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(EegError::InvalidSignalData {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    index,
                    row.len(),
                    expected
                ),
            });
        }

        for (index, row) in channels.iter().enumerate() {
            if let Some(sample) = row.iter().position(|x| !x.is_finite()) {
                return Err(EegError::InvalidSignalData {
                    reason: format!(
                        "channel {} sample {} is not finite ({})",
                        index, sample, row[sample]
                    ),
                });
            }
        }

        Ok(SampleBlock {
            id: Uuid::new_v4(),
            sampling_rate,
            channels,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        })
    }

    /// Sampling frequency in Hz
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of rows
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Block duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples_per_channel() as f64 / self.sampling_rate
    }

    /// Data for a specific channel
    pub fn channel_data(&self, channel_index: usize) -> EegResult<&[f64]> {
        self.channels
            .get(channel_index)
            .map(Vec::as_slice)
            .ok_or(EegError::InvalidChannelRange {
                start: channel_index,
                end: channel_index + 1,
                available: self.channels.len(),
            })
    }

    /// All rows
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Rows selected by `range`
    pub fn select(&self, range: ChannelRange) -> EegResult<&[Vec<f64>]> {
        if range.is_empty() || range.end > self.channels.len() {
            return Err(EegError::InvalidChannelRange {
                start: range.start,
                end: range.end,
                available: self.channels.len(),
            });
        }
        Ok(&self.channels[range.start..range.end])
    }

    /// Keep only the most recent `num_samples` samples of every row
    pub fn tail(&self, num_samples: usize) -> SampleBlock {
        let channels = self
            .channels
            .iter()
            .map(|row| row[row.len().saturating_sub(num_samples)..].to_vec())
            .collect();

        SampleBlock {
            id: Uuid::new_v4(),
            sampling_rate: self.sampling_rate,
            channels,
            created_at: self.created_at,
        }
    }
}
