//! DC offset removal on the selected electrode rows

use eeg_core::{ChannelRange, EegError, EegResult, SampleBlock};

/// Electrode rows with their per-channel mean removed
#[derive(Debug, Clone)]
pub struct CleanedBlock {
    sampling_rate: f64,
    channel_range: ChannelRange,
    channels: Vec<Vec<f64>>,
}

impl CleanedBlock {
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Board rows this block was cut from
    pub fn channel_range(&self) -> ChannelRange {
        self.channel_range
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }
}

/// Restricts a raw block to the electrode rows and removes each row's mean
#[derive(Debug, Clone)]
pub struct Preprocessor {
    channel_range: ChannelRange,
}

impl Preprocessor {
    pub fn new(channel_range: ChannelRange) -> Self {
        Self { channel_range }
    }

    pub fn channel_range(&self) -> ChannelRange {
        self.channel_range
    }

    pub fn clean(&self, raw: &SampleBlock) -> EegResult<CleanedBlock> {
        let rows = raw.select(self.channel_range)?;

        let samples = raw.samples_per_channel();
        if samples == 0 {
            return Err(EegError::InsufficientSamples {
                required: 1,
                actual: 0,
            });
        }

        let channels = rows
            .iter()
            .map(|row| {
                let mean = row.iter().sum::<f64>() / samples as f64;
                row.iter().map(|x| x - mean).collect()
            })
            .collect();

        Ok(CleanedBlock {
            sampling_rate: raw.sampling_rate(),
            channel_range: self.channel_range,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_block() -> SampleBlock {
        // Row 0 mimics the packet counter and is never selected
        let counter: Vec<f64> = (0..250).map(|i| (i % 256) as f64).collect();
        let rows = (1..4)
            .map(|c| {
                (0..250)
                    .map(|i| {
                        let t = i as f64 / 250.0;
                        1000.0 * c as f64 + 25.0 * (2.0 * std::f64::consts::PI * 7.0 * t).sin()
                            + (i as f64 * 0.37).cos()
                    })
                    .collect()
            })
            .collect::<Vec<Vec<f64>>>();

        let mut all = vec![counter];
        all.extend(rows);
        SampleBlock::new(all, 250.0).unwrap()
    }

    #[test]
    fn test_channel_means_removed() {
        let cleaned = Preprocessor::new(ChannelRange::new(1, 4))
            .clean(&offset_block())
            .unwrap();

        assert_eq!(cleaned.channel_count(), 3);
        assert_eq!(cleaned.samples_per_channel(), 250);
        for channel in cleaned.channels() {
            let mean = channel.iter().sum::<f64>() / channel.len() as f64;
            assert!(mean.abs() < 1e-9, "residual mean {}", mean);
        }
    }

    #[test]
    fn test_single_sample_yields_zero() {
        let block = SampleBlock::new(vec![vec![0.0], vec![42.0]], 250.0).unwrap();
        let cleaned = Preprocessor::new(ChannelRange::new(1, 2)).clean(&block).unwrap();

        assert_eq!(cleaned.channels()[0], vec![0.0]);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let block = SampleBlock::new(vec![Vec::new(), Vec::new()], 250.0).unwrap();
        let result = Preprocessor::new(ChannelRange::new(0, 2)).clean(&block);

        assert_eq!(
            result.unwrap_err(),
            EegError::InsufficientSamples {
                required: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn test_range_outside_block() {
        let result = Preprocessor::new(ChannelRange::cyton()).clean(&offset_block());
        assert!(matches!(result, Err(EegError::InvalidChannelRange { .. })));
    }
}
