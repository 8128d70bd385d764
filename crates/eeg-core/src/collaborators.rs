//! Seams between the processing core and the outside world

use crate::error::EegResult;
use crate::sample_block::SampleBlock;
use async_trait::async_trait;

/// Anything that can hand out the most recent samples of an EEG board
#[async_trait]
pub trait DataSource: Send {
    /// Return the latest `num_samples` samples across all board rows.
    ///
    /// May wait until enough samples are buffered. Fails with
    /// `DeviceDisconnected` once the device is gone.
    async fn get_block(&mut self, num_samples: usize) -> EegResult<SampleBlock>;

    /// Sampling frequency of the delivered blocks in Hz
    fn sampling_rate(&self) -> f64;

    /// Human readable source name for logs
    fn name(&self) -> &str {
        "data-source"
    }
}

/// Receiver of the attention cue raised on a stressed classification
pub trait Presentation: Send {
    /// Fire-and-forget; called once per stressed cycle
    fn trigger_attention_cue(&mut self);
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for Box<S> {
    async fn get_block(&mut self, num_samples: usize) -> EegResult<SampleBlock> {
        (**self).get_block(num_samples).await
    }

    fn sampling_rate(&self) -> f64 {
        (**self).sampling_rate()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: Presentation + ?Sized> Presentation for Box<P> {
    fn trigger_attention_cue(&mut self) {
        (**self).trigger_attention_cue()
    }
}
