//! Headless presentation: logs the attention cue instead of playing media

use eeg_core::Presentation;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared view of how many cues a presentation has raised
#[derive(Debug, Clone, Default)]
pub struct CueCounter(Arc<AtomicUsize>);

impl CueCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Presentation that records each cue in the log
#[derive(Debug, Default)]
pub struct LogPresentation {
    cues: CueCounter,
}

impl LogPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that keeps counting after the presentation moves into a session
    pub fn cue_counter(&self) -> CueCounter {
        self.cues.clone()
    }
}

impl Presentation for LogPresentation {
    fn trigger_attention_cue(&mut self) {
        let total = self.cues.0.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(total_cues = total, "stress detected, attention cue raised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_counts_cues() {
        let mut presentation = LogPresentation::new();
        let counter = presentation.cue_counter();
        assert_eq!(counter.count(), 0);

        presentation.trigger_attention_cue();
        presentation.trigger_attention_cue();
        presentation.trigger_attention_cue();

        assert_eq!(counter.count(), 3);
        assert_eq!(LogPresentation::new().cue_counter().count(), 0);
    }
}
