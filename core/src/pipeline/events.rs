use log::{debug, warn};
use std::collections::VecDeque;
use std::path::PathBuf;

/// Notifications for display adapters. Drained, never pushed to them.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Completion signal, emitted once per delivered result.
    FrameProcessed { camera: String, frame_index: u64 },
    FrameDropped { camera: String, reason: String },
    CountChanged { channel: usize, total: u64 },
    FilmingStarted { output_paths: Vec<PathBuf> },
    FilmingStopped { exported: Vec<PathBuf> },
    Reconfigured { slot_count: usize },
    RangeChanged { min_value: f64, max_value: f64 },
}

/// Bounded queue that drops its oldest event when full. One warning is
/// logged per overflow episode; `drain` ends the episode.
pub struct EventQueue {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
    dropped: usize,
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            if self.dropped == 0 {
                warn!(
                    "event queue full ({} events), dropping oldest until drained",
                    self.max_pending
                );
            }
            self.dropped += 1;
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        if self.dropped > 0 {
            debug!("{} events were dropped before this drain", self.dropped);
            self.dropped = 0;
        }
        self.events.drain(..).collect()
    }

    /// Events dropped since the last drain.
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}
