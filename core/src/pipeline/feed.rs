//! Backpressured hand-off between a detection producer and the coordinator.
//!
//! The producer side holds a single in-flight permit. It is spent on every
//! delivery and only returned once the coordinator has finished the frame,
//! so at most one result is ever waiting or being processed.

use crate::acquisition::DetectionResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Upstream producer of detection results, pulled one at a time.
pub trait DetectionSource {
    /// Next result, or `None` once the producer is finished or halted.
    fn next_result(&mut self) -> Option<DetectionResult>;
    /// Completion signal for the result last returned by `next_result`.
    fn frame_processed(&mut self) {}
    /// Stops the producer. Later calls to `next_result` return `None`.
    fn halt(&mut self);
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("detection feed closed")]
pub struct FeedClosed;

enum Delivery {
    Result(DetectionResult),
    Wake,
}

/// Creates a connected producer/consumer pair.
pub fn channel() -> (FeedSender, FeedSource) {
    let (results_tx, results_rx) = mpsc::channel(1);
    let halt = FeedHalt {
        halted: Arc::new(AtomicBool::new(false)),
        in_flight: Arc::new(Semaphore::new(1)),
        wake: results_tx.downgrade(),
    };
    (
        FeedSender {
            results: results_tx,
            in_flight: halt.in_flight.clone(),
        },
        FeedSource {
            results: results_rx,
            halt,
            pending: false,
        },
    )
}

#[derive(Clone)]
pub struct FeedSender {
    results: mpsc::Sender<Delivery>,
    in_flight: Arc<Semaphore>,
}

impl FeedSender {
    /// Waits until the previous result has been processed, then hands this one over.
    pub async fn deliver(&self, result: DetectionResult) -> Result<(), FeedClosed> {
        let permit = self.in_flight.acquire().await.map_err(|_| FeedClosed)?;
        permit.forget();
        self.results
            .send(Delivery::Result(result))
            .await
            .map_err(|_| FeedClosed)
    }

    pub fn can_deliver(&self) -> bool {
        self.in_flight.available_permits() > 0
    }

    pub fn is_closed(&self) -> bool {
        self.in_flight.is_closed() || self.results.is_closed()
    }
}

/// Stops a feed from any thread, without access to the consumer.
///
/// A consumer blocked in `next_result` wakes up and sees the end of the
/// stream; a producer waiting for its permit fails with [`FeedClosed`].
#[derive(Clone)]
pub struct FeedHalt {
    halted: Arc<AtomicBool>,
    in_flight: Arc<Semaphore>,
    wake: mpsc::WeakSender<Delivery>,
}

impl FeedHalt {
    pub fn halt(&self) {
        if self.halted.swap(true, Ordering::AcqRel) {
            return;
        }
        self.in_flight.close();
        // A full slot means the consumer is not parked and will see the flag.
        if let Some(results) = self.wake.upgrade() {
            let _ = results.try_send(Delivery::Wake);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}

/// Consumer end. `next_result` blocks the calling thread and must not be
/// called from inside an async runtime.
pub struct FeedSource {
    results: mpsc::Receiver<Delivery>,
    halt: FeedHalt,
    pending: bool,
}

impl FeedSource {
    pub fn halt_handle(&self) -> FeedHalt {
        self.halt.clone()
    }
}

impl DetectionSource for FeedSource {
    fn next_result(&mut self) -> Option<DetectionResult> {
        self.pending = false;
        if self.halt.is_halted() {
            return None;
        }
        match self.results.blocking_recv() {
            Some(Delivery::Result(result)) => {
                self.pending = true;
                Some(result)
            }
            Some(Delivery::Wake) | None => None,
        }
    }

    fn frame_processed(&mut self) {
        if std::mem::take(&mut self.pending) {
            self.halt.in_flight.add_permits(1);
        }
    }

    fn halt(&mut self) {
        self.halt.halt();
        self.results.close();
    }
}

// A dropped consumer must not leave the producer parked on the permit.
impl Drop for FeedSource {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Source over an in-memory sequence, used for replays.
pub struct IterSource<I> {
    inner: Option<I>,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = DetectionResult>,
{
    pub fn new(inner: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: Some(inner.into_iter()),
        }
    }
}

impl<I> DetectionSource for IterSource<I>
where
    I: Iterator<Item = DetectionResult>,
{
    fn next_result(&mut self) -> Option<DetectionResult> {
        self.inner.as_mut()?.next()
    }

    fn halt(&mut self) {
        self.inner = None;
    }
}
