//! Accumulation and visualization core for the real-time spot counter.
//!
//! Per-frame detection results are folded into a running count, a rolling
//! series window and a persistent density image for each camera channel,
//! under an Idle/Filming state machine that decides what is accumulated and
//! when the density images are written out.

pub mod acquisition;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod render;
pub mod telemetry;

pub use acquisition::{DetectionResult, DisplayConfig, Location};
pub use pipeline::{PipelineCoordinator, PipelineEvent, SessionState};
pub use prelude::{ColorCycle, Rgb, SpotError, SpotResult};
