pub mod config;
pub mod detection;

pub use config::{CameraGeometry, DisplayConfig};
pub use detection::{DetectionResult, Location};
