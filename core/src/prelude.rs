use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum number of slots the rolling window spans.
pub const MIN_WINDOW_SLOTS: usize = 100;

/// Plain 8-bit RGB triple as listed in the shutter sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Rgb(value[0], value[1], value[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.0, value.1, value.2]
    }
}

/// Repeating per-frame color sequence. A `None` slot suppresses drawing for
/// every frame that maps onto it (shutter closed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<Rgb>>", into = "Vec<Option<Rgb>>")]
pub struct ColorCycle {
    slots: Vec<Option<Rgb>>,
}

impl ColorCycle {
    pub fn new(slots: Vec<Option<Rgb>>) -> SpotResult<Self> {
        if slots.is_empty() {
            return Err(SpotError::Config("color cycle must not be empty".into()));
        }
        Ok(Self { slots })
    }

    /// Single-slot cycle that never draws.
    pub fn dark() -> Self {
        Self { slots: vec![None] }
    }

    pub fn period(&self) -> usize {
        self.slots.len()
    }

    pub fn color_for(&self, frame_index: u64) -> Option<Rgb> {
        self.slots[(frame_index % self.slots.len() as u64) as usize]
    }

    /// Smallest multiple of the period that is at least [`MIN_WINDOW_SLOTS`].
    pub fn window_slots(&self) -> usize {
        let period = self.period();
        MIN_WINDOW_SLOTS.div_ceil(period).max(1) * period
    }

    pub fn slots(&self) -> &[Option<Rgb>] {
        &self.slots
    }
}

impl TryFrom<Vec<Option<Rgb>>> for ColorCycle {
    type Error = SpotError;

    fn try_from(value: Vec<Option<Rgb>>) -> Result<Self, Self::Error> {
        ColorCycle::new(value)
    }
}

impl From<ColorCycle> for Vec<Option<Rgb>> {
    fn from(value: ColorCycle) -> Self {
        value.slots
    }
}

/// Common error type for the accumulation engine.
#[derive(thiserror::Error, Debug)]
pub enum SpotError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("contract violation: {0}")]
    Contract(String),
    #[error("unknown camera: {0}")]
    UnknownCamera(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type SpotResult<T> = Result<T, SpotError>;
