use crate::prelude::{SpotError, SpotResult};
use serde::{Deserialize, Serialize};

/// Object location in source-camera pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
}

impl Location {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One frame's object-finder output for one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub camera: String,
    pub frame_index: u64,
    pub locations: Vec<Location>,
    pub count: usize,
}

impl DetectionResult {
    pub fn new(camera: impl Into<String>, frame_index: u64, locations: Vec<Location>) -> Self {
        let count = locations.len();
        Self {
            camera: camera.into(),
            frame_index,
            locations,
            count,
        }
    }

    /// Parses a single JSON-lines record and checks it.
    pub fn from_json(line: &str) -> SpotResult<Self> {
        let result: DetectionResult = serde_json::from_str(line)
            .map_err(|err| SpotError::Contract(format!("malformed detection record: {err}")))?;
        result.validate()?;
        Ok(result)
    }

    pub fn validate(&self) -> SpotResult<()> {
        if self.count != self.locations.len() {
            return Err(SpotError::Contract(format!(
                "frame {} reports {} spots but carries {} locations",
                self.frame_index,
                self.count,
                self.locations.len()
            )));
        }
        Ok(())
    }

    /// Channel index for names of the form `camera<N>`, N starting at 1.
    pub fn channel_index(&self) -> Option<usize> {
        camera_channel(&self.camera)
    }
}

pub fn camera_channel(name: &str) -> Option<usize> {
    let number: usize = name.strip_prefix("camera")?.parse().ok()?;
    number.checked_sub(1)
}

pub fn camera_name(channel: usize) -> String {
    format!("camera{}", channel + 1)
}
