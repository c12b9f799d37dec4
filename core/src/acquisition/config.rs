use crate::prelude::{SpotError, SpotResult};
use serde::{Deserialize, Serialize};

/// Sensor extents and orientation of one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraGeometry {
    pub x_pixels: u32,
    pub y_pixels: u32,
    #[serde(default = "unit_bin")]
    pub x_bin: u32,
    #[serde(default = "unit_bin")]
    pub y_bin: u32,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
}

fn unit_bin() -> u32 {
    1
}

impl CameraGeometry {
    pub fn new(x_pixels: u32, y_pixels: u32) -> Self {
        Self {
            x_pixels,
            y_pixels,
            x_bin: 1,
            y_bin: 1,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }

    /// Largest x coordinate a detection can report (binned pixels).
    pub fn x_range(&self) -> f32 {
        self.x_pixels as f32 / self.x_bin as f32
    }

    pub fn y_range(&self) -> f32 {
        self.y_pixels as f32 / self.y_bin as f32
    }

    fn validate(&self, label: &str) -> SpotResult<()> {
        if self.x_bin == 0 || self.y_bin == 0 {
            return Err(SpotError::Config(format!("{label}: binning must be at least 1")));
        }
        if self.x_pixels == 0 || self.y_pixels == 0 {
            return Err(SpotError::Config(format!("{label}: axis range must be positive")));
        }
        Ok(())
    }
}

/// Display parameters shared by every channel.
///
/// `geometry` is the default camera geometry. `overrides[i]`, when present
/// and not null, replaces it for channel `i`. Every other field is shared.
/// `width`/`height` size the density raster and `graph_width`/`graph_height`
/// the series plot; both are fixed once the channels exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub graph_width: u32,
    pub graph_height: u32,
    pub min_value: f64,
    pub max_value: f64,
    pub nm_per_pixel: f64,
    pub scale_bar_len_nm: f64,
    pub geometry: CameraGeometry,
    #[serde(default)]
    pub overrides: Vec<Option<CameraGeometry>>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            graph_width: 400,
            graph_height: 150,
            min_value: 0.0,
            max_value: 500.0,
            nm_per_pixel: 160.0,
            scale_bar_len_nm: 1000.0,
            geometry: CameraGeometry::new(256, 256),
            overrides: Vec::new(),
        }
    }
}

impl DisplayConfig {
    pub fn geometry_for(&self, channel: usize) -> &CameraGeometry {
        self.overrides
            .get(channel)
            .and_then(Option::as_ref)
            .unwrap_or(&self.geometry)
    }

    /// Scale bar length in canvas pixels for a canvas `canvas_width` wide.
    pub fn scale_bar_px(&self, channel: usize, canvas_width: u32) -> f64 {
        let geometry = self.geometry_for(channel);
        (self.scale_bar_len_nm / self.nm_per_pixel) * (canvas_width as f64 / geometry.x_range() as f64)
    }

    /// Checks every field a reconfiguration depends on for `channels` channels.
    pub fn validate(&self, channels: usize) -> SpotResult<()> {
        if !(self.max_value > self.min_value) {
            return Err(SpotError::Config(format!(
                "value range [{}, {}] is empty",
                self.min_value, self.max_value
            )));
        }
        if !(self.nm_per_pixel > 0.0) {
            return Err(SpotError::Config("nm_per_pixel must be positive".into()));
        }
        if self.width == 0 || self.height == 0 || self.graph_width == 0 || self.graph_height == 0 {
            return Err(SpotError::Config("display surfaces must be non-empty".into()));
        }
        for channel in 0..channels {
            self.geometry_for(channel)
                .validate(&format!("camera{}", channel + 1))?;
        }
        Ok(())
    }
}
