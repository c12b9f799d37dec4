use anyhow::Context;
use serde::{Deserialize, Serialize};
use spotcore::acquisition::CameraGeometry;
use spotcore::prelude::{ColorCycle, Rgb};
use spotcore::DisplayConfig;
use std::fs;
use std::path::Path;

/// Everything needed to build and configure a coordinator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cameras: usize,
    pub display: DisplayConfig,
    pub colors: ColorCycle,
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading session config {}", path_ref.display()))?;
        let config: SessionConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing session config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Single white illumination, the same sensor geometry on every camera.
    pub fn from_args(cameras: usize, width: u32, height: u32, x_pixels: u32, y_pixels: u32) -> Self {
        Self {
            cameras,
            display: DisplayConfig {
                width,
                height,
                geometry: CameraGeometry::new(x_pixels, y_pixels),
                ..Default::default()
            },
            colors: ColorCycle::new(vec![Some(Rgb::WHITE)]).unwrap_or_else(|_| ColorCycle::dark()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_uses_shared_geometry() {
        let cfg = SessionConfig::from_args(2, 300, 200, 128, 64);
        assert_eq!(cfg.display.geometry_for(1).x_pixels, 128);
        assert_eq!(cfg.colors.period(), 1);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"cameras: 2
colors: [[255, 0, 0], null, [0, 0, 255]]
display:
  width: 256
  height: 256
  graph_width: 300
  graph_height: 100
  min_value: 0
  max_value: 200
  nm_per_pixel: 160
  scale_bar_len_nm: 1000
  geometry:
    x_pixels: 512
    y_pixels: 512
    x_bin: 2
    y_bin: 2
  overrides:
    - null
    - x_pixels: 256
      y_pixels: 256
      flip_horizontal: true
"#,
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();

        assert_eq!(cfg.cameras, 2);
        assert_eq!(cfg.colors.period(), 3);
        assert_eq!(cfg.colors.color_for(1), None);
        assert_eq!(cfg.display.geometry_for(0).x_range(), 256.0);
        assert!(cfg.display.geometry_for(1).flip_horizontal);
        assert_eq!(cfg.display.geometry_for(1).x_bin, 1);
    }

    #[test]
    fn empty_color_list_fails_to_load() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"cameras: 1
colors: []
display:
  width: 64
  height: 64
  graph_width: 64
  graph_height: 32
  min_value: 0
  max_value: 100
  nm_per_pixel: 160
  scale_bar_len_nm: 1000
  geometry:
    x_pixels: 32
    y_pixels: 32
"#,
        )
        .unwrap();
        let path = temp.into_temp_path();
        let err = SessionConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("color cycle must not be empty"));
    }

    #[test]
    fn bundled_dual_camera_session_is_valid() {
        let cfg: SessionConfig =
            serde_yaml::from_str(include_str!("../../sessions/dual_camera.yaml")).unwrap();
        assert_eq!(cfg.cameras, 2);
        assert!(cfg.display.validate(cfg.cameras).is_ok());
        assert!(cfg.display.geometry_for(1).flip_horizontal);
    }
}
