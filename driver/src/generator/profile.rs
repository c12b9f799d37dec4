use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use spotcore::acquisition::detection::camera_name;
use spotcore::{DetectionResult, Location};
use std::collections::VecDeque;

/// Configuration for synthetic localization data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub frames: u64,
    pub cameras: usize,
    /// Mean number of spots per frame and camera.
    pub spots_per_frame: f32,
    /// Fixed emitter sites spots are scattered around.
    pub emitters: usize,
    /// Half-width of the scatter around an emitter, in source pixels.
    pub spread: f32,
    pub x_range: f32,
    pub y_range: f32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frames: 1000,
            cameras: 1,
            spots_per_frame: 20.0,
            emitters: 40,
            spread: 1.5,
            x_range: 256.0,
            y_range: 256.0,
            seed: 0,
        }
    }
}

/// Yields one result per camera for every frame, camera-interleaved.
pub struct SpotGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    emitters: Vec<Location>,
    next_frame: u64,
    pending: VecDeque<DetectionResult>,
}

impl SpotGenerator {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        ensure!(config.cameras >= 1, "generator needs at least one camera");
        ensure!(
            config.x_range > 0.0 && config.y_range > 0.0,
            "generator range {}x{} must be positive",
            config.x_range,
            config.y_range
        );
        ensure!(config.spots_per_frame >= 0.0, "spots per frame must not be negative");

        let mut rng = StdRng::seed_from_u64(config.seed);
        let emitters = (0..config.emitters.max(1))
            .map(|_| {
                Location::new(
                    rng.gen_range(0.0..config.x_range),
                    rng.gen_range(0.0..config.y_range),
                )
            })
            .collect();

        Ok(Self {
            config,
            rng,
            emitters,
            next_frame: 0,
            pending: VecDeque::new(),
        })
    }

    fn build_result(&mut self, camera: usize, frame_index: u64) -> DetectionResult {
        let upper = (self.config.spots_per_frame * 2.0).round() as usize;
        let spots = self.rng.gen_range(0..=upper);
        let spread = self.config.spread.max(0.0);
        let locations = (0..spots)
            .map(|_| {
                let site = self.emitters[self.rng.gen_range(0..self.emitters.len())];
                let dx = if spread > 0.0 {
                    self.rng.gen_range(-spread..spread)
                } else {
                    0.0
                };
                let dy = if spread > 0.0 {
                    self.rng.gen_range(-spread..spread)
                } else {
                    0.0
                };
                Location::new(
                    (site.x + dx).clamp(0.0, self.config.x_range),
                    (site.y + dy).clamp(0.0, self.config.y_range),
                )
            })
            .collect();
        DetectionResult::new(camera_name(camera), frame_index, locations)
    }
}

impl Iterator for SpotGenerator {
    type Item = DetectionResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() && self.next_frame < self.config.frames {
            let frame_index = self.next_frame;
            self.next_frame += 1;
            for camera in 0..self.config.cameras {
                let result = self.build_result(camera, frame_index);
                self.pending.push_back(result);
            }
        }
        self.pending.pop_front()
    }
}
