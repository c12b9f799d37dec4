use crate::generator::profile::{GeneratorConfig, SpotGenerator};
use crate::workflow::config::SessionConfig;
use anyhow::Context;
use log::{info, warn};
use serde::Serialize;
use spotcore::pipeline::feed::{self, DetectionSource, IterSource};
use spotcore::render::{RgbaRaster, Surface};
use spotcore::telemetry::Metrics;
use spotcore::{DetectionResult, PipelineCoordinator};
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Root name handed to `start`; density images are written on stop.
    pub output: Option<String>,
    /// Frames delivered before filming starts. They only reach the series.
    pub idle_frames: u64,
    /// Where to render camera 1's rolling series after the run.
    pub graph_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub frames: usize,
    pub totals: Vec<u64>,
    pub exported: Vec<PathBuf>,
    pub graph: Option<PathBuf>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    session: SessionConfig,
}

impl Runner {
    pub fn new(session: SessionConfig) -> Self {
        Self { session }
    }

    pub fn build_coordinator(&self) -> anyhow::Result<PipelineCoordinator> {
        let mut coordinator =
            PipelineCoordinator::new(self.session.cameras, self.session.display.clone())
                .context("creating coordinator")?;
        coordinator
            .reconfigure(self.session.display.clone(), self.session.colors.clone())
            .context("applying session display parameters")?;
        for channel in 0..self.session.cameras {
            coordinator
                .subscribe_counts(
                    channel,
                    Box::new(move |total| log::trace!("camera{} total {}", channel + 1, total)),
                )
                .context("subscribing to counts")?;
        }
        Ok(coordinator)
    }

    /// Matches generator extents and camera count to the session.
    pub fn generator_config(&self, frames: u64, spots_per_frame: f32, seed: u64) -> GeneratorConfig {
        let geometry = &self.session.display.geometry;
        GeneratorConfig {
            frames,
            cameras: self.session.cameras,
            spots_per_frame,
            x_range: geometry.x_range(),
            y_range: geometry.y_range(),
            seed,
            ..Default::default()
        }
    }

    /// Streams synthetic detections through the backpressured feed.
    /// Ctrl+C ends the stream early; the run still stops and exports.
    pub fn execute_generated(
        &self,
        generator: GeneratorConfig,
        options: &RunOptions,
    ) -> anyhow::Result<WorkflowResult> {
        let expected = generator.frames;
        let spots = SpotGenerator::new(generator).context("building spot generator")?;
        let runtime = TokioBuilder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("creating runtime for detection producer")?;

        let (sender, source) = feed::channel();
        let halt = source.halt_handle();
        let producer = runtime.spawn(async move {
            let interrupt = signal::ctrl_c();
            tokio::pin!(interrupt);
            for result in spots {
                tokio::select! {
                    _ = &mut interrupt => {
                        warn!("interrupted, ending detection stream");
                        halt.halt();
                        break;
                    }
                    delivered = sender.deliver(result) => {
                        if delivered.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        info!("streaming {} synthetic frames", expected);
        let result = self.drive(Box::new(source), options);
        if let Err(err) = runtime.block_on(producer) {
            warn!("detection producer ended abnormally: {err}");
        }
        result
    }

    /// Replays recorded detections in file order.
    pub fn execute_replay(
        &self,
        results: Vec<DetectionResult>,
        options: &RunOptions,
    ) -> anyhow::Result<WorkflowResult> {
        info!("replaying {} detection records", results.len());
        self.drive(Box::new(IterSource::new(results)), options)
    }

    fn drive(
        &self,
        source: Box<dyn DetectionSource + Send>,
        options: &RunOptions,
    ) -> anyhow::Result<WorkflowResult> {
        let mut coordinator = self.build_coordinator()?;
        coordinator.attach_source(source);

        let idle_results = options.idle_frames as usize * self.session.cameras;
        let mut frames = 0;
        loop {
            if frames == idle_results {
                coordinator.start(options.output.as_deref());
            }
            if !coordinator.pump() {
                break;
            }
            frames += 1;
            if frames % PROGRESS_INTERVAL == 0 {
                info!("frame {} totals {:?}", frames, coordinator.totals());
            }
            coordinator.drain_events();
        }
        // Shorter streams than the idle prefix still end in a stop.
        if frames < idle_results {
            coordinator.start(options.output.as_deref());
        }

        coordinator.shutdown();
        let exported = coordinator.stop().context("saving density images")?;
        info!("finished analysis after {} frames", frames);

        let graph = match &options.graph_out {
            Some(path) => {
                let channel = coordinator
                    .channel(0)
                    .context("session has no cameras")?;
                let (width, height) = channel.graph_size();
                let mut raster = RgbaRaster::new(width, height);
                channel.series().paint(&mut raster);
                raster
                    .export_raster(path)
                    .with_context(|| format!("saving series graph {}", path.display()))?;
                Some(path.clone())
            }
            None => None,
        };

        Ok(WorkflowResult {
            frames,
            totals: coordinator.totals(),
            exported,
            graph,
            metrics: coordinator.metrics().snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotcore::Location;

    fn session(cameras: usize) -> SessionConfig {
        SessionConfig::from_args(cameras, 64, 64, 32, 32)
    }

    #[test]
    fn runner_generates_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(session(2));
        let options = RunOptions {
            output: Some(dir.path().join("run").to_string_lossy().into_owned()),
            graph_out: Some(dir.path().join("graph.png")),
            ..Default::default()
        };
        let generator = runner.generator_config(20, 5.0, 7);

        let result = runner.execute_generated(generator, &options).unwrap();
        assert_eq!(result.frames, 40);
        assert_eq!(result.metrics.processed, 40);
        assert_eq!(result.exported.len(), 2);
        assert!(dir.path().join("run_cam1.png").exists());
        assert!(dir.path().join("run_cam2.png").exists());
        assert!(dir.path().join("graph.png").exists());
    }

    #[test]
    fn idle_prefix_is_not_counted() {
        let runner = Runner::new(session(1));
        let results: Vec<_> = (0..5)
            .map(|frame| DetectionResult::new("camera1", frame, vec![Location::new(1.0, 1.0); 3]))
            .collect();
        let options = RunOptions {
            idle_frames: 2,
            ..Default::default()
        };

        let result = runner.execute_replay(results, &options).unwrap();
        assert_eq!(result.frames, 5);
        assert_eq!(result.totals, vec![9]);
        assert!(result.exported.is_empty());
    }

    #[test]
    fn unknown_cameras_are_skipped() {
        let runner = Runner::new(session(1));
        let results = vec![
            DetectionResult::new("camera1", 0, vec![Location::new(1.0, 1.0)]),
            DetectionResult::new("camera7", 0, vec![Location::new(1.0, 1.0)]),
        ];
        let result = runner
            .execute_replay(results, &RunOptions::default())
            .unwrap();
        assert_eq!(result.totals, vec![1]);
        assert_eq!(result.metrics.dropped, 1);
    }

    #[test]
    fn graph_reflects_recorded_counts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(session(1));
        let results = vec![DetectionResult::new("camera1", 0, Vec::new())];
        let options = RunOptions {
            graph_out: Some(dir.path().join("graph.png")),
            ..Default::default()
        };
        runner.execute_replay(results, &options).unwrap();

        let graph = image::open(dir.path().join("graph.png")).unwrap().to_rgba8();
        assert_eq!(graph.dimensions(), (400, 150));
    }
}
