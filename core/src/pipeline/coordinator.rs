use crate::acquisition::{DetectionResult, DisplayConfig};
use crate::pipeline::channel::Channel;
use crate::pipeline::events::{EventQueue, PipelineEvent};
use crate::pipeline::feed::DetectionSource;
use crate::prelude::{ColorCycle, SpotError, SpotResult};
use crate::processing::CountObserver;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::path::PathBuf;

/// Minimum distance kept between the live minimum and maximum.
pub const RANGE_GAP: f64 = 10.0;
const MAX_PENDING_EVENTS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Filming,
}

/// Owns every channel and runs the Idle/Filming state machine.
pub struct PipelineCoordinator {
    channels: Vec<Channel>,
    state: SessionState,
    config: DisplayConfig,
    min_value: f64,
    max_value: f64,
    source: Option<Box<dyn DetectionSource + Send>>,
    events: EventQueue,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl PipelineCoordinator {
    /// Creates `cameras` channels sized from `config`, with a dark color cycle.
    pub fn new(cameras: usize, config: DisplayConfig) -> SpotResult<Self> {
        Self::with_channels((0..cameras).map(|index| Channel::new(index, &config)).collect(), config)
    }

    /// Builds a coordinator around pre-made channels (custom surfaces).
    pub fn with_channels(channels: Vec<Channel>, config: DisplayConfig) -> SpotResult<Self> {
        if !(1..=2).contains(&channels.len()) {
            return Err(SpotError::Config(format!(
                "expected 1 or 2 cameras, got {}",
                channels.len()
            )));
        }
        config.validate(channels.len())?;
        let mut coordinator = Self {
            min_value: config.min_value,
            max_value: config.max_value,
            channels,
            state: SessionState::Idle,
            config,
            source: None,
            events: EventQueue::new(MAX_PENDING_EVENTS),
            metrics: MetricsRecorder::new(),
            logger: LogManager::default(),
        };
        let initial = coordinator.config.clone();
        coordinator.reconfigure(initial, ColorCycle::dark())?;
        coordinator.events.drain();
        Ok(coordinator)
    }

    /// Clears every channel and enters `Filming`. With a name, each channel
    /// gets an output path that `stop` writes to.
    pub fn start(&mut self, output_name: Option<&str>) {
        let multi = self.channels.len() > 1;
        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.counter.reset();
            channel.density.blank();
            channel.output_path = output_name.map(|name| {
                if multi {
                    PathBuf::from(format!("{}_cam{}.png", name, index + 1))
                } else {
                    PathBuf::from(format!("{}.png", name))
                }
            });
        }
        self.state = SessionState::Filming;

        let output_paths: Vec<PathBuf> = self
            .channels
            .iter()
            .filter_map(|channel| channel.output_path.clone())
            .collect();
        self.logger
            .record(&format!("filming started, outputs {:?}", output_paths));
        self.publish_totals();
        self.events
            .publish(PipelineEvent::FilmingStarted { output_paths });
    }

    /// Leaves `Filming` and exports each channel that has an output path.
    ///
    /// Every export is attempted; the first failure is returned after the rest
    /// have run.
    pub fn stop(&mut self) -> SpotResult<Vec<PathBuf>> {
        self.state = SessionState::Idle;
        let mut exported = Vec::new();
        let mut first_error = None;
        for channel in &self.channels {
            match channel.export() {
                Some(Ok(path)) => {
                    channel
                        .logger()
                        .record(&format!("saved density image {}", path.display()));
                    self.metrics.record_export(true);
                    exported.push(path);
                }
                Some(Err(err)) => {
                    channel.logger().warn(&format!("export failed: {err}"));
                    self.metrics.record_export(false);
                    first_error.get_or_insert(err);
                }
                None => {}
            }
        }
        self.events.publish(PipelineEvent::FilmingStopped {
            exported: exported.clone(),
        });
        match first_error {
            Some(err) => Err(err),
            None => Ok(exported),
        }
    }

    /// Zeroes counters and series and blanks every canvas.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.counter.reset();
            channel.series.clear();
            channel.density.blank();
        }
        self.publish_totals();
    }

    /// Routes one result to its channel. Emits `FrameProcessed` either way.
    pub fn on_detection_result(&mut self, result: &DetectionResult) -> SpotResult<()> {
        let outcome = self.apply_result(result);
        match &outcome {
            Ok(()) => self.metrics.record_processed(),
            Err(err) => {
                self.logger
                    .warn(&format!("dropping frame {}: {err}", result.frame_index));
                self.metrics.record_dropped();
                self.events.publish(PipelineEvent::FrameDropped {
                    camera: result.camera.clone(),
                    reason: err.to_string(),
                });
            }
        }
        self.events.publish(PipelineEvent::FrameProcessed {
            camera: result.camera.clone(),
            frame_index: result.frame_index,
        });
        outcome
    }

    fn apply_result(&mut self, result: &DetectionResult) -> SpotResult<()> {
        let index = result
            .channel_index()
            .filter(|&index| index < self.channels.len())
            .ok_or_else(|| SpotError::UnknownCamera(result.camera.clone()))?;
        result.validate()?;

        let filming = self.state == SessionState::Filming;
        if let Some(total) = self.channels[index].ingest(result, filming) {
            self.events.publish(PipelineEvent::CountChanged {
                channel: index,
                total,
            });
        }
        Ok(())
    }

    /// Applies new display parameters and colors to every channel.
    ///
    /// The whole config is validated first, covering every channel's
    /// geometry; on error nothing changes.
    pub fn reconfigure(&mut self, config: DisplayConfig, colors: ColorCycle) -> SpotResult<()> {
        config.validate(self.channels.len())?;
        let params: Vec<_> = self
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| channel.density_params(index, &config, &colors))
            .collect();

        for (channel, params) in self.channels.iter_mut().zip(params) {
            channel.apply(params, &config)?;
        }
        self.min_value = config.min_value;
        self.max_value = config.max_value;
        self.config = config;

        self.publish_totals();
        self.events.publish(PipelineEvent::Reconfigured {
            slot_count: colors.window_slots(),
        });
        Ok(())
    }

    /// Sets the live minimum; the maximum is floored to `min + RANGE_GAP`.
    pub fn set_min_value(&mut self, min_value: f64) {
        self.min_value = min_value;
        self.max_value = self.max_value.max(min_value + RANGE_GAP);
        self.apply_range();
    }

    /// Sets the live maximum; the minimum is ceilinged to `max - RANGE_GAP`.
    pub fn set_max_value(&mut self, max_value: f64) {
        self.max_value = max_value;
        self.min_value = self.min_value.min(max_value - RANGE_GAP);
        self.apply_range();
    }

    fn apply_range(&mut self) {
        for channel in &mut self.channels {
            channel
                .series
                .change_range(Some(self.min_value), Some(self.max_value));
        }
        self.events.publish(PipelineEvent::RangeChanged {
            min_value: self.min_value,
            max_value: self.max_value,
        });
    }

    /// Attaches the upstream producer that `pump` pulls from.
    pub fn attach_source(&mut self, source: Box<dyn DetectionSource + Send>) {
        if let Some(mut previous) = self.source.replace(source) {
            previous.halt();
        }
    }

    /// Pulls and processes one result, then signals completion to the source.
    /// Returns `false` once the source is exhausted or none is attached.
    pub fn pump(&mut self) -> bool {
        let Some(result) = self.source.as_mut().and_then(|source| source.next_result()) else {
            return false;
        };
        // Dropped frames are already logged and counted.
        let _ = self.on_detection_result(&result);
        if let Some(source) = self.source.as_mut() {
            source.frame_processed();
        }
        true
    }

    /// Pumps until the source runs dry. Returns the number of frames handled.
    pub fn run_source(&mut self) -> usize {
        let mut frames = 0;
        while self.pump() {
            frames += 1;
        }
        frames
    }

    /// Halts the upstream producer and returns to `Idle`.
    pub fn shutdown(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.halt();
            self.logger.record("detection source halted");
        }
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total(&self, channel: usize) -> Option<u64> {
        self.channels.get(channel).map(|c| c.counter().total())
    }

    pub fn totals(&self) -> Vec<u64> {
        self.channels.iter().map(|c| c.counter().total()).collect()
    }

    pub fn subscribe_counts(&mut self, channel: usize, observer: CountObserver) -> SpotResult<()> {
        let target = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| SpotError::UnknownCamera(format!("channel {channel}")))?;
        target.counter_mut().subscribe(observer);
        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    fn publish_totals(&mut self) {
        for (channel, total) in self.totals().into_iter().enumerate() {
            self.events
                .publish(PipelineEvent::CountChanged { channel, total });
        }
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
