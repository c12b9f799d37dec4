use crate::acquisition::detection::camera_name;
use crate::acquisition::{DetectionResult, DisplayConfig};
use crate::prelude::{ColorCycle, SpotResult};
use crate::processing::{AccumulatorCounter, DensityCanvas, DensityParams, RollingSeriesBuffer};
use crate::telemetry::LogManager;
use std::path::PathBuf;

/// One camera's counter, rolling series and density canvas.
#[derive(Debug)]
pub struct Channel {
    pub(crate) counter: AccumulatorCounter,
    pub(crate) series: RollingSeriesBuffer,
    pub(crate) density: DensityCanvas,
    pub(crate) output_path: Option<PathBuf>,
    graph_size: (u32, u32),
    logger: LogManager,
}

impl Channel {
    pub fn new(index: usize, config: &DisplayConfig) -> Self {
        Self::with_canvas(index, config, DensityCanvas::new(config.width, config.height))
    }

    pub fn with_canvas(index: usize, config: &DisplayConfig, density: DensityCanvas) -> Self {
        Self {
            counter: AccumulatorCounter::new(),
            series: RollingSeriesBuffer::new(config.min_value, config.max_value),
            density,
            output_path: None,
            graph_size: (config.graph_width, config.graph_height),
            logger: LogManager::new(camera_name(index)),
        }
    }

    /// Density parameters for this channel, with the override merge applied.
    pub(crate) fn density_params(
        &self,
        index: usize,
        config: &DisplayConfig,
        colors: &ColorCycle,
    ) -> DensityParams {
        let geometry = config.geometry_for(index);
        let (canvas_width, _) = self.density.size();
        DensityParams {
            colors: colors.clone(),
            flip_horizontal: geometry.flip_horizontal,
            flip_vertical: geometry.flip_vertical,
            scale_bar_px: config.scale_bar_px(index, canvas_width),
            x_range: geometry.x_range(),
            y_range: geometry.y_range(),
        }
    }

    pub(crate) fn apply(&mut self, params: DensityParams, config: &DisplayConfig) -> SpotResult<()> {
        let colors = params.colors.clone();
        self.density.configure(params)?;
        self.counter.reset();
        let slots = colors.window_slots();
        self.series.configure(colors, slots);
        self.series
            .change_range(Some(config.min_value), Some(config.max_value));
        self.logger.record(&format!(
            "reconfigured: {} slots, scale {:.3}, scale bar {} px",
            slots,
            self.density.scale().0,
            self.density.scale_bar_px()
        ));
        Ok(())
    }

    /// Applies one detection result. Returns the new total when filming.
    pub(crate) fn ingest(&mut self, result: &DetectionResult, filming: bool) -> Option<u64> {
        self.series
            .record(result.frame_index, result.count as f64);
        if !filming {
            return None;
        }
        let total = self.counter.add(result.count as u64);
        let marks = self.density.update(result.frame_index, &result.locations);
        self.logger.detail(&format!(
            "frame {}: {} spots, {} marks, total {}",
            result.frame_index, result.count, marks, total
        ));
        Some(total)
    }

    pub(crate) fn export(&self) -> Option<SpotResult<PathBuf>> {
        let path = self.output_path.as_ref()?;
        Some(self.density.export_to(path).map(|_| path.clone()))
    }

    pub fn counter(&self) -> &AccumulatorCounter {
        &self.counter
    }

    pub fn counter_mut(&mut self) -> &mut AccumulatorCounter {
        &mut self.counter
    }

    pub fn series(&self) -> &RollingSeriesBuffer {
        &self.series
    }

    pub fn density(&self) -> &DensityCanvas {
        &self.density
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    pub fn graph_size(&self) -> (u32, u32) {
        self.graph_size
    }

    pub fn logger(&self) -> &LogManager {
        &self.logger
    }
}
