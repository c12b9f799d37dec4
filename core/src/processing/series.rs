use crate::prelude::{ColorCycle, Rgb};
use crate::render::Surface;

const GRID_COLOR: Rgb = Rgb(200, 200, 200);
const GRID_ROWS: f32 = 5.0;

/// Point of the series plot in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
}

/// Everything an adapter needs to paint the rolling series.
#[derive(Debug, Clone, Default)]
pub struct SeriesPlot {
    pub width: u32,
    pub height: u32,
    pub segments: Vec<((f32, f32), (f32, f32))>,
    pub points: Vec<PlotPoint>,
    /// x positions marking the start of each color cycle.
    pub cycle_lines: Vec<f32>,
    /// y positions of the horizontal grid.
    pub grid_lines: Vec<f32>,
}

/// Fixed-capacity window mapping frame index to a displayed value.
///
/// Slots are addressed by `frame_index % slot_count`, so frames exactly one
/// window apart overwrite each other.
#[derive(Debug, Clone)]
pub struct RollingSeriesBuffer {
    slots: Vec<f64>,
    colors: ColorCycle,
    min_value: f64,
    max_value: f64,
}

impl RollingSeriesBuffer {
    pub fn new(min_value: f64, max_value: f64) -> Self {
        let colors = ColorCycle::dark();
        Self {
            slots: vec![0.0; colors.window_slots()],
            colors,
            min_value,
            max_value,
        }
    }

    pub fn configure(&mut self, colors: ColorCycle, slot_count: usize) {
        self.slots = vec![0.0; slot_count.max(1)];
        self.colors = colors;
    }

    pub fn clear(&mut self) {
        self.slots.fill(0.0);
    }

    pub fn record(&mut self, frame_index: u64, value: f64) {
        let slot = (frame_index % self.slots.len() as u64) as usize;
        self.slots[slot] = value;
    }

    pub fn color_for(&self, frame_index: u64) -> Option<Rgb> {
        self.colors.color_for(frame_index)
    }

    pub fn change_range(&mut self, min_value: Option<f64>, max_value: Option<f64>) {
        if let Some(min_value) = min_value {
            self.min_value = min_value;
        }
        if let Some(max_value) = max_value {
            self.max_value = max_value;
        }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[f64] {
        &self.slots
    }

    pub fn period(&self) -> usize {
        self.colors.period()
    }

    fn y_position(&self, value: f64, height: u32) -> f32 {
        let span = self.max_value - self.min_value;
        let normalized = if span != 0.0 {
            (value - self.min_value) / span
        } else {
            0.0
        };
        let height = height as f64;
        (height - normalized * height).clamp(0.0, height) as f32
    }

    /// Lays the window out on a `width` x `height` surface in slot order.
    pub fn plot(&self, width: u32, height: u32) -> SeriesPlot {
        let x_scale = width as f32 / self.slots.len() as f32;
        let positions: Vec<(f32, f32)> = self
            .slots
            .iter()
            .enumerate()
            .map(|(idx, &value)| (idx as f32 * x_scale, self.y_position(value, height)))
            .collect();

        let segments = positions.windows(2).map(|pair| (pair[0], pair[1])).collect();
        let points = positions
            .iter()
            .enumerate()
            .map(|(idx, &(x, y))| PlotPoint {
                x,
                y,
                color: self.color_for(idx as u64).unwrap_or(Rgb::BLACK),
            })
            .collect();

        let mut cycle_lines = Vec::new();
        let mut grid_lines = Vec::new();
        if self.period() > 1 {
            let cycle = x_scale * self.period() as f32;
            let mut x = 0.0;
            while x < width as f32 {
                cycle_lines.push(x);
                x += cycle;
            }
            let row = height as f32 / GRID_ROWS;
            let mut y = 0.0;
            while row > 0.0 && y < height as f32 {
                grid_lines.push(y);
                y += row;
            }
        }

        SeriesPlot {
            width,
            height,
            segments,
            points,
            cycle_lines,
            grid_lines,
        }
    }

    /// Paints the plot onto `surface`, sized to the surface.
    pub fn paint(&self, surface: &mut dyn Surface) {
        let (width, height) = surface.size();
        let plot = self.plot(width, height);

        surface.blank(Rgb::WHITE);
        for &x in &plot.cycle_lines {
            surface.draw_line((x as i64, 0), (x as i64, height as i64), GRID_COLOR);
        }
        for &y in &plot.grid_lines {
            surface.draw_line((0, y as i64), (width as i64, y as i64), GRID_COLOR);
        }
        for &(from, to) in &plot.segments {
            surface.draw_line(
                (from.0 as i64, from.1 as i64),
                (to.0 as i64, to.1 as i64),
                Rgb::BLACK,
            );
        }
        for point in &plot.points {
            let (x, y) = (point.x as i64, point.y as i64);
            for dy in -1..=1 {
                surface.draw_line((x - 1, y + dy), (x + 1, y + dy), point.color);
            }
        }
    }
}
