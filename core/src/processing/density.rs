use crate::acquisition::Location;
use crate::prelude::{ColorCycle, Rgb, SpotError, SpotResult};
use crate::render::{RgbaRaster, Surface};
use std::path::Path;

const BACKGROUND: Rgb = Rgb::BLACK;
const SCALE_BAR_COLOR: Rgb = Rgb::WHITE;
const SCALE_BAR_OFFSET: i64 = 5;
const SCALE_BAR_HEIGHT: u32 = 5;
/// Opacity of one localization; low enough that density shows as brightness.
pub const MARK_ALPHA: u8 = 5;

/// Parameters applied by [`DensityCanvas::configure`].
#[derive(Debug, Clone)]
pub struct DensityParams {
    pub colors: ColorCycle,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub scale_bar_px: f64,
    pub x_range: f32,
    pub y_range: f32,
}

/// Persistent raster of translucent localization marks.
pub struct DensityCanvas {
    surface: Box<dyn Surface + Send>,
    colors: ColorCycle,
    flip_horizontal: bool,
    flip_vertical: bool,
    scale_bar_px: u32,
    x_range: f32,
    y_range: f32,
    scale: f32,
}

impl DensityCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_surface(Box::new(RgbaRaster::new(width, height)))
    }

    pub fn with_surface(surface: Box<dyn Surface + Send>) -> Self {
        let mut canvas = Self {
            surface,
            colors: ColorCycle::dark(),
            flip_horizontal: false,
            flip_vertical: false,
            scale_bar_px: 1,
            x_range: 1.0,
            y_range: 1.0,
            scale: 1.0,
        };
        canvas.blank();
        canvas
    }

    pub fn blank(&mut self) {
        self.surface.blank(BACKGROUND);
        self.surface.fill_rect(
            (SCALE_BAR_OFFSET, SCALE_BAR_OFFSET),
            self.scale_bar_px,
            SCALE_BAR_HEIGHT,
            SCALE_BAR_COLOR,
        );
    }

    pub fn configure(&mut self, params: DensityParams) -> SpotResult<()> {
        if !(params.x_range > 0.0 && params.y_range > 0.0) {
            return Err(SpotError::Config(format!(
                "density axis range {}x{} must be positive",
                params.x_range, params.y_range
            )));
        }
        let (width, height) = self.surface.size();
        let x_scale = width as f32 / params.x_range;
        let y_scale = height as f32 / params.y_range;

        self.scale = x_scale.min(y_scale);
        self.colors = params.colors;
        self.flip_horizontal = params.flip_horizontal;
        self.flip_vertical = params.flip_vertical;
        self.scale_bar_px = params.scale_bar_px.max(0.0).round() as u32;
        self.x_range = params.x_range;
        self.y_range = params.y_range;
        self.blank();
        Ok(())
    }

    /// Adds one frame's localizations. Returns the number of marks that landed
    /// on the canvas; non-finite and off-canvas locations are skipped.
    pub fn update(&mut self, frame_index: u64, locations: &[Location]) -> usize {
        let Some(color) = self.colors.color_for(frame_index) else {
            return 0;
        };
        let (width, height) = self.surface.size();
        let mut landed = 0;
        for location in locations {
            let Some((x, y)) = self.to_canvas(*location) else {
                continue;
            };
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                continue;
            }
            self.surface.draw_mark(x, y, color, MARK_ALPHA);
            landed += 1;
        }
        landed
    }

    fn to_canvas(&self, location: Location) -> Option<(i64, i64)> {
        if !location.x.is_finite() || !location.y.is_finite() {
            return None;
        }
        let x = if self.flip_horizontal {
            self.x_range - location.x
        } else {
            location.x
        };
        let y = if self.flip_vertical {
            self.y_range - location.y
        } else {
            location.y
        };
        Some(((x * self.scale) as i64, (y * self.scale) as i64))
    }

    pub fn export_to(&self, path: &Path) -> SpotResult<()> {
        self.surface.export_raster(path)
    }

    /// Uniform canvas pixels per source pixel.
    pub fn scale(&self) -> (f32, f32) {
        (self.scale, self.scale)
    }

    pub fn scale_bar_px(&self) -> u32 {
        self.scale_bar_px
    }

    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }

}

impl std::fmt::Debug for DensityCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DensityCanvas")
            .field("size", &self.surface.size())
            .field("scale", &self.scale)
            .field("scale_bar_px", &self.scale_bar_px)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Blank,
        Mark(i64, i64, Rgb),
        Line,
        Rect((i64, i64), u32, u32),
    }

    /// Surface that records what the canvas asks it to draw.
    struct Recorder {
        size: (u32, u32),
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Surface for Recorder {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn blank(&mut self, _color: Rgb) {
            self.calls.lock().unwrap().push(Call::Blank);
        }
        fn draw_mark(&mut self, x: i64, y: i64, color: Rgb, _alpha: u8) {
            self.calls.lock().unwrap().push(Call::Mark(x, y, color));
        }
        fn draw_line(&mut self, _from: (i64, i64), _to: (i64, i64), _color: Rgb) {
            self.calls.lock().unwrap().push(Call::Line);
        }
        fn fill_rect(&mut self, origin: (i64, i64), width: u32, height: u32, _color: Rgb) {
            self.calls.lock().unwrap().push(Call::Rect(origin, width, height));
        }
        fn export_raster(&self, _path: &Path) -> SpotResult<()> {
            Ok(())
        }
    }

    fn recording(width: u32, height: u32) -> (DensityCanvas, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let surface = Recorder {
            size: (width, height),
            calls: calls.clone(),
        };
        (DensityCanvas::with_surface(Box::new(surface)), calls)
    }

    fn params(x_range: f32, y_range: f32) -> DensityParams {
        DensityParams {
            colors: ColorCycle::new(vec![Some(Rgb(255, 0, 0)), None, Some(Rgb(0, 0, 255))])
                .unwrap(),
            flip_horizontal: false,
            flip_vertical: false,
            scale_bar_px: 0.0,
            x_range,
            y_range,
        }
    }

    #[test]
    fn scale_is_uniform_minimum_of_axes() {
        let mut canvas = DensityCanvas::new(100, 50);
        canvas.configure(params(10.0, 5.0)).unwrap();
        assert_eq!(canvas.scale(), (10.0, 10.0));

        canvas.configure(params(10.0, 10.0)).unwrap();
        assert_eq!(canvas.scale(), (5.0, 5.0));
    }

    #[test]
    fn invalid_range_keeps_previous_configuration() {
        let mut canvas = DensityCanvas::new(100, 50);
        canvas.configure(params(10.0, 5.0)).unwrap();
        assert!(matches!(
            canvas.configure(params(0.0, 5.0)),
            Err(SpotError::Config(_))
        ));
        assert_eq!(canvas.scale(), (10.0, 10.0));
    }

    #[test]
    fn dark_slots_draw_nothing() {
        let (mut canvas, calls) = recording(100, 50);
        canvas.configure(params(10.0, 5.0)).unwrap();
        calls.lock().unwrap().clear();

        let spots = [Location::new(1.0, 1.0), Location::new(2.5, 3.0)];
        assert_eq!(canvas.update(1, &spots), 0);
        assert_eq!(canvas.update(4, &spots), 0);
        assert!(calls.lock().unwrap().is_empty());

        assert_eq!(canvas.update(2, &spots), 2);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Mark(10, 10, Rgb(0, 0, 255)),
                Call::Mark(25, 30, Rgb(0, 0, 255)),
            ]
        );
    }

    #[test]
    fn flips_mirror_about_the_source_extent() {
        let (mut canvas, calls) = recording(100, 50);
        let mut flipped = params(10.0, 5.0);
        flipped.flip_horizontal = true;
        flipped.flip_vertical = true;
        canvas.configure(flipped).unwrap();
        calls.lock().unwrap().clear();

        canvas.update(0, &[Location::new(1.0, 1.0)]);
        assert_eq!(*calls.lock().unwrap(), vec![Call::Mark(90, 40, Rgb(255, 0, 0))]);
    }

    #[test]
    fn blank_redraws_scale_bar() {
        let (mut canvas, calls) = recording(100, 50);
        let mut with_bar = params(10.0, 5.0);
        with_bar.scale_bar_px = 12.4;
        canvas.configure(with_bar).unwrap();
        assert_eq!(canvas.scale_bar_px(), 12);

        let recorded = calls.lock().unwrap().clone();
        let last_blank = recorded.iter().rposition(|c| *c == Call::Blank).unwrap();
        assert_eq!(recorded[last_blank + 1..], [Call::Rect((5, 5), 12, 5)]);
    }

    #[test]
    fn scale_bar_spans_its_rounded_length() {
        let mut canvas = DensityCanvas::new(40, 20);
        let mut with_bar = params(40.0, 20.0);
        with_bar.scale_bar_px = 3.0;
        canvas.configure(with_bar).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bar.png");
        canvas.export_to(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(7, 9).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(8, 5).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn non_finite_and_off_canvas_locations_are_not_drawn() {
        let (mut canvas, calls) = recording(20, 20);
        canvas.configure(params(20.0, 20.0)).unwrap();
        calls.lock().unwrap().clear();

        let spots = [
            Location::new(f32::NAN, f32::NAN),
            Location::new(f32::INFINITY, 3.0),
            Location::new(-50.0, 500.0),
            Location::new(4.0, 6.0),
        ];
        assert_eq!(canvas.update(0, &spots), 1);
        assert_eq!(*calls.lock().unwrap(), vec![Call::Mark(4, 6, Rgb(255, 0, 0))]);
    }

    #[test]
    fn marks_persist_until_blank() {
        let mut canvas = DensityCanvas::new(20, 20);
        canvas.configure(params(20.0, 20.0)).unwrap();
        let spot = [Location::new(15.0, 15.0)];
        canvas.update(0, &spot);
        canvas.update(3, &spot);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marks.png");
        canvas.export_to(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(15, 15).0, [10, 0, 0, 255]);

        canvas.blank();
        canvas.export_to(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(15, 15).0, [0, 0, 0, 255]);
    }
}
