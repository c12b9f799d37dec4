use crate::prelude::{Rgb, SpotError, SpotResult};
use crate::render::Surface;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;

/// In-memory RGBA raster backed by `image::RgbaImage`.
#[derive(Debug, Clone)]
pub struct RgbaRaster {
    image: RgbaImage,
}

impl RgbaRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let Rgba([r, g, b, _]) = *self.image.get_pixel(x, y);
        Some(Rgb(r, g, b))
    }

    fn in_bounds(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            None
        } else {
            Some((x as u32, y as u32))
        }
    }
}

fn opaque(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 255])
}

fn to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn blend_component(dst: u8, src: u8, alpha: u8) -> u8 {
    let added = (src as u32 * alpha as u32 + 127) / 255;
    (dst as u32 + added).min(255) as u8
}

impl Surface for RgbaRaster {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn blank(&mut self, color: Rgb) {
        let fill = opaque(color);
        for pixel in self.image.pixels_mut() {
            *pixel = fill;
        }
    }

    // Additive: repeated marks at one pixel brighten it until saturation.
    fn draw_mark(&mut self, x: i64, y: i64, color: Rgb, alpha: u8) {
        if let Some((x, y)) = self.in_bounds(x, y) {
            let pixel = self.image.get_pixel_mut(x, y);
            pixel.0[0] = blend_component(pixel.0[0], color.0, alpha);
            pixel.0[1] = blend_component(pixel.0[1], color.1, alpha);
            pixel.0[2] = blend_component(pixel.0[2], color.2, alpha);
        }
    }

    fn draw_line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb) {
        draw_line_segment_mut(
            &mut self.image,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            opaque(color),
        );
    }

    fn fill_rect(&mut self, origin: (i64, i64), width: u32, height: u32, color: Rgb) {
        if width == 0 || height == 0 {
            return;
        }
        let rect = Rect::at(to_i32(origin.0), to_i32(origin.1)).of_size(width, height);
        draw_filled_rect_mut(&mut self.image, rect, opaque(color));
    }

    fn export_raster(&self, path: &Path) -> SpotResult<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| SpotError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_accumulate_and_saturate() {
        let mut raster = RgbaRaster::new(4, 4);
        raster.draw_mark(1, 1, Rgb(255, 0, 0), 5);
        raster.draw_mark(1, 1, Rgb(255, 0, 0), 5);
        assert_eq!(raster.pixel(1, 1), Some(Rgb(10, 0, 0)));

        for _ in 0..100 {
            raster.draw_mark(2, 2, Rgb::WHITE, 5);
        }
        assert_eq!(raster.pixel(2, 2), Some(Rgb::WHITE));
        assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn out_of_bounds_drawing_is_clipped() {
        let mut raster = RgbaRaster::new(3, 3);
        raster.draw_mark(-1, 0, Rgb::WHITE, 255);
        raster.draw_mark(3, 3, Rgb::WHITE, 255);
        raster.draw_line((-5, 1), (10, 1), Rgb::WHITE);
        assert_eq!(raster.pixel(0, 1), Some(Rgb::WHITE));
        assert_eq!(raster.pixel(2, 1), Some(Rgb::WHITE));
        assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut raster = RgbaRaster::new(8, 8);
        raster.draw_line((0, 0), (7, 3), Rgb(0, 255, 0));
        assert_eq!(raster.pixel(0, 0), Some(Rgb(0, 255, 0)));
        assert_eq!(raster.pixel(7, 3), Some(Rgb(0, 255, 0)));
    }

    #[test]
    fn filled_rect_is_clipped_and_empty_rects_are_skipped() {
        let mut raster = RgbaRaster::new(6, 6);
        raster.fill_rect((4, 4), 5, 5, Rgb::WHITE);
        assert_eq!(raster.pixel(4, 4), Some(Rgb::WHITE));
        assert_eq!(raster.pixel(5, 5), Some(Rgb::WHITE));
        assert_eq!(raster.pixel(3, 4), Some(Rgb::BLACK));

        raster.fill_rect((0, 0), 0, 3, Rgb::WHITE);
        assert_eq!(raster.pixel(0, 0), Some(Rgb::BLACK));

        raster.fill_rect((-2, 1), 3, 1, Rgb(0, 0, 255));
        assert_eq!(raster.pixel(0, 1), Some(Rgb(0, 0, 255)));
        assert_eq!(raster.pixel(1, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn export_writes_png_and_reports_bad_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut raster = RgbaRaster::new(6, 4);
        raster.draw_mark(2, 2, Rgb::WHITE, 5);

        let path = dir.path().join("density.png");
        raster.export_raster(&path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (6, 4));
        assert_eq!(reloaded.get_pixel(2, 2).0, [5, 5, 5, 255]);

        let missing = dir.path().join("missing").join("density.png");
        assert!(matches!(
            raster.export_raster(&missing),
            Err(SpotError::Io { .. })
        ));
        assert_eq!(raster.pixel(2, 2), Some(Rgb(5, 5, 5)));
    }
}
