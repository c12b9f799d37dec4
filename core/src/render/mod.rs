pub mod raster;

pub use raster::RgbaRaster;

use crate::prelude::{Rgb, SpotResult};
use std::path::Path;

/// Narrow drawing capability the engine paints through. Display adapters
/// implement it for their own backing store.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    /// Fills the whole surface with `color`.
    fn blank(&mut self, color: Rgb);
    /// Blends `color` at `alpha` into a single pixel. Out-of-bounds marks are clipped.
    fn draw_mark(&mut self, x: i64, y: i64, color: Rgb, alpha: u8);
    /// Draws a one-pixel line including both endpoints, clipped to the surface.
    fn draw_line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb);
    /// Fills a `width` x `height` rectangle whose top-left corner is `origin`.
    /// Empty rectangles draw nothing.
    fn fill_rect(&mut self, origin: (i64, i64), width: u32, height: u32, color: Rgb);
    fn export_raster(&self, path: &Path) -> SpotResult<()>;
}
