pub mod counter;
pub mod density;
pub mod series;

pub use counter::{AccumulatorCounter, CountObserver};
pub use density::{DensityCanvas, DensityParams};
pub use series::{PlotPoint, RollingSeriesBuffer, SeriesPlot};
