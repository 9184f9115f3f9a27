//! Source kernels.

mod line_source;
mod point_source;
mod soma;

pub use line_source::LineSource;
pub use point_source::PointSource;
pub use soma::SomaAsPoint;
