//! Adaptive quadtree compression of raster images.
//!
//! An image is split into four blocks, recursively, until each block is
//! uniform enough (by one of several error metrics) to be drawn as a single
//! flat color. The tree is then rendered back to pixels and saved.

pub mod compressor;
pub mod config;
pub mod node;

pub use compressor::{compress, Report};
pub use config::Config;
pub use node::calibrate::{calibrate, Calibration, FileProbe, SizeProbe};
pub use node::metric::ErrorMetric;
pub use node::*;
