use std::path::PathBuf;

use thiserror::Error;

/// Reason why a set of compression parameters was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
	/// The error threshold is negative or not a finite number.
	#[error("threshold must be a finite number >= 0 (got {0})")]
	InvalidThreshold(f64),
	/// Blocks can't be smaller than one pixel.
	#[error("minimum block size must be >= 1")]
	InvalidMinBlockSize,
	/// The target compression is outside `[0, 1]`.
	#[error("target compression must be between 0 and 1 (got {0})")]
	InvalidTarget(f64),
	/// The metric name or number isn't one of the five known metrics.
	#[error("unknown error metric `{0}`")]
	UnknownMetric(String),
}

/// Reason why an error metric couldn't score a region.
#[derive(Debug, Error, PartialEq)]
pub enum MetricError {
	/// The region has zero width or zero height.
	#[error("empty region")]
	EmptyRegion,
	/// The region extends past the edge of the image.
	#[error("region {x},{y} {width}x{height} exceeds image bounds {image_width}x{image_height}")]
	OutOfBounds {
		x: u32,
		y: u32,
		width: u32,
		height: u32,
		image_width: u32,
		image_height: u32,
	},
}

/// Reason why an image couldn't be turned into a quadtree.
#[derive(Debug, Error, PartialEq)]
pub enum AnalyzeError {
	/// The image has no pixels.
	#[error("image has no pixels")]
	EmptyImage,
	/// The error metric failed on some block.
	#[error(transparent)]
	Metric(#[from] MetricError),
}

/// Reason why a quadtree or a frame sequence couldn't be written out.
#[derive(Debug, Error)]
pub enum EncodeError {
	/// The `image` crate failed to encode or write the file.
	#[error("could not encode {}: {}", .path.display(), .source)]
	Image {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},
	/// Plain file I/O failed (creating the output, probing its size).
	#[error("could not access {}: {}", .path.display(), .source)]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	/// An animation needs at least one frame.
	#[error("no frames to encode")]
	NoFrames,
}

/// Reason why threshold calibration didn't produce a tree.
#[derive(Debug, Error)]
pub enum CalibrateError {
	/// No candidate ever compressed better than the original file.
	#[error("no threshold improved on the original size after {iterations} attempts")]
	Exhausted { iterations: usize },
	/// The original file size is zero, so no ratio can be computed.
	#[error("original size is zero")]
	EmptyOriginal,
	/// Building a candidate tree failed.
	#[error(transparent)]
	Analyze(#[from] AnalyzeError),
	/// Encoding or measuring a candidate failed.
	#[error(transparent)]
	Encode(#[from] EncodeError),
	/// The calibration parameters were invalid.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Reason why a whole compression run failed.
#[derive(Debug, Error)]
pub enum RunError {
	/// The input image couldn't be read or decoded.
	#[error("could not load {}: {}", .path.display(), .source)]
	Input {
		path: PathBuf,
		#[source]
		source: image::ImageError,
	},
	/// The input file's size couldn't be read.
	#[error("could not read size of {}: {}", .path.display(), .source)]
	InputSize {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Analyze(#[from] AnalyzeError),
	#[error(transparent)]
	Calibrate(#[from] CalibrateError),
	/// Writing the compressed image or the animation failed.
	#[error(transparent)]
	Output(#[from] EncodeError),
}
