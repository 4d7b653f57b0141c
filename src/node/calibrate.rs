//! Search for an error threshold that reaches a target compression ratio.
//!
//! Candidates are built at increasing thresholds, encoded, and measured;
//! the first one to reach the target wins, otherwise the best one seen.
//! Encoded size isn't monotonic in the threshold, so every candidate is
//! compared against the best so far.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::error::*;
use super::render::file_size;
use super::{BuildParams, PixelGrid, Quadtree};

/// Threshold increment between candidates.
pub const THRESHOLD_STEP: f64 = 5.;
/// No candidate is built above this threshold.
pub const THRESHOLD_CEILING: f64 = 1000.;
/// Maximum number of candidates tried.
pub const MAX_STEPS: usize = 200;

/// Reports how many bytes a tree takes once encoded.
pub trait SizeProbe {
	fn encoded_size(&mut self, tree: &Quadtree) -> Result<u64, EncodeError>;
}

/// Encodes candidates to a temporary file and reads back its size.
///
/// The file is reused for every candidate and removed on drop.
pub struct FileProbe {
	file: NamedTempFile,
	draw_outline: bool,
}

impl FileProbe {
	/// Makes a probe that encodes in the same format as `output` (by
	/// extension; PNG if it has none).
	pub fn new(output: &Path, draw_outline: bool) -> Result<Self, EncodeError> {
		let suffix = output.extension()
			.map(|e| format!(".{}", e.to_string_lossy()))
			.unwrap_or_else(|| ".png".to_owned());
		let file = tempfile::Builder::new()
			.prefix("quadtree_compress")
			.suffix(&suffix)
			.tempfile()
			.map_err(|source| EncodeError::Io { path: std::env::temp_dir(), source })?;
		Ok(FileProbe { file, draw_outline })
	}

	pub fn path(&self) -> &Path {
		self.file.path()
	}
}

impl SizeProbe for FileProbe {
	fn encoded_size(&mut self, tree: &Quadtree) -> Result<u64, EncodeError> {
		tree.save(self.file.path(), self.draw_outline)?;
		file_size(self.file.path())
	}
}

/// Outcome of a threshold search.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
	pub tree: Quadtree,
	/// Threshold the tree was built with.
	pub threshold: f64,
	/// Measured compression ratio; `None` if calibration was disabled.
	pub ratio: Option<f64>,
	/// Whether `ratio` reached the target. `false` when disabled.
	pub target_met: bool,
	/// Number of candidates built and measured.
	pub iterations: usize,
}

/// `1 - encoded / original`.
pub fn compression_ratio(encoded_size: u64, original_size: u64) -> f64 {
	1. - encoded_size as f64 / original_size as f64
}

/// Finds a tree whose encoding is at least `target` smaller than
/// `original_size` bytes, stepping the threshold up from the one in
/// `params`.
///
/// With `target <= 0` no search happens and the tree is built directly
/// at the base threshold.
pub fn calibrate<S: SizeProbe>(
	grid: &PixelGrid,
	params: &BuildParams,
	target: f64,
	original_size: u64,
	probe: &mut S
) -> Result<Calibration, CalibrateError> {
	if target.is_nan() || target > 1. {
		return Err(ConfigError::InvalidTarget(target).into());
	}
	if target <= 0. {
		return Ok(Calibration {
			tree: Quadtree::from_image(grid, params)?,
			threshold: params.threshold(),
			ratio: None,
			target_met: false,
			iterations: 0,
		});
	}
	if original_size == 0 {
		return Err(CalibrateError::EmptyOriginal);
	}

	let mut best: Option<(Quadtree, f64)> = None;
	let mut best_ratio = 0.;
	let mut threshold = params.threshold();
	let mut iterations = 0;
	while threshold <= THRESHOLD_CEILING && iterations < MAX_STEPS {
		iterations += 1;
		let candidate = Quadtree::from_image(grid, &params.with_threshold(threshold)?)?;
		let size = probe.encoded_size(&candidate)?;
		let ratio = compression_ratio(size, original_size);
		debug!(threshold, ratio, size, "measured candidate");
		if ratio >= target {
			info!(threshold, ratio, iterations, "target compression reached");
			return Ok(Calibration {
				tree: candidate,
				threshold,
				ratio: Some(ratio),
				target_met: true,
				iterations,
			});
		}
		if ratio > best_ratio {
			best_ratio = ratio;
			// Replacing drops the previous best
			best = Some((candidate, threshold));
		}
		threshold += THRESHOLD_STEP;
	}

	match best {
		Some((tree, threshold)) => {
			warn!(target, best = best_ratio, threshold, "target not reached, using best compression");
			Ok(Calibration {
				tree,
				threshold,
				ratio: Some(best_ratio),
				target_met: false,
				iterations,
			})
		},
		None => Err(CalibrateError::Exhausted { iterations }),
	}
}
