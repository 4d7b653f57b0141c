use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Config;
use crate::node::calibrate::{calibrate, compression_ratio, FileProbe};
use crate::node::error::RunError;
use crate::node::render::{file_size, load_image, save_frames};

/// Summary of a finished compression run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
	pub elapsed: Duration,
	pub original_size: u64,
	pub compressed_size: u64,
	/// `1 - compressed / original`, from the file actually written.
	pub compression: f64,
	/// Levels in the tree.
	pub depth: u32,
	/// All nodes, branches included.
	pub nodes: usize,
	pub leaves: usize,
	pub threshold: f64,
	pub output: PathBuf,
	pub gif: Option<PathBuf>,
}

/// Compresses `config.input` into `config.output` and, if asked, writes the
/// refinement animation.
///
/// Calibrates the threshold first when a target compression is set.
pub fn compress(config: &Config) -> Result<Report, RunError> {
	let grid = load_image(&config.input)
		.map_err(|source| RunError::Input { path: config.input.clone(), source })?;
	let original_size = std::fs::metadata(&config.input)
		.map_err(|source| RunError::InputSize { path: config.input.clone(), source })?
		.len();
	info!(
		width = grid.width(),
		height = grid.height(),
		metric = %config.params.metric(),
		"loaded {}", config.input.display()
	);

	let start = Instant::now();
	let mut probe = FileProbe::new(&config.output, config.draw_outline)?;
	let cal = calibrate(
		&grid,
		&config.params,
		config.target_compression(),
		original_size,
		&mut probe
	)?;
	drop(probe);
	let tree = cal.tree;

	tree.save(&config.output, config.draw_outline)?;
	if let Some(ref gif) = config.gif {
		save_frames(gif, &tree.depth_frames(), config.frame_delay_ms)?;
		info!("animation saved to {}", gif.display());
	}
	let elapsed = start.elapsed();

	let compressed_size = file_size(&config.output)?;
	Ok(Report {
		elapsed,
		original_size,
		compressed_size,
		compression: if original_size == 0 { 0. } else { compression_ratio(compressed_size, original_size) },
		depth: tree.max_depth(),
		nodes: tree.count_nodes(),
		leaves: tree.count_leaves(),
		threshold: cal.threshold,
		output: config.output.clone(),
		gif: config.gif.clone(),
	})
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "========= COMPRESSION REPORT =========")?;
		writeln!(f, "Execution time        : {} ms", self.elapsed.as_millis())?;
		writeln!(f, "Original image size   : {:.2} KB", self.original_size as f64 / 1024.)?;
		writeln!(f, "Compressed image size : {:.2} KB", self.compressed_size as f64 / 1024.)?;
		writeln!(f, "Compression percentage: {:.2}%", self.compression * 100.)?;
		writeln!(f, "Threshold             : {}", self.threshold)?;
		writeln!(f, "Tree depth            : {}", self.depth)?;
		writeln!(f, "Total nodes           : {}", self.nodes)?;
		writeln!(f, "Leaf blocks           : {}", self.leaves)?;
		write!(f, "Output image path     : {}", self.output.display())?;
		if let Some(ref gif) = self.gif {
			write!(f, "\nGIF path              : {}", gif.display())?;
		}
		Ok(())
	}
}
