use std::path::{Path, PathBuf};

use crate::node::error::ConfigError;
use crate::node::BuildParams;

/// Default delay between animation frames.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// Everything a compression run needs, validated up front.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
	pub input: PathBuf,
	pub output: PathBuf,
	/// Where to write the depth-by-depth animation, if anywhere.
	pub gif: Option<PathBuf>,
	pub params: BuildParams,
	target_compression: f64,
	pub draw_outline: bool,
	pub frame_delay_ms: u32,
}

impl Config {
	/// A run with calibration disabled, no outline and no animation.
	pub fn new<I: Into<PathBuf>, O: Into<PathBuf>>(input: I, output: O, params: BuildParams) -> Self {
		Config {
			input: input.into(),
			output: output.into(),
			gif: None,
			params,
			target_compression: 0.,
			draw_outline: false,
			frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
		}
	}

	/// Sets the compression ratio to calibrate for. `0` disables
	/// calibration.
	pub fn with_target(mut self, target: f64) -> Result<Self, ConfigError> {
		if !(0. ..=1.).contains(&target) {
			return Err(ConfigError::InvalidTarget(target));
		}
		self.target_compression = target;
		Ok(self)
	}

	pub fn with_gif<P: Into<PathBuf>>(mut self, path: P) -> Self {
		self.gif = Some(path.into());
		self
	}

	pub fn with_outline(mut self, draw_outline: bool) -> Self {
		self.draw_outline = draw_outline;
		self
	}

	pub fn with_frame_delay(mut self, delay_ms: u32) -> Self {
		self.frame_delay_ms = delay_ms;
		self
	}

	pub fn target_compression(&self) -> f64 {
		self.target_compression
	}
}

/// `input` with its extension replaced by `.qt.png`.
pub fn default_output(input: &Path) -> PathBuf {
	input.with_extension("qt.png")
}
