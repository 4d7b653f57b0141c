//! Heterogeneity scores for a block of an image.
//!
//! Every metric reads every pixel of the block once or twice and never
//! modifies the image. A score of zero means the block is one flat color.

use std::fmt;
use std::str::FromStr;

use super::error::{ConfigError, MetricError};
use super::{PixelGrid, Region};

/// Number of distinct values one channel can take.
const CHANNEL_LEVELS: usize = 256;

/// Luminance weights for combining per-channel SSIM.
const SSIM_WEIGHTS: [f64; 3] = [0.2125, 0.7154, 0.0721];

/// Which measure of heterogeneity decides whether a block gets split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorMetric {
	/// Mean squared deviation from the average, summed over channels.
	Variance,
	/// Mean absolute deviation from the average, summed over channels.
	MeanAbsoluteDeviation,
	/// Average over channels of `max - min`. Within `[0, 255]`.
	MaxPixelDifference,
	/// Average over channels of the Shannon entropy (bits). Within `[0, 8]`.
	Entropy,
	/// One minus a structural similarity of the block against its own mean.
	///
	/// There is no second image to compare against, so the block stands in
	/// for both and the "other" variance and covariance are zero. This
	/// reduces to a weighted `sigma / (sigma + C2)` per channel: it grows
	/// with variance but saturates quickly, and says little about
	/// structure.
	Ssim,
}

impl ErrorMetric {
	pub const ALL: [ErrorMetric; 5] = [
		ErrorMetric::Variance,
		ErrorMetric::MeanAbsoluteDeviation,
		ErrorMetric::MaxPixelDifference,
		ErrorMetric::Entropy,
		ErrorMetric::Ssim,
	];

	/// Short name, as accepted by `from_str`.
	pub fn name(&self) -> &'static str {
		match self {
			ErrorMetric::Variance => "variance",
			ErrorMetric::MeanAbsoluteDeviation => "mad",
			ErrorMetric::MaxPixelDifference => "max-diff",
			ErrorMetric::Entropy => "entropy",
			ErrorMetric::Ssim => "ssim",
		}
	}

	/// Scores the heterogeneity of `region` within `grid`.
	///
	/// Fails if the region is empty or doesn't fit inside the grid; a valid
	/// build never asks for either.
	pub fn measure(&self, grid: &PixelGrid, region: Region) -> Result<f64, MetricError> {
		check_region(grid, region)?;
		Ok(match self {
			ErrorMetric::Variance => variance(grid, region),
			ErrorMetric::MeanAbsoluteDeviation => mean_absolute_deviation(grid, region),
			ErrorMetric::MaxPixelDifference => max_pixel_difference(grid, region),
			ErrorMetric::Entropy => entropy(grid, region),
			ErrorMetric::Ssim => ssim(grid, region),
		})
	}
}

impl fmt::Display for ErrorMetric {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for ErrorMetric {
	type Err = ConfigError;

	/// Accepts a metric's short name or its menu number (1 to 5).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"1" | "variance" | "var" => Ok(ErrorMetric::Variance),
			"2" | "mad" | "mean-absolute-deviation" => Ok(ErrorMetric::MeanAbsoluteDeviation),
			"3" | "max-diff" | "max-pixel-difference" | "mpd" => Ok(ErrorMetric::MaxPixelDifference),
			"4" | "entropy" => Ok(ErrorMetric::Entropy),
			"5" | "ssim" => Ok(ErrorMetric::Ssim),
			_ => Err(ConfigError::UnknownMetric(s.to_owned())),
		}
	}
}

fn check_region(grid: &PixelGrid, region: Region) -> Result<(), MetricError> {
	if region.is_empty() {
		return Err(MetricError::EmptyRegion);
	}
	if !region.fits(grid.width(), grid.height()) {
		return Err(MetricError::OutOfBounds {
			x: region.x,
			y: region.y,
			width: region.width,
			height: region.height,
			image_width: grid.width(),
			image_height: grid.height(),
		});
	}
	Ok(())
}

fn channel_means(grid: &PixelGrid, region: Region) -> [f64; 3] {
	let mut sums = [0f64; 3];
	for (x, y) in region.pixels() {
		let p = grid.get_pixel(x, y);
		for c in 0..3 {
			sums[c] += p.0[c] as f64;
		}
	}
	let n = region.area() as f64;
	[sums[0] / n, sums[1] / n, sums[2] / n]
}

/// Sums `dev(pixel - mean)` over all pixels and channels, divided by the
/// pixel count.
fn mean_deviation<F: Fn(f64) -> f64>(grid: &PixelGrid, region: Region, dev: F) -> f64 {
	let means = channel_means(grid, region);
	let total = region.pixels()
		.map(|(x, y)| {
			let p = grid.get_pixel(x, y);
			(0..3).map(|c| dev(p.0[c] as f64 - means[c])).sum::<f64>()
		})
		.sum::<f64>();
	total / region.area() as f64
}

fn variance(grid: &PixelGrid, region: Region) -> f64 {
	mean_deviation(grid, region, |d| d * d)
}

fn mean_absolute_deviation(grid: &PixelGrid, region: Region) -> f64 {
	mean_deviation(grid, region, f64::abs)
}

fn max_pixel_difference(grid: &PixelGrid, region: Region) -> f64 {
	let mut lo = [u8::MAX; 3];
	let mut hi = [u8::MIN; 3];
	for (x, y) in region.pixels() {
		let p = grid.get_pixel(x, y);
		for c in 0..3 {
			lo[c] = lo[c].min(p.0[c]);
			hi[c] = hi[c].max(p.0[c]);
		}
	}
	(0..3).map(|c| (hi[c] - lo[c]) as f64).sum::<f64>() / 3.
}

fn entropy(grid: &PixelGrid, region: Region) -> f64 {
	let mut hist = [[0u32; CHANNEL_LEVELS]; 3];
	for (x, y) in region.pixels() {
		let p = grid.get_pixel(x, y);
		for c in 0..3 {
			hist[c][p.0[c] as usize] += 1;
		}
	}
	let n = region.area() as f64;
	let channel_entropy = |h: &[u32; CHANNEL_LEVELS]| -> f64 {
		h.iter()
			.filter(|&&count| count > 0)
			.map(|&count| {
				let p = count as f64 / n;
				-p * p.log2()
			})
			.sum()
	};
	hist.iter().map(channel_entropy).sum::<f64>() / 3.
}

fn ssim(grid: &PixelGrid, region: Region) -> f64 {
	const L: f64 = 255.;
	const C1: f64 = (0.01 * L) * (0.01 * L);
	const C2: f64 = (0.03 * L) * (0.03 * L);

	let means = channel_means(grid, region);
	let n = region.area() as f64;
	let mut sigmas = [0f64; 3];
	for (x, y) in region.pixels() {
		let p = grid.get_pixel(x, y);
		for c in 0..3 {
			let d = p.0[c] as f64 - means[c];
			sigmas[c] += d * d;
		}
	}

	let mut weighted = 0.;
	for c in 0..3 {
		let (mu, sigma) = (means[c], sigmas[c] / n);
		// The block is compared against itself
		let (mu_y, sigma_y, covariance) = (mu, 0., 0.);
		let numerator = (2. * mu * mu_y + C1) * (2. * covariance + C2);
		let denominator = (mu * mu + mu_y * mu_y + C1) * (sigma + sigma_y + C2);
		let s = if denominator == 0. { 1. } else { numerator / denominator };
		weighted += s * SSIM_WEIGHTS[c];
	}
	1. - weighted / SSIM_WEIGHTS.iter().sum::<f64>()
}
