pub mod error;
pub mod metric;

use metric::ErrorMetric;

/// A single pixel color. Three channels, no alpha.
pub type Color = image::Rgb<u8>;

/// The pixel grid a quadtree is built from and rendered to.
pub type PixelGrid = image::RgbImage;

/// An axis-aligned block of an image, `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
	pub x: u32,
	pub y: u32,
	pub width: u32,
	pub height: u32,
}

impl Region {
	pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
		Region { x, y, width, height }
	}

	/// The region covering all of `grid`.
	pub fn of(grid: &PixelGrid) -> Self {
		Region::new(0, 0, grid.width(), grid.height())
	}

	pub fn area(&self) -> u64 {
		self.width as u64 * self.height as u64
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	pub fn contains(&self, x: u32, y: u32) -> bool {
		x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
	}

	/// Whether the region lies entirely within an image of the given size.
	pub fn fits(&self, width: u32, height: u32) -> bool {
		self.x as u64 + self.width as u64 <= width as u64 &&
			self.y as u64 + self.height as u64 <= height as u64
	}

	/// Splits the region into its four quadrants: top-left, top-right,
	/// bottom-left, bottom-right.
	///
	/// Odd leftover rows and columns go to the bottom and right quadrants,
	/// so the four always tile the region exactly.
	pub fn split(&self) -> [Region; 4] {
		let half_w = self.width / 2;
		let half_h = self.height / 2;
		let (rest_w, rest_h) = (self.width - half_w, self.height - half_h);
		[
			Region::new(self.x, self.y, half_w, half_h),
			Region::new(self.x + half_w, self.y, rest_w, half_h),
			Region::new(self.x, self.y + half_h, half_w, rest_h),
			Region::new(self.x + half_w, self.y + half_h, rest_w, rest_h),
		]
	}

	/// Iterates the `(x, y)` coordinates of every pixel, row by row.
	pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
		let Region { x, y, width, height } = *self;
		(y..y + height).flat_map(move |row| (x..x + width).map(move |col| (col, row)))
	}
}

/// Validated settings for building a quadtree.
///
/// Can only be made through `new`, so a `BuildParams` in hand is always
/// safe to build with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildParams {
	metric: ErrorMetric,
	threshold: f64,
	min_block_size: u32,
}

impl BuildParams {
	pub fn new(
		metric: ErrorMetric,
		threshold: f64,
		min_block_size: u32
	) -> Result<Self, error::ConfigError> {
		if !threshold.is_finite() || threshold < 0. {
			return Err(error::ConfigError::InvalidThreshold(threshold));
		}
		if min_block_size == 0 {
			return Err(error::ConfigError::InvalidMinBlockSize);
		}
		Ok(BuildParams { metric, threshold, min_block_size })
	}

	/// The same parameters with a different threshold.
	pub fn with_threshold(&self, threshold: f64) -> Result<Self, error::ConfigError> {
		BuildParams::new(self.metric, threshold, self.min_block_size)
	}

	pub fn metric(&self) -> ErrorMetric {
		self.metric
	}

	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	pub fn min_block_size(&self) -> u32 {
		self.min_block_size
	}
}

/// Node in a quadtree decomposition of an image.
///
/// Either a leaf (no sections), rendered as one flat color, or a branch
/// with exactly four sections tiling its region as `Region::split` does.
///
/// Branches carry the average color of their region too, so that a render
/// cut off at any depth still gives a meaningful preview.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadtreeNode {
	pub region: Region,
	/// Distance from the root; the root is at depth 0.
	pub depth: u32,
	pub color: Color,
	/// Metric score of the region when it was built. Kept for diagnostics.
	pub error: f64,
	pub sections: Option<Box<[QuadtreeNode; 4]>>,
}

/// A complete decomposition of an image, along with its dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadtree {
	pub root: QuadtreeNode,
	pub width: u32,
	pub height: u32,
}

/// Per-channel truncated average over a region.
///
/// `region` must be non-empty and inside `grid`.
pub fn average_color(grid: &PixelGrid, region: Region) -> Color {
	let mut sums = [0u64; 3];
	for (x, y) in region.pixels() {
		let p = grid.get_pixel(x, y);
		for c in 0..3 {
			sums[c] += p.0[c] as u64;
		}
	}
	let n = region.area().max(1);
	image::Rgb([(sums[0] / n) as u8, (sums[1] / n) as u8, (sums[2] / n) as u8])
}

impl QuadtreeNode {
	pub fn is_leaf(&self) -> bool {
		self.sections.is_none()
	}

	/// Recursively decomposes `region` of `grid`.
	///
	/// A region becomes a leaf once either side is at most
	/// `min_block_size`, or its error score is at most `threshold`.
	/// Otherwise it is split in four and each quadrant is mounted at
	/// `depth + 1`.
	pub fn mount(
		grid: &PixelGrid,
		region: Region,
		depth: u32,
		params: &BuildParams
	) -> Result<Self, error::MetricError> {
		let error = params.metric.measure(grid, region)?;
		let mut node = QuadtreeNode {
			region,
			depth,
			color: average_color(grid, region),
			error,
			sections: None,
		};
		let small = region.width <= params.min_block_size ||
			region.height <= params.min_block_size;
		if small || error <= params.threshold {
			return Ok(node);
		}
		let [a, b, c, d] = region.split();
		node.sections = Some(Box::new([
			QuadtreeNode::mount(grid, a, depth + 1, params)?,
			QuadtreeNode::mount(grid, b, depth + 1, params)?,
			QuadtreeNode::mount(grid, c, depth + 1, params)?,
			QuadtreeNode::mount(grid, d, depth + 1, params)?,
		]));
		Ok(node)
	}

	/// Number of nodes in this subtree, branches included.
	pub fn count_nodes(&self) -> usize {
		match self.sections {
			Some(ref sects) => 1 + sects.iter().map(QuadtreeNode::count_nodes).sum::<usize>(),
			None => 1,
		}
	}

	pub fn count_leaves(&self) -> usize {
		match self.sections {
			Some(ref sects) => sects.iter().map(QuadtreeNode::count_leaves).sum(),
			None => 1,
		}
	}

	/// Number of levels in this subtree; a lone leaf has one.
	pub fn max_depth(&self) -> u32 {
		match self.sections {
			Some(ref sects) => 1 + sects.iter().map(QuadtreeNode::max_depth).max().unwrap_or(0),
			None => 1,
		}
	}
}

/// Depth-first iterator over the leaves of a tree.
pub struct Leaves<'a> {
	stack: Vec<&'a QuadtreeNode>,
}

impl<'a> Iterator for Leaves<'a> {
	type Item = &'a QuadtreeNode;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(node) = self.stack.pop() {
			match node.sections {
				// Reversed so the top-left quadrant comes out first
				Some(ref sects) => self.stack.extend(sects.iter().rev()),
				None => return Some(node),
			}
		}
		None
	}
}

impl Quadtree {
	/// Builds the quadtree of an entire image.
	pub fn from_image(
		grid: &PixelGrid,
		params: &BuildParams
	) -> Result<Self, error::AnalyzeError> {
		let region = Region::of(grid);
		if region.is_empty() {
			return Err(error::AnalyzeError::EmptyImage);
		}
		let root = QuadtreeNode::mount(grid, region, 0, params)?;
		Ok(Quadtree { root, width: grid.width(), height: grid.height() })
	}

	/// Total number of nodes, branches included.
	pub fn count_nodes(&self) -> usize {
		self.root.count_nodes()
	}

	pub fn count_leaves(&self) -> usize {
		self.root.count_leaves()
	}

	pub fn max_depth(&self) -> u32 {
		self.root.max_depth()
	}

	pub fn leaves(&self) -> Leaves<'_> {
		Leaves { stack: vec![&self.root] }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn quadrants() -> PixelGrid {
		image::RgbImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
			(true, true) => image::Rgb([255, 0, 0]),
			(false, true) => image::Rgb([0, 255, 0]),
			(true, false) => image::Rgb([0, 0, 255]),
			(false, false) => image::Rgb([10, 20, 30]),
		})
	}

	fn params(metric: ErrorMetric, threshold: f64, min_block: u32) -> BuildParams {
		BuildParams::new(metric, threshold, min_block).unwrap()
	}

	#[test]
	fn odd_region_splits_with_remainder_bottom_right() {
		let parts = Region::new(0, 0, 5, 5).split();
		assert_eq!(parts[0], Region::new(0, 0, 2, 2));
		assert_eq!(parts[1], Region::new(2, 0, 3, 2));
		assert_eq!(parts[2], Region::new(0, 2, 2, 3));
		assert_eq!(parts[3], Region::new(2, 2, 3, 3));
	}

	#[test]
	fn split_of_thin_region_has_empty_quadrants() {
		let parts = Region::new(3, 7, 1, 4).split();
		assert!(parts[0].is_empty());
		assert!(parts[2].is_empty());
		assert_eq!(parts[1], Region::new(3, 7, 1, 2));
		assert_eq!(parts[3], Region::new(3, 9, 1, 2));
	}

	#[test]
	fn four_flat_quadrants_split_once() {
		let grid = quadrants();
		let tree = Quadtree::from_image(&grid, &params(ErrorMetric::Variance, 0., 1)).unwrap();
		assert!(!tree.root.is_leaf());
		assert_eq!(tree.max_depth(), 2);
		assert_eq!(tree.count_leaves(), 4);
		assert_eq!(tree.count_nodes(), 5);
		let colors = tree.leaves().map(|l| l.color).collect::<Vec<_>>();
		assert_eq!(colors, vec![
			image::Rgb([255, 0, 0]),
			image::Rgb([0, 255, 0]),
			image::Rgb([0, 0, 255]),
			image::Rgb([10, 20, 30]),
		]);
		for leaf in tree.leaves() {
			assert_eq!(leaf.depth, 1);
			assert_eq!(leaf.error, 0.);
		}
	}

	#[test]
	fn uniform_image_is_single_leaf_for_every_metric() {
		let grid = image::RgbImage::from_pixel(8, 8, image::Rgb([12, 34, 56]));
		for metric in ErrorMetric::ALL.iter() {
			let tree = Quadtree::from_image(&grid, &params(*metric, 0., 1)).unwrap();
			assert!(tree.root.is_leaf(), "{} split a flat image", metric);
			assert_eq!(tree.root.color, image::Rgb([12, 34, 56]));
			assert_eq!(tree.count_nodes(), 1);
			assert_eq!(tree.max_depth(), 1);
		}
	}

	#[test]
	fn large_min_block_forces_single_leaf() {
		let grid = image::RgbImage::from_fn(6, 3, |x, y| image::Rgb([(x * 40) as u8, (y * 80) as u8, 7]));
		let tree = Quadtree::from_image(&grid, &params(ErrorMetric::Variance, 0., 6)).unwrap();
		assert!(tree.root.is_leaf());
	}

	#[test]
	fn zero_threshold_subdivides_to_flat_or_minimum_blocks() {
		let grid = image::RgbImage::from_fn(8, 8, |x, y| image::Rgb([((x ^ y) * 30) as u8, 0, 0]));
		let p = params(ErrorMetric::MeanAbsoluteDeviation, 0., 1);
		let tree = Quadtree::from_image(&grid, &p).unwrap();
		for leaf in tree.leaves() {
			let r = leaf.region;
			assert!(leaf.error == 0. || r.width <= 1 || r.height <= 1);
		}
	}

	#[test]
	fn leaf_color_is_truncated_average() {
		let grid = image::RgbImage::from_fn(2, 1, |x, _| {
			if x == 0 { image::Rgb([0, 1, 255]) } else { image::Rgb([3, 2, 254]) }
		});
		assert_eq!(average_color(&grid, Region::of(&grid)), image::Rgb([1, 1, 254]));
	}

	#[test]
	fn rejects_bad_params() {
		assert_eq!(
			BuildParams::new(ErrorMetric::Entropy, -1., 1),
			Err(error::ConfigError::InvalidThreshold(-1.))
		);
		assert_eq!(
			BuildParams::new(ErrorMetric::Entropy, 1., 0),
			Err(error::ConfigError::InvalidMinBlockSize)
		);
		assert!(BuildParams::new(ErrorMetric::Entropy, f64::NAN, 1).is_err());
	}

	#[test]
	fn empty_image_is_rejected() {
		let grid = image::RgbImage::new(0, 5);
		assert_eq!(
			Quadtree::from_image(&grid, &params(ErrorMetric::Variance, 0., 1)),
			Err(error::AnalyzeError::EmptyImage)
		);
	}

	#[test]
	fn children_partition_their_parent() {
		let grid = image::RgbImage::from_fn(7, 5, |x, y| image::Rgb([(x * 31 + y * 17) as u8, (y * 50) as u8, 9]));
		let tree = Quadtree::from_image(&grid, &params(ErrorMetric::Variance, 0., 1)).unwrap();
		let mut stack = vec![&tree.root];
		while let Some(node) = stack.pop() {
			if let Some(ref sects) = node.sections {
				let expected = node.region.split();
				for (sect, region) in sects.iter().zip(expected.iter()) {
					assert_eq!(sect.region, *region);
					assert_eq!(sect.depth, node.depth + 1);
				}
				stack.extend(sects.iter());
			}
		}
	}
}

pub mod calibrate;
pub mod render;
