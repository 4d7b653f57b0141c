use std::fs::File;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};

use super::error::*;
use super::{Color, PixelGrid, Quadtree, QuadtreeNode, Region};

/// Fill for pixels that a depth-limited render never reaches.
pub const PLACEHOLDER: Color = image::Rgb([200, 200, 200]);

const OUTLINE: Color = image::Rgb([0, 0, 0]);

fn fill(img: &mut PixelGrid, region: Region, color: Color) {
	for (x, y) in region.pixels() {
		img.put_pixel(x, y, color);
	}
}

/// Overwrites the border pixels of `region` with `color`.
fn outline(img: &mut PixelGrid, region: Region, color: Color) {
	let Region { x, y, width, height } = region;
	if region.is_empty() {
		return;
	}
	for col in x..x + width {
		img.put_pixel(col, y, color);
		img.put_pixel(col, y + height - 1, color);
	}
	for row in y..y + height {
		img.put_pixel(x, row, color);
		img.put_pixel(x + width - 1, row, color);
	}
}

impl QuadtreeNode {
	/// Paints this node's leaves into `img`. Branches are never painted
	/// themselves.
	pub fn draw(&self, img: &mut PixelGrid) {
		match self.sections {
			Some(ref sects) => sects.iter().for_each(|s| s.draw(img)),
			None => fill(img, self.region, self.color),
		}
	}

	/// Paints this subtree cut off at depth `level`: nodes at exactly that
	/// depth are painted with their own color, and shallower leaves are
	/// painted as usual.
	pub fn draw_at_depth(&self, img: &mut PixelGrid, level: u32) {
		match self.sections {
			Some(ref sects) if self.depth != level => {
				sects.iter().for_each(|s| s.draw_at_depth(img, level))
			},
			_ => fill(img, self.region, self.color),
		}
	}
}

impl Quadtree {
	/// Renders every leaf as a flat block of its color.
	pub fn to_image(&self) -> PixelGrid {
		let mut img = PixelGrid::new(self.width, self.height);
		self.root.draw(&mut img);
		img
	}

	/// Renders the tree as it looks at depth `level` (root is depth 0).
	///
	/// Anything not covered falls back to `PLACEHOLDER`.
	pub fn to_image_at_depth(&self, level: u32) -> PixelGrid {
		let mut img = PixelGrid::from_pixel(self.width, self.height, PLACEHOLDER);
		self.root.draw_at_depth(&mut img, level);
		img
	}

	/// One frame per depth level from 1 to `max_depth()`, showing the
	/// refinement of the image. The last frame equals `to_image()`.
	pub fn depth_frames(&self) -> Vec<PixelGrid> {
		(1..=self.max_depth()).map(|level| self.to_image_at_depth(level)).collect()
	}

	/// Like `to_image`, with every leaf's border drawn in black.
	pub fn to_outlined_image(&self) -> PixelGrid {
		let mut img = self.to_image();
		for leaf in self.leaves() {
			outline(&mut img, leaf.region, OUTLINE);
		}
		img
	}

	/// Renders the tree and writes it to `path`, in the format implied by
	/// the path's extension.
	pub fn save<Q: AsRef<Path>>(&self, path: Q, draw_outline: bool) -> Result<(), EncodeError> {
		let img = if draw_outline { self.to_outlined_image() } else { self.to_image() };
		img.save(path.as_ref()).map_err(|source| EncodeError::Image {
			path: path.as_ref().to_owned(),
			source,
		})
	}
}

/// Opens an image in any format the `image` crate knows, dropping alpha.
pub fn load_image<Q: AsRef<Path>>(path: Q) -> Result<PixelGrid, image::ImageError> {
	Ok(image::open(path)?.to_rgb8())
}

/// Size of a file in bytes.
pub fn file_size<Q: AsRef<Path>>(path: Q) -> Result<u64, EncodeError> {
	std::fs::metadata(path.as_ref())
		.map(|m| m.len())
		.map_err(|source| EncodeError::Io { path: path.as_ref().to_owned(), source })
}

/// Writes `frames` as a looping animated GIF with `delay_ms` per frame.
///
/// Nothing is written if `frames` is empty.
pub fn save_frames<Q: AsRef<Path>>(
	path: Q,
	frames: &[PixelGrid],
	delay_ms: u32
) -> Result<(), EncodeError> {
	if frames.is_empty() {
		return Err(EncodeError::NoFrames);
	}
	let path = path.as_ref();
	let image_err = |source: image::ImageError| EncodeError::Image { path: path.to_owned(), source };
	let file = File::create(path)
		.map_err(|source| EncodeError::Io { path: path.to_owned(), source })?;
	let mut encoder = GifEncoder::new(file);
	encoder.set_repeat(Repeat::Infinite).map_err(image_err)?;
	let delay = Delay::from_numer_denom_ms(delay_ms, 1);
	encoder.encode_frames(frames.iter().map(|f| {
		Frame::from_parts(DynamicImage::ImageRgb8(f.clone()).to_rgba8(), 0, 0, delay)
	})).map_err(image_err)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::metric::ErrorMetric;
	use crate::node::BuildParams;

	fn build(grid: &PixelGrid, threshold: f64) -> Quadtree {
		let params = BuildParams::new(ErrorMetric::Variance, threshold, 1).unwrap();
		Quadtree::from_image(grid, &params).unwrap()
	}

	fn gradient(w: u32, h: u32) -> PixelGrid {
		image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, ((x + y) * 5) as u8]))
	}

	#[test]
	fn lossless_tree_reproduces_image() {
		let grid = gradient(8, 8);
		let tree = build(&grid, 0.);
		assert_eq!(tree.to_image(), grid);
	}

	#[test]
	fn render_matches_tree_dimensions() {
		for &(w, h) in [(1, 1), (3, 8), (17, 5)].iter() {
			let tree = build(&gradient(w, h), 50.);
			let img = tree.to_image();
			assert_eq!((img.width(), img.height()), (tree.width, tree.height));
		}
	}

	#[test]
	fn depth_render_paints_shallow_nodes_with_their_average() {
		let grid = image::RgbImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
			(true, true) => image::Rgb([200, 0, 0]),
			(false, true) => image::Rgb([0, 200, 0]),
			(true, false) => image::Rgb([0, 0, 200]),
			(false, false) => image::Rgb([100, 100, 100]),
		});
		let tree = build(&grid, 0.);
		let root_only = tree.to_image_at_depth(0);
		assert!(root_only.pixels().all(|p| *p == image::Rgb([75, 75, 75])));
		assert_eq!(tree.to_image_at_depth(1), grid);
		// Deeper than the tree: leaves still render
		assert_eq!(tree.to_image_at_depth(5), grid);
	}

	#[test]
	fn depth_frames_end_with_full_render() {
		let tree = build(&gradient(8, 8), 10.);
		let frames = tree.depth_frames();
		assert_eq!(frames.len(), tree.max_depth() as usize);
		assert_eq!(frames.last(), Some(&tree.to_image()));
	}

	#[test]
	fn outline_blackens_leaf_borders_only() {
		let grid = image::RgbImage::from_pixel(6, 6, image::Rgb([50, 60, 70]));
		let tree = build(&grid, 0.);
		let img = tree.to_outlined_image();
		for (x, y, p) in img.enumerate_pixels() {
			let border = x == 0 || y == 0 || x == 5 || y == 5;
			assert_eq!(*p, if border { OUTLINE } else { image::Rgb([50, 60, 70]) });
		}
		// The plain render is left alone
		assert_eq!(tree.to_image(), grid);
	}

	#[test]
	fn empty_frame_list_is_rejected() {
		let path = std::env::temp_dir().join("quadtree_compress_never_written.gif");
		assert!(matches!(save_frames(&path, &[], 100), Err(EncodeError::NoFrames)));
		assert!(!path.exists());
	}
}
