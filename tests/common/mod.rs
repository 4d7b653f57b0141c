//! Test images shared by the integration tests.

#![allow(dead_code)]

use quadtree_compress::PixelGrid;

/// 32x32 image made of four flat 16x16 quadrants.
pub fn quadrants() -> PixelGrid {
	image::RgbImage::from_fn(32, 32, |x, y| match (x < 16, y < 16) {
		(true, true) => image::Rgb([230, 40, 40]),
		(false, true) => image::Rgb([40, 230, 40]),
		(true, false) => image::Rgb([40, 40, 230]),
		(false, false) => image::Rgb([240, 240, 240]),
	})
}

/// Mid-grey with a little deterministic noise in every channel.
///
/// Each channel stays within `[120, 136)`, so no block's variance exceeds
/// `3 * 8 * 8`.
pub fn low_noise(width: u32, height: u32, seed: u32) -> PixelGrid {
	let mut state = seed;
	image::RgbImage::from_fn(width, height, |_, _| {
		let mut channel = || {
			state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
			120 + ((state >> 16) % 16) as u8
		};
		image::Rgb([channel(), channel(), channel()])
	})
}
