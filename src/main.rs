use std::path::Path;

use image::error::ImageError;
use tracing_subscriber::EnvFilter;

use quadtree_compress::config::{default_output, Config};
use quadtree_compress::error::{CalibrateError, EncodeError, RunError};
use quadtree_compress::{BuildParams, ErrorMetric};

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

/// Exit code and short description for an image library failure.
fn image_error_code(e: &ImageError) -> i32 {
	match e {
		ImageError::Decoding(_) | ImageError::Unsupported(_) => 4,
		ImageError::Limits(_) => 5,
		ImageError::IoError(_) => 3,
		_ => 10,
	}
}

fn run_error_code(e: &RunError) -> i32 {
	match e {
		RunError::Input { source, .. } => image_error_code(source),
		RunError::InputSize { .. } => 3,
		RunError::Config(_) => 2,
		RunError::Analyze(_) => 4,
		RunError::Calibrate(CalibrateError::Exhausted { .. }) => 6,
		RunError::Calibrate(CalibrateError::Encode(EncodeError::Image { source, .. })) |
		RunError::Output(EncodeError::Image { source, .. }) => image_error_code(source),
		RunError::Calibrate(CalibrateError::Encode(_)) |
		RunError::Output(_) => 3,
		RunError::Calibrate(_) => 10,
	}
}

/// `clap`-based CLI for quadtree block compression.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 5: computation limits exceeded
///
/// 6: no threshold improved on the original size
///
/// 10: other, potentially unknown error
fn main() {
	let clap_matches = clap::App::new("quadtree_compress")
		.version("0.1.0")
		.author("vkcz")
		.about("Compresses an image by merging uniform regions of a quadtree into flat blocks.")
		.arg_from_usage("-m, --metric=[METRIC] 'Error metric: variance, mad, max-diff, entropy or ssim (or 1-5); defaults to variance'")
		.arg_from_usage("-t, --threshold=[N] 'Error threshold below which a block stays whole; defaults to 0'")
		.arg_from_usage("-b, --min-block=[N] 'Minimum block side length in pixels; defaults to 1'")
		.arg_from_usage("-c, --target=[F] 'Target compression ratio between 0 and 1 (0 disables calibration); defaults to 0'")
		.arg_from_usage("-l, --outline 'Draw a black border around every block'")
		.arg_from_usage("-g, --gif=[PATH] 'Also write an animation of the refinement, one frame per depth'")
		.arg_from_usage("-d, --delay=[MS] 'Delay between animation frames in milliseconds; defaults to 100'")
		.arg_from_usage("<INPUT> 'Path to input image'")
		.arg_from_usage("[OUTPUT] 'Path to output image; defaults to INPUT with a .qt.png extension'")
		.get_matches();

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new("quadtree_compress=info")))
		.with_writer(std::io::stderr)
		.init();

	let metric: ErrorMetric = match clap_matches.value_of("metric").unwrap_or("variance").parse() {
		Ok(m) => m,
		Err(e) => error_exit(&e.to_string(), 2)
	};
	let (threshold, min_block, target, delay) = (
		match clap_matches.value_of("threshold").unwrap_or("0").parse::<f64>() {
			Ok(n) => n,
			Err(_) => error_exit("Non-numeric value for threshold", 2)
		},
		match clap_matches.value_of("min-block").unwrap_or("1").parse::<u32>() {
			Ok(n) => n,
			Err(_) => error_exit("Non-numeric value for min-block", 2)
		},
		match clap_matches.value_of("target").unwrap_or("0").parse::<f64>() {
			Ok(n) => n,
			Err(_) => error_exit("Non-numeric value for target", 2)
		},
		match clap_matches.value_of("delay").unwrap_or("100").parse::<u32>() {
			Ok(n) => n,
			Err(_) => error_exit("Non-numeric value for delay", 2)
		}
	);

	let params = match BuildParams::new(metric, threshold, min_block) {
		Ok(p) => p,
		Err(e) => error_exit(&e.to_string(), 2)
	};
	// `INPUT` is required, so clap has already rejected its absence
	let input = Path::new(clap_matches.value_of("INPUT").unwrap_or_default());
	let output = clap_matches.value_of("OUTPUT")
		.map(Into::into)
		.unwrap_or_else(|| default_output(input));
	let mut config = match Config::new(input, output, params).with_target(target) {
		Ok(c) => c,
		Err(e) => error_exit(&e.to_string(), 2)
	}
		.with_outline(clap_matches.is_present("outline"))
		.with_frame_delay(delay);
	if let Some(gif) = clap_matches.value_of("gif") {
		config = config.with_gif(gif);
	}

	match quadtree_compress::compress(&config) {
		Ok(report) => println!("{}", report),
		Err(e) => error_exit(&e.to_string(), run_error_code(&e))
	}
}
