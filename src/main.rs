// This file is an example runner for the `focus_peek` library.
// It loads an RGB image (or synthesizes a test pattern), streams it
// through the cycle-accurate pipeline, and saves the filtered result.

use focus_peek::core_modules::pixel::pixel::Pixel;
use focus_peek::harness::{pixels_changed, FrameDriver};
use focus_peek::pipeline::PipelineConfig;
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_path = args.next();
    let output_path = args.next().unwrap_or_else(|| "peeked.png".to_string());

    let (width, height, frame) = match &input_path {
        Some(path) => {
            let image = image::open(path)?.to_rgb8();
            let (w, h) = image.dimensions();
            (w, h, image.into_raw())
        }
        None => {
            info!("no input image given, synthesizing a test pattern");
            test_pattern(64, 64)
        }
    };

    let config = PipelineConfig {
        width,
        height,
        threshold: 255,
        highlight: Pixel::new(255, 0, 0),
        ..PipelineConfig::default()
    };
    let mut driver = FrameDriver::new(config)?;
    let filtered = driver.run_frame(&frame)?;

    let highlighted = pixels_changed(&frame, &filtered);
    info!(
        "{}x{} frame: {} of {} pixels highlighted",
        width,
        height,
        highlighted,
        width * height
    );

    image::save_buffer(
        &output_path,
        &filtered,
        width,
        height,
        image::ExtendedColorType::Rgb8,
    )?;
    println!("{highlighted} pixels highlighted, saved {output_path}");
    Ok(())
}

/// A flat gray field with a sharp white square: the square's edges are the
/// only high-contrast content, so they are what the filter should find.
fn test_pattern(width: u32, height: u32) -> (u32, u32, Vec<u8>) {
    let mut frame = vec![64u8; (width * height * 3) as usize];
    for y in height / 4..3 * height / 4 {
        for x in width / 4..3 * width / 4 {
            let base = ((y * width + x) * 3) as usize;
            frame[base] = 255;
            frame[base + 1] = 255;
            frame[base + 2] = 255;
        }
    }
    (width, height, frame)
}
