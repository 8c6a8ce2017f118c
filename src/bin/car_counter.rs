use std::path::PathBuf;

use car_tracker::{
    CanvasAnnotator, FrameDifferenceDetector, Processor, ProcessorConfig, Result, Video,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Count the cars crossing the action zone of a video stored as PNG frames.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of input frames (*.png, read in file name order)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the annotated frames are written to
    #[arg(short, long)]
    output: PathBuf,

    /// Frame rate of the input
    #[arg(long, default_value_t = car_tracker::integration::DEFAULT_FPS)]
    fps: f64,

    /// JSON run configuration; missing fields use their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detection workers, overrides the configuration
    #[arg(short, long)]
    workers: Option<usize>,

    /// Smallest moving blob, in pixels, reported as a car
    #[arg(long, default_value_t = 800.0)]
    min_area: f64,

    /// TrueType/OpenType font for the car counter and labels
    #[arg(long)]
    font: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ProcessorConfig::from_json_file(path)?,
        None => ProcessorConfig::default(),
    };
    if args.workers.is_some() {
        config.workers = args.workers;
    }

    let annotator = CanvasAnnotator::new().with_font_file(&args.font)?;

    let detector = FrameDifferenceDetector::new(args.min_area);
    let processor = Processor::new(detector, annotator, config)?;

    let video = Video::load_png_sequence(&args.input, args.fps)?;
    let output = processor.process(&video)?;
    output.video.save_png_sequence(&args.output)?;

    info!(
        cars = output.car_count,
        frames = output.video.len(),
        output = %args.output.display(),
        "done"
    );
    println!("Car counter: {}", output.car_count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_is_required() {
        let missing = Args::try_parse_from(["car_counter", "-i", "in", "-o", "out"]);
        assert!(missing.is_err());

        let args =
            Args::try_parse_from(["car_counter", "-i", "in", "-o", "out", "--font", "f.ttf"])
                .unwrap();
        assert_eq!(args.font, PathBuf::from("f.ttf"));
        assert_eq!(args.min_area, 800.0);
        assert!(args.workers.is_none());
    }
}
