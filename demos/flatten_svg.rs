//! Flattens the shapes of an svg file so that none of them overlap.
//!
//! Each shape keeps only the part of it that's visible in the original drawing.

use std::path::PathBuf;

use clap::Parser;
use overpaint::{Flattener, OverlayKernel};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
struct Cli {
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Drop output pieces with at most this much area.
    #[arg(long, default_value_t = 0.0)]
    min_area: f64,

    /// Log every pair of shapes that gets compared.
    #[arg(long, short)]
    verbose: bool,
}

pub fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    // The library logs through `log`; the subscriber picks that up too.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            LevelFilter::TRACE
        } else {
            LevelFilter::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let input = std::fs::read_to_string(&args.input)?;
    let drawing = overpaint_util::read_drawing(&input)?;
    tracing::info!("read {} shapes from {}", drawing.shapes.len(), args.input.display());

    let flattener = Flattener::new(OverlayKernel::with_min_area(args.min_area));
    let records = flattener.flatten(drawing.shapes)?;
    tracing::info!("writing {} paths to {}", records.len(), args.output.display());

    let document = overpaint_util::write_drawing(&drawing.root_attributes, &records);
    svg::save(&args.output, &document)?;

    Ok(())
}
