use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

mod commands;
mod features;
mod takeout;

#[derive(Parser)]
#[command(
    name = "takeout2geojson",
    about = "Read a Google location history file and turn it into GeoJSON"
)]
struct Cli {
    /// Location History JSON file exported from Google Takeout
    input: PathBuf,
    /// File the GeoJSON FeatureCollection is written to
    output: PathBuf,
    /// Extract traces instead of points
    #[arg(long)]
    traces: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if cli.traces {
        commands::traces::traces_command(&cli.input, &cli.output)
    } else {
        commands::points::points_command(&cli.input, &cli.output)
    }
}
