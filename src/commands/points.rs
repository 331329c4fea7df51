use crate::features::points_to_feature_collection;
use crate::takeout::{extract_track_points, read_location_history};
use geojson::GeoJson;
use log::info;
use std::error::Error;
use std::fs;
use std::path::Path;

pub fn points_command(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let history = read_location_history(input)?;
    let points = extract_track_points(&history);
    info!("extracted {} points from {}", points.len(), input.display());

    let collection = points_to_feature_collection(&points);
    fs::write(output, GeoJson::from(collection).to_string())?;
    Ok(())
}
