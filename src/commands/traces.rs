use crate::features::traces_to_feature_collection;
use crate::takeout::{extract_track_points, read_location_history};
use geojson::GeoJson;
use log::info;
use std::error::Error;
use std::fs;
use std::path::Path;
use takeout2geojson::segment_traces;

pub fn traces_command(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let history = read_location_history(input)?;
    let points = extract_track_points(&history);
    let traces = segment_traces(&points);
    info!(
        "segmented {} points from {} into {} traces",
        points.len(),
        input.display(),
        traces.len()
    );

    let collection = traces_to_feature_collection(&traces);
    fs::write(output, GeoJson::from(collection).to_string())?;
    Ok(())
}
