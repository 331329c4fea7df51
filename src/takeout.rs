use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use takeout2geojson::{TrackPoint, UNKNOWN_ACTIVITY};

/// Top-level shape of a Location History export.
#[derive(Debug, Default, Deserialize)]
pub struct LocationHistory {
    #[serde(default)]
    pub locations: Vec<RawSample>,
}

/// One raw sample as exported. Every field is optional: Takeout data is
/// messy, and a partially filled entry must not fail the whole file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    #[serde(default)]
    pub latitude_e7: Option<i64>,
    #[serde(default)]
    pub longitude_e7: Option<i64>,
    /// Epoch milliseconds, exported as a decimal string in older dumps and
    /// as a plain number in newer ones.
    #[serde(default, deserialize_with = "parse_timestamp_ms")]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Activity detection passes, each carrying a list of candidates.
    #[serde(default)]
    pub activity: Option<Vec<DetectionPass>>,
}

#[derive(Debug, Deserialize)]
pub struct DetectionPass {
    #[serde(default)]
    pub activity: Vec<ActivityCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityCandidate {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub confidence: f64,
}

fn parse_timestamp_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MsField {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<MsField>::deserialize(deserializer)? {
        Some(MsField::Number(ms)) => Some(ms),
        Some(MsField::Text(text)) => text.parse().ok(),
        None => None,
    })
}

impl RawSample {
    /// Resolves the sample's activity label from its first detection pass:
    /// the candidate with the highest confidence wins, ties keep the
    /// reported order. Later passes are ignored. Samples without detection
    /// data resolve to [`UNKNOWN_ACTIVITY`].
    pub fn most_likely_activity(&self) -> String {
        let Some(first_pass) = self.activity.as_ref().and_then(|passes| passes.first()) else {
            return UNKNOWN_ACTIVITY.to_string();
        };

        let mut candidates: Vec<&ActivityCandidate> = first_pass.activity.iter().collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        match candidates.first() {
            Some(best) => best.kind.clone(),
            None => UNKNOWN_ACTIVITY.to_string(),
        }
    }

    fn track_point(&self) -> TrackPoint {
        TrackPoint {
            longitude: degrees(self.longitude_e7),
            latitude: degrees(self.latitude_e7),
            timestamp_ms: self.timestamp_ms,
            accuracy: self.accuracy,
            activity: self.most_likely_activity(),
        }
    }
}

/// E7 fixed-point to decimal degrees. Absent coordinates become `NaN`.
fn degrees(e7: Option<i64>) -> f64 {
    match e7 {
        Some(value) => value as f64 / 1e7,
        None => f64::NAN,
    }
}

/// Normalizes a location history into a time-ordered point sequence.
///
/// The sort is stable: samples sharing a timestamp keep their input order,
/// and samples without one sort before all timestamped ones.
pub fn extract_track_points(history: &LocationHistory) -> Vec<TrackPoint> {
    let mut samples: Vec<&RawSample> = history.locations.iter().collect();
    samples.sort_by_key(|sample| sample.timestamp_ms);
    samples.into_iter().map(RawSample::track_point).collect()
}

pub fn read_location_history(path: &Path) -> Result<LocationHistory, Box<dyn Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let history = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("{} is not a valid location history file: {e}", path.display()))?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(value: serde_json::Value) -> RawSample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_sample_with_string_timestamp() {
        let sample = sample(json!({
            "timestampMs": "1507330772000",
            "latitudeE7": 525162750,
            "longitudeE7": 133777040,
            "accuracy": 21
        }));

        assert_eq!(sample.timestamp_ms, Some(1507330772000));
        assert_eq!(sample.latitude_e7, Some(525162750));
        assert_eq!(sample.longitude_e7, Some(133777040));
        assert_eq!(sample.accuracy, Some(21.0));
    }

    #[test]
    fn test_parse_sample_with_numeric_timestamp() {
        let sample = sample(json!({
            "timestampMs": 1507330772000i64,
            "latitudeE7": 525162750,
            "longitudeE7": 133777040
        }));

        assert_eq!(sample.timestamp_ms, Some(1507330772000));
    }

    #[test]
    fn test_parse_sample_with_garbage_timestamp() {
        let sample = sample(json!({ "timestampMs": "not-a-number" }));
        assert_eq!(sample.timestamp_ms, None);
    }

    #[test]
    fn test_parse_sample_missing_everything() {
        let sample = sample(json!({}));

        assert_eq!(sample.timestamp_ms, None);
        assert_eq!(sample.accuracy, None);
        assert_eq!(sample.most_likely_activity(), UNKNOWN_ACTIVITY);

        let point = sample.track_point();
        assert!(point.longitude.is_nan());
        assert!(point.latitude.is_nan());
    }

    #[test]
    fn test_most_likely_activity_picks_highest_confidence() {
        let sample = sample(json!({
            "activity": [
                {
                    "timestampMs": "1507330772000",
                    "activity": [
                        { "type": "WALKING", "confidence": 0.3 },
                        { "type": "IN_VEHICLE", "confidence": 0.9 }
                    ]
                }
            ]
        }));

        assert_eq!(sample.most_likely_activity(), "IN_VEHICLE");
    }

    #[test]
    fn test_most_likely_activity_only_first_pass_counts() {
        let sample = sample(json!({
            "activity": [
                {
                    "activity": [{ "type": "WALKING", "confidence": 40 }]
                },
                {
                    "activity": [{ "type": "IN_VEHICLE", "confidence": 99 }]
                }
            ]
        }));

        assert_eq!(sample.most_likely_activity(), "WALKING");
    }

    #[test]
    fn test_most_likely_activity_confidence_tie_keeps_reported_order() {
        let sample = sample(json!({
            "activity": [
                {
                    "activity": [
                        { "type": "ON_BICYCLE", "confidence": 50 },
                        { "type": "RUNNING", "confidence": 50 }
                    ]
                }
            ]
        }));

        assert_eq!(sample.most_likely_activity(), "ON_BICYCLE");
    }

    #[test]
    fn test_most_likely_activity_empty_candidate_list() {
        let sample = sample(json!({ "activity": [ { "activity": [] } ] }));
        assert_eq!(sample.most_likely_activity(), UNKNOWN_ACTIVITY);
    }

    #[test]
    fn test_extract_track_points_converts_coordinates() {
        let history: LocationHistory = serde_json::from_value(json!({
            "locations": [{
                "timestampMs": "1507330772000",
                "latitudeE7": 525162750,
                "longitudeE7": 133777040,
                "accuracy": 12
            }]
        }))
        .unwrap();

        let points = extract_track_points(&history);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].latitude, 52.516275);
        assert_eq!(points[0].longitude, 13.377704);
        assert_eq!(points[0].timestamp_ms, Some(1507330772000));
        assert_eq!(points[0].accuracy, Some(12.0));
        assert_eq!(points[0].activity, UNKNOWN_ACTIVITY);
    }

    #[test]
    fn test_extract_track_points_sorts_by_timestamp() {
        let history: LocationHistory = serde_json::from_value(json!({
            "locations": [
                { "timestampMs": "3000", "latitudeE7": 3, "longitudeE7": 3 },
                { "timestampMs": "1000", "latitudeE7": 1, "longitudeE7": 1 },
                { "timestampMs": "2000", "latitudeE7": 2, "longitudeE7": 2 }
            ]
        }))
        .unwrap();

        let timestamps: Vec<Option<i64>> = extract_track_points(&history)
            .iter()
            .map(|point| point.timestamp_ms)
            .collect();
        assert_eq!(timestamps, vec![Some(1000), Some(2000), Some(3000)]);
    }

    #[test]
    fn test_extract_track_points_sort_is_stable() {
        let history: LocationHistory = serde_json::from_value(json!({
            "locations": [
                { "timestampMs": "1000", "accuracy": 1 },
                { "timestampMs": "1000", "accuracy": 2 },
                { "timestampMs": "500", "accuracy": 3 }
            ]
        }))
        .unwrap();

        let accuracies: Vec<Option<f64>> = extract_track_points(&history)
            .iter()
            .map(|point| point.accuracy)
            .collect();
        assert_eq!(accuracies, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_extract_track_points_empty_history() {
        let history: LocationHistory = serde_json::from_value(json!({ "locations": [] })).unwrap();
        assert!(extract_track_points(&history).is_empty());

        // a dump without a locations field at all is treated as empty
        let history: LocationHistory = serde_json::from_value(json!({})).unwrap();
        assert!(extract_track_points(&history).is_empty());
    }
}
