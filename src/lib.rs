use std::collections::HashMap;
use time::Duration;

/// Label carried by samples without any activity detection data.
pub const UNKNOWN_ACTIVITY: &str = "UNKNOWN";

/// A trace is closed when consecutive points are further apart than this in time.
pub const MAX_TIME_GAP: Duration = Duration::minutes(5);

/// A trace is closed when consecutive points are further apart than this, in kilometers.
pub const MAX_DISTANCE_KM: f64 = 1.0;

/// A location sample after normalization: decimal-degree coordinates, epoch
/// milliseconds, and one resolved activity label.
///
/// Coordinates of a sample that lacked them are `NaN`; a `NaN` distance never
/// exceeds a gap threshold, so such points accumulate instead of breaking a
/// trace.
#[derive(Debug, Clone)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp_ms: Option<i64>,
    pub accuracy: Option<f64>,
    pub activity: String,
}

impl TrackPoint {
    /// Coordinates in GeoJSON order, longitude first.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A maximal run of track points with no qualifying time or distance gap,
/// reduced to a coordinate path and one representative activity.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSegment {
    pub coordinates: Vec<[f64; 2]>,
    pub activity: Option<String>,
}

/// Calculates the great-circle distance between two `[longitude, latitude]`
/// pairs in decimal degrees using the haversine formula, in kilometers.
///
/// Assumes a spherical Earth with the mean radius of 6371 km, which keeps the
/// result within 0.3% of ellipsoid formulations over trace-scale distances.
///
/// References:
/// - R.W. Sinnott, "Virtues of the Haversine", Sky and Telescope, vol. 68, no. 2, 1984, p. 159
/// - https://www.movable-type.co.uk/scripts/latlong.html
pub fn haversine_distance_km(from: [f64; 2], to: [f64; 2]) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let [lon1, lat1] = from;
    let [lon2, lat2] = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // c = 2 ⋅ atan2(√a, √(1−a))
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Picks the representative activity for a window of labels: the most
/// frequent one, ties going to the label seen most recently.
pub fn dominant_activity(activities: &[String]) -> Option<String> {
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, activity) in activities.iter().enumerate() {
        let entry = tally.entry(activity).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = index;
    }

    tally
        .into_iter()
        .max_by_key(|&(_, count_and_last_seen)| count_and_last_seen)
        .map(|(activity, _)| activity.to_string())
}

/// Splits a time-ordered point sequence into movement traces.
///
/// Walks consecutive pairs and closes the current window whenever the pair
/// is separated by more than [`MAX_TIME_GAP`] or [`MAX_DISTANCE_KM`]. Points
/// without a timestamp never open a time gap. The point that triggers a
/// break is not carried into the next window, and the first point of the
/// sequence is never accumulated at all. The window still open when the
/// input ends is discarded rather than flushed.
pub fn segment_traces(points: &[TrackPoint]) -> Vec<TraceSegment> {
    let mut traces = Vec::new();
    let mut coordinates: Vec<[f64; 2]> = Vec::new();
    let mut activities: Vec<String> = Vec::new();

    for pair in points.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        let time_gap = match (prev.timestamp_ms, cur.timestamp_ms) {
            (Some(prev_ms), Some(cur_ms)) => {
                Duration::milliseconds((cur_ms - prev_ms).abs()) > MAX_TIME_GAP
            }
            _ => false,
        };
        let distance_km = haversine_distance_km(prev.coordinates(), cur.coordinates());

        if time_gap || distance_km > MAX_DISTANCE_KM {
            traces.push(TraceSegment {
                activity: dominant_activity(&activities),
                coordinates: std::mem::take(&mut coordinates),
            });
            activities.clear();
        } else {
            if cur.activity != UNKNOWN_ACTIVITY {
                activities.push(cur.activity.clone());
            }
            coordinates.push(cur.coordinates());
        }
    }

    traces
}
