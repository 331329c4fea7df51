use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};
use takeout2geojson::{TraceSegment, TrackPoint};

/// Wraps normalized points into Point features carrying the resolved
/// activity plus, when the sample had them, accuracy and timestamp.
pub fn points_to_feature_collection(points: &[TrackPoint]) -> FeatureCollection {
    let features = points
        .iter()
        .map(|point| {
            let mut properties = Map::new();
            properties.insert(
                "activity".to_string(),
                JsonValue::from(point.activity.as_str()),
            );
            if let Some(accuracy) = point.accuracy {
                properties.insert("accuracy".to_string(), JsonValue::from(accuracy));
            }
            if let Some(timestamp_ms) = point.timestamp_ms {
                properties.insert("timestampMs".to_string(), JsonValue::from(timestamp_ms));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(point.coordinates().to_vec()))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Wraps trace segments into LineString features. A segment whose window
/// held no classified activity gets no activity property at all.
pub fn traces_to_feature_collection(traces: &[TraceSegment]) -> FeatureCollection {
    let features = traces
        .iter()
        .map(|trace| {
            let mut properties = Map::new();
            if let Some(activity) = &trace.activity {
                properties.insert("activity".to_string(), JsonValue::from(activity.as_str()));
            }

            let coordinates = trace
                .coordinates
                .iter()
                .map(|position| position.to_vec())
                .collect();

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(coordinates))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
