//! GeoJSON export of a finished batch.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::batch::{AttemptOutcome, BatchRun};
use crate::fetch::FeatureCollection;

/// All polygons of successful stations in one collection, in run order.
///
/// Every feature keeps its own properties and is tagged with `station`,
/// `category`, `color` and `range_seconds`.
pub fn merge_results(run: &BatchRun) -> FeatureCollection {
    let mut features = Vec::new();
    for outcome in run.outcomes() {
        let AttemptOutcome::Success(result) = &outcome.outcome else {
            continue;
        };
        for feature in &result.features.features {
            let mut feature = feature.clone();
            let props = feature.properties.get_or_insert_with(Map::new);
            props.insert("station".into(), json!(outcome.name));
            props.insert("category".into(), json!(result.point.category));
            props.insert("color".into(), json!(result.point.display_color()));
            props.insert("range_seconds".into(), json!(result.range_seconds.get()));
            features.push(feature);
        }
    }
    FeatureCollection::new(features)
}

/// Write `collection` as pretty-printed GeoJSON.
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let text = serde_json::to_string_pretty(collection)?;
    std::fs::write(path, text).with_context(|| format!("write geojson {}", path.display()))
}

/// `isochrones_10min_merged.geojson`, or `isochrones_90s_merged.geojson`
/// when the range is not a whole number of minutes.
pub fn default_file_name(range_seconds: u32) -> String {
    if range_seconds % 60 == 0 {
        format!("isochrones_{}min_merged.geojson", range_seconds / 60)
    } else {
        format!("isochrones_{}s_merged.geojson", range_seconds)
    }
}

/// Count of features per category, for the CLI summary.
pub fn category_counts(collection: &FeatureCollection) -> Map<String, Value> {
    let mut counts = Map::new();
    for feature in &collection.features {
        let category = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("category"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let n = counts.get(&category).and_then(Value::as_u64).unwrap_or(0);
        counts.insert(category, json!(n + 1));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::CancelToken;
    use crate::fetch::{Feature, FetchError, IsochroneRequest, IsochroneResult, IsochroneSource};
    use crate::journal::NullSink;
    use crate::point::{Category, Point};
    use crate::BatchOrchestrator;
    use std::num::NonZeroU32;
    use std::time::Duration;

    /// Two features per station; stations west of 0 fail.
    struct TwoRings;

    impl IsochroneSource for TwoRings {
        fn fetch(&self, request: &IsochroneRequest) -> Result<IsochroneResult, FetchError> {
            if request.point.longitude < 0.0 {
                return Err(FetchError::Http {
                    status: 400,
                    body: String::new(),
                });
            }
            let feature = |v: u32| Feature {
                kind: "Feature".into(),
                geometry: json!({"type": "Polygon", "coordinates": []}),
                properties: Some(
                    json!({"value": v}).as_object().cloned().unwrap_or_default(),
                ),
            };
            Ok(IsochroneResult::new(
                request,
                FeatureCollection::new(vec![feature(1), feature(2)]),
            ))
        }
    }

    async fn sample_run() -> BatchRun {
        let points = vec![
            Point::new(1.0, 1.0, Category::Tram).with_name("Souq"),
            Point::new(-1.0, 1.0, Category::Metro).with_name("Broken"),
            Point::new(2.0, 2.0, Category::Metro)
                .with_name("Park")
                .with_line("Green"),
        ];
        BatchOrchestrator::new(TwoRings)
            .with_inter_request_delay(Duration::ZERO)
            .with_retry_policy(crate::RetryPolicy::new(1, Duration::ZERO).unwrap())
            .run(
                &points,
                NonZeroU32::new(900).unwrap(),
                &CancelToken::new(),
                None,
                &NullSink,
            )
            .await
    }

    #[tokio::test]
    async fn merges_successful_stations_with_tags() {
        let run = sample_run().await;
        let merged = merge_results(&run);
        assert_eq!(merged.kind, "FeatureCollection");
        assert_eq!(merged.features.len(), 4);

        let first = merged.features[0].properties.as_ref().unwrap();
        assert_eq!(first["station"], "Souq");
        assert_eq!(first["category"], "tram");
        assert_eq!(first["color"], "#FF8C00");
        assert_eq!(first["range_seconds"], 900);
        assert_eq!(first["value"], 1);

        let last = merged.features[3].properties.as_ref().unwrap();
        assert_eq!(last["station"], "Park");
        assert_eq!(last["color"], "#00AA00");

        let counts = category_counts(&merged);
        assert_eq!(counts["tram"], 2);
        assert_eq!(counts["metro"], 2);
    }

    #[tokio::test]
    async fn writes_geojson_file() {
        let run = sample_run().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_file_name(900));
        write_geojson(&path, &merge_results(&run)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 4);
        assert!(path.ends_with("isochrones_15min_merged.geojson"));
    }

    #[test]
    fn default_file_names() {
        assert_eq!(default_file_name(600), "isochrones_10min_merged.geojson");
        assert_eq!(default_file_name(90), "isochrones_90s_merged.geojson");
    }
}
