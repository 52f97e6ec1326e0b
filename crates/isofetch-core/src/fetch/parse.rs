//! Parse isochrone response bodies into a feature collection.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::FetchError;

/// A GeoJSON feature: geometry plus arbitrary key/value properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// A GeoJSON feature collection. Members other than `features` (bbox,
/// service metadata) are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
            extra: Map::new(),
        }
    }
}

/// `"features": null` reads as no features.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Feature>>::deserialize(deserializer)?.unwrap_or_default())
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// Parse a response body. A body that is not a JSON object fails with
/// `Parse`; an object without features (missing or empty array) fails with
/// `EmptyResult`.
pub(crate) fn parse_feature_collection(body: &[u8]) -> Result<FeatureCollection, FetchError> {
    let collection: FeatureCollection = serde_json::from_slice(body)?;
    if collection.features.is_empty() {
        return Err(FetchError::EmptyResult);
    }
    Ok(collection)
}
