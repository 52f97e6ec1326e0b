//! Request body for the isochrone endpoint.

use std::num::NonZeroU32;

use crate::point::Point;

/// One isochrone request: a point and a travel-time range in seconds.
///
/// Built once per point; every retry of that point sends the same body.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneRequest {
    pub point: Point,
    pub range_seconds: NonZeroU32,
}

impl IsochroneRequest {
    pub fn new(point: Point, range_seconds: NonZeroU32) -> Self {
        Self {
            point,
            range_seconds,
        }
    }

    /// JSON body: `{"locations":[[lon,lat]],"range":[secs],"range_type":"time"}`.
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::json!({
            "locations": [[self.point.longitude, self.point.latitude]],
            "range": [self.range_seconds.get()],
            "range_type": "time",
        })
    }

    /// `body_json` serialized for the wire.
    pub fn body(&self) -> String {
        self.body_json().to_string()
    }
}
