//! Classify fetch failures into diagnostic classes.
//!
//! The class never changes whether a point succeeded or whether it is
//! retried; it only feeds the run journal and the final summary.

use crate::fetch::FetchError;

/// Likely cause of a failed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorClass {
    /// 401 / 403: key missing, invalid or lacking permission.
    Authentication,
    /// 402: account quota used up.
    Quota,
    /// 429: too many requests.
    RateLimit,
    /// 400: coordinates or parameters rejected.
    InvalidRequest,
    /// 5xx.
    ServerError,
    /// Transport failure before any HTTP status.
    Network,
    /// Valid response with zero features.
    EmptyResponse,
    /// Body was not a feature collection.
    Parse,
    /// Point had non-finite coordinates; never sent.
    Validation,
    /// Anything else (other statuses, task failures).
    Unknown,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Authentication => "authentication",
            ErrorClass::Quota => "quota",
            ErrorClass::RateLimit => "rate_limit",
            ErrorClass::InvalidRequest => "invalid_request",
            ErrorClass::ServerError => "server_error",
            ErrorClass::Network => "network",
            ErrorClass::EmptyResponse => "empty_response",
            ErrorClass::Parse => "parse",
            ErrorClass::Validation => "validation",
            ErrorClass::Unknown => "unknown",
        }
    }

    pub fn possible_cause(self) -> &'static str {
        match self {
            ErrorClass::Authentication => "Invalid, expired or under-privileged API key",
            ErrorClass::Quota => "API quota exceeded",
            ErrorClass::RateLimit => "Rate limit exceeded",
            ErrorClass::InvalidRequest => "Invalid coordinates or request parameters",
            ErrorClass::ServerError => "Isochrone service server error",
            ErrorClass::Network => "Network connectivity issue",
            ErrorClass::EmptyResponse => "No isochrone could be generated for this location",
            ErrorClass::Parse => "Service returned a body that is not a feature collection",
            ErrorClass::Validation => "Station has missing or non-numeric coordinates",
            ErrorClass::Unknown => "Unexpected error",
        }
    }

    pub fn suggestion(self) -> &'static str {
        match self {
            ErrorClass::Authentication => "Check api_key in config.toml or the ORS_API_KEY variable",
            ErrorClass::Quota => "Check the isochrone service account quota",
            ErrorClass::RateLimit => "Increase inter_request_delay_ms",
            ErrorClass::InvalidRequest => {
                "Verify coordinates are valid (lon: -180 to 180, lat: -90 to 90)"
            }
            ErrorClass::ServerError => "Retry later or check the service status",
            ErrorClass::Network => "Check internet connection and endpoint",
            ErrorClass::EmptyResponse => {
                "Location may be in an area without walking routes (water, restricted area)"
            }
            ErrorClass::Parse => "Check that the endpoint is an isochrone API",
            ErrorClass::Validation => "Fix the station's longitude/latitude in the input",
            ErrorClass::Unknown => "Inspect the run log for details",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorClass {
    match code {
        401 | 403 => ErrorClass::Authentication,
        402 => ErrorClass::Quota,
        429 => ErrorClass::RateLimit,
        400 => ErrorClass::InvalidRequest,
        500..=599 => ErrorClass::ServerError,
        _ => ErrorClass::Unknown,
    }
}

/// Classify a fetch error.
pub fn classify(e: &FetchError) -> ErrorClass {
    match e {
        FetchError::Network(_) => ErrorClass::Network,
        FetchError::Http { status, .. } => classify_http_status(*status),
        FetchError::EmptyResult => ErrorClass::EmptyResponse,
        FetchError::Parse(_) => ErrorClass::Parse,
        FetchError::Task(_) => ErrorClass::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses() {
        assert_eq!(classify_http_status(401), ErrorClass::Authentication);
        assert_eq!(classify_http_status(403), ErrorClass::Authentication);
    }

    #[test]
    fn rate_limit_quota_and_bad_request() {
        assert_eq!(classify_http_status(429), ErrorClass::RateLimit);
        assert_eq!(classify_http_status(402), ErrorClass::Quota);
        assert_eq!(classify_http_status(400), ErrorClass::InvalidRequest);
    }

    #[test]
    fn server_errors() {
        assert_eq!(classify_http_status(500), ErrorClass::ServerError);
        assert_eq!(classify_http_status(503), ErrorClass::ServerError);
    }

    #[test]
    fn other_statuses_unknown() {
        assert_eq!(classify_http_status(404), ErrorClass::Unknown);
        assert_eq!(classify_http_status(302), ErrorClass::Unknown);
    }

    #[test]
    fn fetch_errors() {
        assert_eq!(classify(&FetchError::EmptyResult), ErrorClass::EmptyResponse);
        assert_eq!(
            classify(&FetchError::Network(curl::Error::new(7))),
            ErrorClass::Network
        );
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(classify(&FetchError::Parse(parse)), ErrorClass::Parse);
        assert_eq!(
            classify(&FetchError::Http {
                status: 429,
                body: String::new()
            }),
            ErrorClass::RateLimit
        );
    }
}
