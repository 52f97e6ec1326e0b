//! Fetch error type for retry classification.

/// Error returned by a single isochrone request.
///
/// Every variant is retried by the batch loop; the HTTP status is kept so the
/// failure can be classified for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure reported by curl (DNS, connect, timeout, reset).
    #[error("network error: {0}")]
    Network(#[from] curl::Error),
    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {}", snippet(.body))]
    Http { status: u32, body: String },
    /// Well-formed response without a single feature.
    #[error("no features in isochrone response")]
    EmptyResult,
    /// Response body is not a feature collection.
    #[error("failed to parse isochrone response: {0}")]
    Parse(#[from] serde_json::Error),
    /// The blocking request task panicked or was cancelled by the runtime.
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

const SNIPPET_LEN: usize = 200;

fn snippet(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= SNIPPET_LEN {
        return body.to_string();
    }
    let cut: String = body.chars().take(SNIPPET_LEN).collect();
    format!("{cut}...")
}
