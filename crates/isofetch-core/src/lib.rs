pub mod batch;
pub mod config;
pub mod control;
pub mod export;
pub mod fetch;
pub mod journal;
pub mod logging;
pub mod point;
pub mod retry;
pub mod stations;

pub use batch::{BatchOrchestrator, BatchRun, PointStatus, ProgressEvent};
pub use control::CancelToken;
pub use fetch::{CurlClient, FetchError, IsochroneRequest, IsochroneResult, IsochroneSource};
pub use point::{Category, Point};
pub use retry::RetryPolicy;
