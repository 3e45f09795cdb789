use thiserror::Error;

/// Errors that can abort a stage of the monitor run.
///
/// Only `NoInstances` is fatal for the whole run; everything else is caught
/// at the stage that produced it and recorded in the report as data.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("the list of instances is empty")]
    NoInstances,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
