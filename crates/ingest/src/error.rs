use thiserror::Error;

/// Failures that mean the input itself could not be fetched or parsed.
///
/// Model-side failures never show up here; those are reported by the
/// generator as error markers.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("uploaded document is not valid JSON")]
    InvalidJson,
    #[error("browser error: {0:#}")]
    Browser(anyhow::Error),
    #[error("browser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
