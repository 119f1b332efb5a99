use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PayloadError, StatusSample};

/// Why a poll produced no sample
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("invalid payload: {0}")]
    Payload(#[from] PayloadError),
}

/// Port for fetching the current status sample
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Issue exactly one uncached request for live data
    async fn fetch_status(&self) -> Result<StatusSample, FetchError>;
}
