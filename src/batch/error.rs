use thiserror::Error;

use crate::api::FetchError;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Batch of {batch_len} records has no usable `created_utc`, cursor cannot advance")]
    MissingTimestamps { batch_len: usize },

    #[error("Invalid fetch request: {0}")]
    InvalidRequest(String),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
