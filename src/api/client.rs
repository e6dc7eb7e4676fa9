pub mod reqwest_api_client;

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Batch;

/// Extra query parameters forwarded verbatim to the search endpoint.
pub type QueryParams = BTreeMap<String, String>;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0:?}")]
    Request(#[from] reqwest::Error),

    #[error("API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize JSON from response: {source}\nRaw response: {raw}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("Fetch did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Other error: {0:?}")]
    Other(#[from] anyhow::Error),
}

/// Performs a single page request against the submission source.
///
/// `before` asks for records strictly older than the given epoch second.
/// An exhausted source is reported as an empty batch, never as an error.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(
        &self,
        subreddit: &str,
        params: &QueryParams,
        before: Option<i64>,
    ) -> FetchResult<Batch>;
}
