pub mod client;
pub mod endpoint;

pub use client::{reqwest_api_client::ReqwestApiClient, FetchError, FetchResult, Fetcher, QueryParams};
