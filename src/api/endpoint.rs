use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::record::Batch;

use super::client::{FetchError, FetchResult, QueryParams};

pub const DEFAULT_BASE_URL: &str = "https://api.pushshift.io";
pub const SUBMISSION_SEARCH_PATH: &str = "/reddit/search/submission";
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Query keys owned by the client and coordinator. Callers cannot override them.
pub const RESERVED_PARAMS: [&str; 3] = ["subreddit", "size", "before"];

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct SubmissionQuery<'a> {
    pub subreddit: &'a str,
    pub size: u32,
    #[serde(flatten)]
    pub params: &'a QueryParams,
    pub before: Option<i64>,
}

impl<'a> SubmissionQuery<'a> {
    pub fn new(
        subreddit: &'a str,
        size: u32,
        params: &'a QueryParams,
        before: Option<i64>,
    ) -> Self {
        Self {
            subreddit,
            size,
            params,
            before,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionSearchResponse {
    pub data: Batch,
}

pub fn parse_search_response(raw: String) -> FetchResult<Batch> {
    match serde_json::from_str::<SubmissionSearchResponse>(&raw) {
        Ok(parsed) => Ok(parsed.data),
        Err(e) => Err(FetchError::Deserialize { source: e, raw }),
    }
}

/// Removes reserved keys from caller supplied params, returning the cleaned
/// params and the names that were dropped.
pub fn strip_reserved_params(params: &QueryParams) -> (QueryParams, Vec<String>) {
    let mut dropped = Vec::new();
    let cleaned = params
        .iter()
        .filter(|(key, _)| {
            let reserved = RESERVED_PARAMS.contains(&key.as_str());
            if reserved {
                dropped.push(key.to_string());
            }
            !reserved
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    (cleaned, dropped)
}
