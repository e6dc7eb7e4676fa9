use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{StatusCode, Url};

use crate::{
    api::endpoint::{parse_search_response, SubmissionQuery, SUBMISSION_SEARCH_PATH},
    record::Batch,
};

use super::{FetchError, FetchResult, Fetcher, QueryParams};

pub struct ReqwestApiClient {
    search_url: Url,
    page_size: u32,
    pub client: reqwest::Client,
}

impl ReqwestApiClient {
    pub fn new(base_url: &str, page_size: u32, request_timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            search_url: base_url.join(SUBMISSION_SEARCH_PATH)?,
            page_size,
            client,
        })
    }

    fn search_request(
        &self,
        subreddit: &str,
        params: &QueryParams,
        before: Option<i64>,
    ) -> reqwest::RequestBuilder {
        let query = SubmissionQuery::new(subreddit, self.page_size, params, before);

        self.client.get(self.search_url.clone()).query(&query)
    }
}

#[async_trait]
impl Fetcher for ReqwestApiClient {
    async fn fetch(
        &self,
        subreddit: &str,
        params: &QueryParams,
        before: Option<i64>,
    ) -> FetchResult<Batch> {
        let request = self.search_request(subreddit, params, before).build()?;

        debug!("Sending search request. [url = {}]", request.url());

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        read_search_response(status, body)
    }
}

/// Turns a search response into a batch. Non-success statuses are errors even
/// when the body parses.
fn read_search_response(status: StatusCode, body: String) -> FetchResult<Batch> {
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    parse_search_response(body)
}
