use std::{sync::Arc, time::Duration};

use log::{info, warn};
use uuid::Uuid;

use crate::{
    api::{endpoint::strip_reserved_params, FetchError, Fetcher, QueryParams},
    record::{Batch, DedupKey},
};

use super::{batch_worker, error::CoordinatorError, result_set::ResultSet, sequential};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_EMPTY_RETRIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// `workers` tasks fetch in parallel against one shared cursor.
    Concurrent { workers: usize },
    /// One request at a time, fully ordered.
    Sequential,
}

/// How an empty page from the source is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBatchPolicy {
    /// The first empty page ends the run.
    Stop,
    /// Keep fetching until `max_consecutive` empty pages arrive in a row.
    Retry { max_consecutive: usize },
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub subreddit: String,
    /// Run stops once this many non-empty pages were accumulated.
    pub target_batches: usize,
    pub params: QueryParams,
    pub mode: FetchMode,
    pub on_empty: EmptyBatchPolicy,
    pub dedup_key: DedupKey,
    pub fetch_timeout: Option<Duration>,
}

impl FetchRequest {
    /// Concurrent request with bounded retries on empty pages.
    pub fn new(subreddit: impl Into<String>, target_batches: usize) -> Self {
        Self {
            subreddit: subreddit.into(),
            target_batches,
            params: QueryParams::new(),
            mode: FetchMode::Concurrent {
                workers: DEFAULT_WORKERS,
            },
            on_empty: EmptyBatchPolicy::Retry {
                max_consecutive: DEFAULT_MAX_EMPTY_RETRIES,
            },
            dedup_key: DedupKey::default(),
            fetch_timeout: None,
        }
    }

    /// Switches to one-at-a-time fetching that stops at the first empty page.
    pub fn sequential(mut self) -> Self {
        self.mode = FetchMode::Sequential;
        self.on_empty = EmptyBatchPolicy::Stop;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.mode = FetchMode::Concurrent { workers };
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_empty_policy(mut self, on_empty: EmptyBatchPolicy) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn with_dedup_key(mut self, dedup_key: DedupKey) -> Self {
        self.dedup_key = dedup_key;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = Some(fetch_timeout);
        self
    }

    fn validate(&self) -> Result<(), CoordinatorError> {
        if self.target_batches == 0 {
            return Err(CoordinatorError::InvalidRequest(
                "target_batches must be at least 1".to_string(),
            ));
        }

        if let FetchMode::Concurrent { workers: 0 } = self.mode {
            return Err(CoordinatorError::InvalidRequest(
                "workers must be at least 1".to_string(),
            ));
        }

        if let EmptyBatchPolicy::Retry { max_consecutive: 0 } = self.on_empty {
            return Err(CoordinatorError::InvalidRequest(
                "max_consecutive empty retries must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Per-run state shared by every worker of a run.
pub(crate) struct FetchRun<TFetcher: Fetcher> {
    pub run_id: Uuid,
    pub fetcher: Arc<TFetcher>,
    pub subreddit: String,
    pub params: QueryParams,
    pub target_batches: usize,
    pub on_empty: EmptyBatchPolicy,
    pub fetch_timeout: Option<Duration>,
}

impl<TFetcher: Fetcher> FetchRun<TFetcher> {
    /// One Fetcher call, bounded by the run's deadline if set.
    pub async fn fetch_page(&self, before: Option<i64>) -> Result<Batch, FetchError> {
        let fetch = self.fetcher.fetch(&self.subreddit, &self.params, before);

        match self.fetch_timeout {
            Some(deadline) => tokio::time::timeout(deadline, fetch)
                .await
                .map_err(|_| FetchError::Timeout(deadline))?,
            None => fetch.await,
        }
    }
}

pub struct BatchCoordinator<TFetcher: Fetcher> {
    fetcher: Arc<TFetcher>,
}

impl<TFetcher: Fetcher> BatchCoordinator<TFetcher> {
    pub fn new(fetcher: Arc<TFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn run(&self, request: FetchRequest) -> Result<ResultSet, CoordinatorError> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let (params, dropped) = strip_reserved_params(&request.params);

        if !dropped.is_empty() {
            warn!(
                "Ignoring reserved query params. [run_id = {run_id}, params = {:?}]",
                dropped
            );
        }

        info!(
            "Starting fetch run. [run_id = {run_id}, subreddit = {}, target_batches = {}, mode = {:?}, on_empty = {:?}]",
            request.subreddit, request.target_batches, request.mode, request.on_empty
        );

        let run = Arc::new(FetchRun {
            run_id,
            fetcher: Arc::clone(&self.fetcher),
            subreddit: request.subreddit,
            params,
            target_batches: request.target_batches,
            on_empty: request.on_empty,
            fetch_timeout: request.fetch_timeout,
        });

        let batches = match request.mode {
            FetchMode::Concurrent { workers } => batch_worker::run_workers(run, workers).await?,
            FetchMode::Sequential => sequential::run(&run).await?,
        };

        let batch_count = batches.len();
        let result = ResultSet::from_batches(batches, &request.dedup_key);

        info!(
            "Finished fetch run. [run_id = {run_id}, batches = {batch_count}, unique_records = {}]",
            result.len()
        );

        Ok(result)
    }

    /// Runs [`BatchCoordinator::run`] to completion on a dedicated runtime.
    /// Must not be called from inside another tokio runtime.
    pub fn run_blocking(&self, request: FetchRequest) -> Result<ResultSet, CoordinatorError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        runtime.block_on(self.run(request))
    }
}
