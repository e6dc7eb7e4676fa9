use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::json;

use crate::{
    api::{FetchError, FetchResult, Fetcher, QueryParams},
    record::{Batch, Record},
};

pub enum Step {
    Page(Batch),
    Fail(&'static str),
    Hang,
}

/// Replays a fixed script of steps, ignoring `before`. Once the script runs
/// out it pages through `source` the way the real API does: newest first,
/// `page_size` records strictly older than `before`.
pub struct ScriptedFetcher {
    steps: Mutex<VecDeque<Step>>,
    source: Vec<Record>,
    page_size: usize,
    cursors: Mutex<Vec<Option<i64>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            source: Vec::new(),
            page_size: 0,
            cursors: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn pages(pages: Vec<Batch>) -> Self {
        Self::new(pages.into_iter().map(Step::Page).collect())
    }

    /// Source backed by `pages`, which must be equally sized and ordered
    /// newest first. Requests are answered according to `before`.
    pub fn paged(pages: Vec<Batch>) -> Self {
        let page_size = pages.first().map(Vec::len).unwrap_or_default();

        Self {
            source: pages.into_iter().flatten().collect(),
            page_size,
            ..Self::new(Vec::new())
        }
    }

    /// Steps answered before falling back to the paged source.
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = Mutex::new(steps.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `before` argument of every call, in call order.
    pub fn cursors(&self) -> Vec<Option<i64>> {
        self.cursors.lock().unwrap().clone()
    }

    fn page_before(&self, before: Option<i64>) -> Batch {
        self.source
            .iter()
            .filter(|record| match (before, record.created_utc()) {
                (Some(before), Some(created_utc)) => created_utc < before,
                _ => true,
            })
            .take(self.page_size)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _subreddit: &str,
        _params: &QueryParams,
        before: Option<i64>,
    ) -> FetchResult<Batch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cursors.lock().unwrap().push(before);
        let step = self.steps.lock().unwrap().pop_front();

        // Let other workers interleave the way a real request would.
        tokio::task::yield_now().await;

        match step {
            Some(Step::Page(page)) => Ok(page),
            Some(Step::Fail(reason)) => Err(FetchError::Other(anyhow!(reason))),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(self.page_before(before)),
        }
    }
}

pub fn batch(items: &[(&str, i64)]) -> Batch {
    items
        .iter()
        .map(|(title, created_utc)| {
            serde_json::from_value::<Record>(json!({
                "title": title,
                "created_utc": created_utc,
                "selftext": format!("body of {title}"),
            }))
            .unwrap()
        })
        .collect()
}

/// `count` pages of `size` uniquely titled records with strictly decreasing
/// timestamps across and within pages.
pub fn descending_pages(count: usize, size: usize) -> Vec<Batch> {
    let mut created_utc = 1_000_000_i64;

    (0..count)
        .map(|page| {
            let titles: Vec<_> = (0..size).map(|i| format!("p{page}-r{i}")).collect();
            let items: Vec<_> = titles
                .iter()
                .map(|title| {
                    created_utc -= 1;
                    (title.as_str(), created_utc)
                })
                .collect();
            batch(&items)
        })
        .collect()
}
