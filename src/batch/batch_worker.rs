use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::{sync::Mutex, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{api::Fetcher, record::Batch};

use super::{
    batch_store::{BatchStore, EmptyBatchOutcome, StoreOutcome},
    coordinator::FetchRun,
    error::CoordinatorError,
};

struct BatchWorker<TFetcher: Fetcher> {
    worker_id: usize,
    run: Arc<FetchRun<TFetcher>>,
    store: Arc<Mutex<BatchStore>>,
    cancellation_token: CancellationToken,
}

impl<TFetcher: Fetcher> BatchWorker<TFetcher> {
    /// Cursor for the next request, or `None` once the run is done.
    async fn next_cursor(&self) -> Option<Option<i64>> {
        let store = self.store.lock().await;

        if store.is_done() {
            None
        } else {
            Some(store.cursor())
        }
    }

    /// Returns `true` when this batch finished the run. `requested_before` is
    /// the cursor the batch was fetched with.
    async fn handle_batch(
        &self,
        batch: Batch,
        requested_before: Option<i64>,
    ) -> Result<bool, CoordinatorError> {
        let run_id = self.run.run_id;
        let worker_id = self.worker_id;
        let mut store = self.store.lock().await;

        if batch.is_empty() {
            let outcome = store.register_empty(self.run.on_empty);

            warn!(
                "Received empty batch. [run_id = {run_id}, worker_id = {worker_id}, empty_streak = {}, outcome = {:?}]",
                store.empty_streak(),
                outcome
            );

            return Ok(outcome == EmptyBatchOutcome::Exhausted);
        }

        let batch_len = batch.len();
        let full = match store.store(batch, requested_before)? {
            StoreOutcome::Stored { full } => full,
            StoreOutcome::Stale => {
                debug!(
                    "Dropping page fetched at outdated cursor. [run_id = {run_id}, worker_id = {worker_id}, requested_before = {requested_before:?}, cursor = {:?}]",
                    store.cursor()
                );
                return Ok(false);
            }
            StoreOutcome::Closed => return Ok(true),
        };

        info!(
            "Stored batch. [run_id = {run_id}, worker_id = {worker_id}, records = {batch_len}, batches = {}/{}, cursor = {:?}]",
            store.len(),
            self.run.target_batches,
            store.cursor()
        );

        Ok(full)
    }
}

/// Fetches with `workers` concurrent tasks sharing one store and cursor until
/// the target is met, the source is exhausted or a fetch fails.
pub(crate) async fn run_workers<TFetcher: Fetcher>(
    run: Arc<FetchRun<TFetcher>>,
    workers: usize,
) -> Result<Vec<Batch>, CoordinatorError> {
    let store = Arc::new(Mutex::new(BatchStore::new(run.target_batches)));
    let cancellation_token = CancellationToken::new();
    let mut tasks = JoinSet::new();

    for worker_id in 0..workers {
        let worker = BatchWorker {
            worker_id,
            run: Arc::clone(&run),
            store: Arc::clone(&store),
            cancellation_token: cancellation_token.clone(),
        };

        tasks.spawn(run_worker(worker));
    }

    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(CoordinatorError::from).and_then(|result| result);

        if let Err(err) = outcome {
            cancellation_token.cancel();
            first_error.get_or_insert(err);
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    let batches = store.lock().await.drain();

    Ok(batches)
}

async fn run_worker<TFetcher: Fetcher>(worker: BatchWorker<TFetcher>) -> Result<(), CoordinatorError> {
    let run_id = worker.run.run_id;
    let worker_id = worker.worker_id;

    while let Some(cursor) = worker.next_cursor().await {
        let fetched = tokio::select! {
            _ = worker.cancellation_token.cancelled() => break,
            fetched = worker.run.fetch_page(cursor) => fetched,
        };

        let batch = match fetched {
            Ok(batch) => batch,
            Err(err) => {
                error!(
                    "Fetch failed, cancelling remaining workers. [run_id = {run_id}, worker_id = {worker_id}, cursor = {cursor:?}, error = {err}]"
                );
                worker.cancellation_token.cancel();
                return Err(err.into());
            }
        };

        match worker.handle_batch(batch, cursor).await {
            Ok(false) => {}
            Ok(true) => {
                worker.cancellation_token.cancel();
                break;
            }
            Err(err) => {
                worker.cancellation_token.cancel();
                return Err(err);
            }
        }
    }

    info!("Stopping batch worker. [run_id = {run_id}, worker_id = {worker_id}]");

    Ok(())
}
