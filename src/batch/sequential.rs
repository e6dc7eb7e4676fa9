use log::{error, info, warn};

use crate::{api::Fetcher, record::Batch};

use super::{batch_store::BatchStore, coordinator::FetchRun, error::CoordinatorError};

/// Fetches one page at a time, moving the cursor after every page.
pub(crate) async fn run<TFetcher: Fetcher>(
    run: &FetchRun<TFetcher>,
) -> Result<Vec<Batch>, CoordinatorError> {
    let run_id = run.run_id;
    let mut store = BatchStore::new(run.target_batches);

    while !store.is_done() {
        let cursor = store.cursor();
        let batch = match run.fetch_page(cursor).await {
            Ok(batch) => batch,
            Err(err) => {
                error!("Fetch failed. [run_id = {run_id}, cursor = {cursor:?}, error = {err}]");
                return Err(err.into());
            }
        };

        if batch.is_empty() {
            let outcome = store.register_empty(run.on_empty);
            warn!(
                "Received empty batch. [run_id = {run_id}, empty_streak = {}, outcome = {:?}]",
                store.empty_streak(),
                outcome
            );
            continue;
        }

        let batch_len = batch.len();
        store.store(batch, cursor)?;

        info!(
            "Stored batch. [run_id = {run_id}, records = {batch_len}, batches = {}/{}, cursor = {:?}]",
            store.len(),
            run.target_batches,
            store.cursor()
        );
    }

    Ok(store.drain())
}
