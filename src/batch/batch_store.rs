use crate::record::{oldest_created_utc, Batch};

use super::{coordinator::EmptyBatchPolicy, error::CoordinatorError};

/// What to do after the source returned an empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBatchOutcome {
    Retry,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored { full: bool },
    /// Fetched against an outdated cursor and not counted.
    Stale,
    /// Arrived after the run was finished and not counted.
    Closed,
}

/// Accumulated batches together with the pagination cursor.
///
/// Workers share one store behind a single lock so that appending a batch,
/// counting it and moving the cursor happen as one step.
pub struct BatchStore {
    batches: Vec<Batch>,
    cursor: Option<i64>,
    target_batches: usize,
    empty_streak: usize,
    exhausted: bool,
}

impl BatchStore {
    pub fn new(target_batches: usize) -> Self {
        Self {
            batches: Vec::new(),
            cursor: None,
            target_batches,
            empty_streak: 0,
            exhausted: false,
        }
    }

    /// Stores a non-empty batch fetched with `requested_before` and lowers the
    /// cursor to its oldest timestamp.
    ///
    /// A page only counts when it was requested at the current cursor. Pages
    /// fetched against a cursor another worker has already moved past repeat
    /// progress that is already stored, so they are dropped as stale.
    pub fn store(
        &mut self,
        batch: Batch,
        requested_before: Option<i64>,
    ) -> Result<StoreOutcome, CoordinatorError> {
        let Some(batch_min) = oldest_created_utc(&batch) else {
            return Err(CoordinatorError::MissingTimestamps {
                batch_len: batch.len(),
            });
        };

        if self.is_done() {
            return Ok(StoreOutcome::Closed);
        }

        if requested_before != self.cursor {
            return Ok(StoreOutcome::Stale);
        }

        // Never move back up, even if the source ignores `before`.
        self.cursor = Some(match self.cursor {
            Some(current) => current.min(batch_min),
            None => batch_min,
        });
        self.empty_streak = 0;
        self.batches.push(batch);

        Ok(StoreOutcome::Stored {
            full: self.is_full(),
        })
    }

    /// Records an empty batch and decides, per policy, whether the source is done.
    pub fn register_empty(&mut self, policy: EmptyBatchPolicy) -> EmptyBatchOutcome {
        self.empty_streak += 1;

        let give_up = match policy {
            EmptyBatchPolicy::Stop => true,
            EmptyBatchPolicy::Retry { max_consecutive } => self.empty_streak >= max_consecutive,
        };

        if give_up {
            self.exhausted = true;
            EmptyBatchOutcome::Exhausted
        } else {
            EmptyBatchOutcome::Retry
        }
    }

    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.batches.len() >= self.target_batches
    }

    /// True once the target is met or the source has been declared exhausted.
    pub fn is_done(&self) -> bool {
        self.exhausted || self.is_full()
    }

    pub fn empty_streak(&self) -> usize {
        self.empty_streak
    }

    /// Empties the store, returning batches in arrival order.
    pub fn drain(&mut self) -> Vec<Batch> {
        std::mem::take(&mut self.batches)
    }
}
