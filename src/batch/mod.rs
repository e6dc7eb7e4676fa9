pub mod batch_store;
mod batch_worker;
pub mod coordinator;
pub mod error;
pub mod result_set;
mod sequential;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{BatchCoordinator, EmptyBatchPolicy, FetchMode, FetchRequest};
pub use error::CoordinatorError;
pub use result_set::ResultSet;
