pub mod api;
pub mod batch;
pub mod record;
pub mod settings;
pub mod shaping;

pub use api::{FetchError, Fetcher, ReqwestApiClient};
pub use batch::{
    BatchCoordinator, CoordinatorError, EmptyBatchPolicy, FetchMode, FetchRequest, ResultSet,
};
pub use record::{Batch, DedupKey, Record};
