//! Record mutation planning and table synchronization.
//!
//! - [`planner`] - add/update/delete request shaping and the store calls
//!   behind [`add_records`], [`update_records`], [`delete_records`] and
//!   [`fetch_table`]
//! - [`sync`] - [`sync_table`], which diffs external records against the
//!   remote table by key and sends the minimal updates and adds
//!
//! Nothing here is transactional: when a store call fails, the batches sent
//! before it stay applied and the rest are not sent.

pub mod planner;
pub mod sync;

pub use planner::{
    add_records, delete_records, fetch_table, plan_adds, plan_updates, update_records, RecordDict,
};
pub use sync::{plan_sync, sync_table, SyncOptions, SyncPlan, SyncSummary};
