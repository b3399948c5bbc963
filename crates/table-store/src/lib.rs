//! Remote table store abstraction.
//!
//! The synchronizer and the mutation helpers talk to a remote document
//! only through [`RemoteTableStore`]:
//!
//! - [`grist-client`](../grist_client/index.html) implements it over HTTP
//! - [`MemoryTableStore`] implements it in memory and records every call
//!
//! # Example
//!
//! ```rust
//! use table_store::{MemoryTableStore, RemoteTableStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryTableStore::new().with_table("Fruit", ["Name", "Num"]);
//! assert!(store.fetch("Fruit", None).await.unwrap().is_empty());
//! # });
//! ```

pub mod memory;
pub mod traits;

pub use memory::{MemoryTableStore, StoreCall};
pub use traits::{Filters, RemoteTableStore};
