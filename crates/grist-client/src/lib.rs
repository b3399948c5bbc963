//! HTTP client for the Grist document API.
//!
//! [`GristClient`] implements [`table_store::RemoteTableStore`] over the
//! document's REST endpoints:
//!
//! - `GET tables/<table>/data[?filter=...]` - fetch
//! - `POST tables/<table>/data` - bulk add
//! - `PATCH tables/<table>/data` - bulk update
//! - `POST apply` with `BulkRemoveRecord` - bulk delete
//!
//! Requests failing with the transient lock-contention error are retried
//! according to [`RetryPolicy`]. In dry-run mode nothing but `GET` is sent.

pub mod client;
pub mod config;

pub use client::GristClient;
pub use config::{api_key_from, resolve_api_key, GristConfig, RetryPolicy, DEFAULT_SERVER};
