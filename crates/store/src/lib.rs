//! Remote boundary for the request collection.
//!
//! The canonical model lives in `ciboard-core`; this crate owns everything
//! the remote store is allowed to see. `RequestStore` is the seam, `SheetStore`
//! the HTTP adapter speaking the form-encoded sheet protocol, and
//! `InMemoryStore` the test double used by the board suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use ciboard_core::{MonthKey, Request, RequestId};

pub mod memory;
pub mod sheet;
pub mod wire;

pub use memory::InMemoryStore;
pub use sheet::SheetStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected the mutation: {0}")]
    Rejected(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Everything one `getAll` round-trip returns: the full request collection,
/// the rolled-over monthly history, and the store's idea of the active month
/// (absent on stores that never persisted one).
#[derive(Clone, Debug, Default)]
pub struct StoreSnapshot {
    pub requests: Vec<Request>,
    pub history: BTreeMap<MonthKey, Decimal>,
    pub current_month: Option<MonthKey>,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn fetch_all(&self) -> Result<StoreSnapshot, StoreError>;

    /// The store may assign its own id; callers must rebind to the returned
    /// one.
    async fn add_request(&self, request: &Request) -> Result<RequestId, StoreError>;

    /// Always carries the complete record, never a partial patch.
    async fn update_request(&self, request: &Request) -> Result<(), StoreError>;

    async fn delete_request(&self, id: &RequestId) -> Result<(), StoreError>;
}
