//! In-memory store used by the board test suites.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use ciboard_core::{MonthKey, Request, RequestId};

use crate::{RequestStore, StoreError, StoreSnapshot};

#[derive(Default)]
struct State {
    requests: BTreeMap<String, Request>,
    history: BTreeMap<MonthKey, Decimal>,
    current_month: Option<MonthKey>,
    next_id: u64,
}

/// Honors the same contract as the HTTP adapter, including store-assigned
/// ids. Writes can be toggled to fail for exercising the optimistic paths.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing id assignment, as if another
    /// client had written it.
    pub async fn seed(&self, request: Request) {
        let mut state = self.state.write().await;
        state.requests.insert(request.id.0.clone(), request);
    }

    pub async fn set_current_month(&self, month: MonthKey) {
        self.state.write().await.current_month = Some(month);
    }

    pub async fn set_history(&self, month: MonthKey, hours: Decimal) {
        self.state.write().await.history.insert(month, hours);
    }

    /// When enabled, every mutation is rejected; fetches still succeed.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, id: &RequestId) -> Option<Request> {
        self.state.read().await.requests.get(&id.0).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.requests.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.requests.is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn fetch_all(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.state.read().await;
        Ok(StoreSnapshot {
            requests: state.requests.values().cloned().collect(),
            history: state.history.clone(),
            current_month: state.current_month.clone(),
        })
    }

    async fn add_request(&self, request: &Request) -> Result<RequestId, StoreError> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = RequestId(format!("REQ-{}", state.next_id));

        let mut stored = request.clone();
        stored.id = id.clone();
        state.requests.insert(id.0.clone(), stored);
        Ok(id)
    }

    async fn update_request(&self, request: &Request) -> Result<(), StoreError> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        if !state.requests.contains_key(&request.id.0) {
            return Err(StoreError::Rejected(format!("unknown request `{}`", request.id)));
        }
        state.requests.insert(request.id.0.clone(), request.clone());
        Ok(())
    }

    async fn delete_request(&self, id: &RequestId) -> Result<(), StoreError> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        if state.requests.remove(&id.0).is_none() {
            return Err(StoreError::Rejected(format!("unknown request `{id}`")));
        }
        Ok(())
    }
}
