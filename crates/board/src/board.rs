//! The request-board view-model: the local request collection, the month
//! ledger, and the reconciliation policy between local optimistic state and
//! the remote store.
//!
//! Mutations guard locally first; nothing is sent to the store unless the
//! domain accepts the change. Store failures are logged and swallowed (the
//! change stays pending and is retried implicitly on the next full-record
//! update), with one exception: `submit` surfaces its store error to the
//! caller.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use ciboard_core::budget::{remaining_hours, BudgetSummary, MonthLedger};
use ciboard_core::workflow::{next_priority, prioritized, reorder, ReorderDirection};
use ciboard_core::{
    Attachment, Comment, CommentAuthor, CommentId, DomainError, MonthKey, Request, RequestId,
    RequestStatus,
};
use ciboard_store::{RequestStore, StoreError};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a delete call under the two-step confirmation rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// First call: the id is armed, nothing was removed.
    Armed,
    Deleted,
}

pub struct RequestBoard<S> {
    store: Arc<S>,
    monthly_budget: Decimal,
    requests: Vec<Request>,
    ledger: MonthLedger,
    /// Ids whose local version has not been acknowledged by the store yet.
    pending: HashSet<RequestId>,
    armed_delete: Option<RequestId>,
    syncing: bool,
}

impl<S: RequestStore> RequestBoard<S> {
    pub fn new(store: Arc<S>, monthly_budget: Decimal) -> Self {
        Self {
            store,
            monthly_budget,
            requests: Vec::new(),
            ledger: MonthLedger::new(MonthKey::current()),
            pending: HashSet::new(),
            armed_delete: None,
            syncing: false,
        }
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn ledger(&self) -> &MonthLedger {
        &self.ledger
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    pub fn armed_delete(&self) -> Option<&RequestId> {
        self.armed_delete.as_ref()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Submits a new request optimistically: it appears locally under a
    /// synthesized id before the store answers, and is rebound to the
    /// store-assigned id on acknowledgement. This is the one mutation whose
    /// store failure reaches the caller; the local insert survives it either
    /// way.
    pub async fn submit(
        &mut self,
        title: &str,
        description: Option<String>,
        attachment: Option<Attachment>,
        now: DateTime<Utc>,
    ) -> Result<RequestId, BoardError> {
        let local_id = RequestId(format!("local-{}", Uuid::new_v4()));
        let request = Request::submit(local_id.clone(), title, description, attachment, now)?;

        self.requests.push(request.clone());
        self.pending.insert(local_id.clone());

        self.syncing = true;
        let outcome = self.store.add_request(&request).await;
        self.syncing = false;

        match outcome {
            Ok(store_id) => {
                if let Some(stored) = self.requests.iter_mut().find(|r| r.id == local_id) {
                    stored.id = store_id.clone();
                }
                self.pending.remove(&local_id);
                info!(request_id = %store_id, title, "request submitted");
                Ok(store_id)
            }
            Err(error) => {
                warn!(request_id = %local_id, error = %error, "submit failed, keeping local copy pending");
                Err(error.into())
            }
        }
    }

    /// Appends a comment locally and pushes the full record. Remote failure
    /// is swallowed; the comment stays visible and pending.
    pub async fn add_comment(
        &mut self,
        id: &RequestId,
        author: CommentAuthor,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        let request = self.find_mut(id)?;
        request.add_comment(Comment {
            id: CommentId(format!("C-{}", Uuid::new_v4())),
            author,
            text: text.to_string(),
            timestamp: now,
        });

        self.push_update(id).await;
        Ok(())
    }

    /// Estimates a pending request, assigning the next free priority slot.
    pub async fn estimate(
        &mut self,
        id: &RequestId,
        hours: Decimal,
        attachment: Option<Attachment>,
    ) -> Result<(), BoardError> {
        let priority = next_priority(&self.requests);
        let request = self.find_mut(id)?;
        request.estimate(hours, priority, attachment)?;

        self.push_update(id).await;
        Ok(())
    }

    pub async fn update_estimate(&mut self, id: &RequestId, hours: Decimal) -> Result<(), BoardError> {
        let request = self.find_mut(id)?;
        request.update_estimate(hours)?;

        self.push_update(id).await;
        Ok(())
    }

    /// Moves an estimated request one slot within the priority order. A
    /// boundary move is a silent no-op; otherwise both swapped records are
    /// pushed.
    pub async fn reorder(
        &mut self,
        id: &RequestId,
        direction: ReorderDirection,
    ) -> Result<(), BoardError> {
        self.find_mut(id)?;
        let Some((first, second)) = reorder(&mut self.requests, id, direction) else {
            return Ok(());
        };

        self.push_update(&first).await;
        self.push_update(&second).await;
        Ok(())
    }

    /// Whether approving the request would fit in what remains of this
    /// month's budget. Drives the disabled state of the approve action.
    pub fn can_approve(&self, id: &RequestId) -> bool {
        let Some(request) = self.requests.iter().find(|r| &r.id == id) else {
            return false;
        };
        if request.status != RequestStatus::Estimated {
            return false;
        }
        request.estimated_hours.unwrap_or_default() <= self.remaining_this_month()
    }

    /// Approves an estimated request against the current month's budget.
    /// Overdraw is rejected locally before any store traffic.
    pub async fn approve(&mut self, id: &RequestId) -> Result<(), BoardError> {
        let month = self.ledger.current_month().clone();
        let remaining = self.remaining_this_month();

        let request = self.find_mut(id)?;
        let requested = request.estimated_hours.unwrap_or_default();
        if requested > remaining {
            return Err(DomainError::InsufficientBudget { requested, remaining }.into());
        }
        request.approve(month)?;

        self.push_update(id).await;
        Ok(())
    }

    pub async fn set_completion_date(
        &mut self,
        id: &RequestId,
        date: NaiveDate,
    ) -> Result<(), BoardError> {
        let request = self.find_mut(id)?;
        request.set_completion_date(date)?;

        self.push_update(id).await;
        Ok(())
    }

    pub async fn mark_done(&mut self, id: &RequestId, now: DateTime<Utc>) -> Result<(), BoardError> {
        let request = self.find_mut(id)?;
        request.mark_done(now)?;

        self.push_update(id).await;
        Ok(())
    }

    pub async fn archive(&mut self, id: &RequestId) -> Result<(), BoardError> {
        let request = self.find_mut(id)?;
        request.archive()?;

        self.push_update(id).await;
        Ok(())
    }

    /// Two-step delete: the first call arms the id and removes nothing; the
    /// second call on the same id deletes. Calling with a different id moves
    /// the armed state to that id.
    pub async fn delete(&mut self, id: &RequestId) -> Result<DeleteOutcome, BoardError> {
        self.find_mut(id)?;

        if self.armed_delete.as_ref() != Some(id) {
            self.armed_delete = Some(id.clone());
            return Ok(DeleteOutcome::Armed);
        }
        self.armed_delete = None;

        self.syncing = true;
        if let Err(error) = self.store.delete_request(id).await {
            warn!(request_id = %id, error = %error, "store delete failed, removing locally anyway");
        }
        self.syncing = false;

        self.requests.retain(|request| &request.id != id);
        self.pending.remove(id);
        info!(request_id = %id, "request deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Full fetch and merge. The snapshot wins except where a local version
    /// is still pending acknowledgement; pending records absent from the
    /// snapshot (an unacked add, or a record the store lost) are retained.
    pub async fn refresh(&mut self) -> Result<(), BoardError> {
        self.syncing = true;
        let outcome = self.store.fetch_all().await;
        self.syncing = false;
        let snapshot = outcome?;

        let mut merged: Vec<Request> = snapshot
            .requests
            .into_iter()
            .map(|incoming| {
                if self.pending.contains(&incoming.id) {
                    self.requests
                        .iter()
                        .find(|local| local.id == incoming.id)
                        .cloned()
                        .unwrap_or(incoming)
                } else {
                    incoming
                }
            })
            .collect();

        for local in &self.requests {
            let known = merged.iter().any(|request| request.id == local.id);
            if !known && self.pending.contains(&local.id) {
                merged.push(local.clone());
            }
        }

        self.requests = merged;
        self.ledger.merge_history(&snapshot.history);
        if let Some(month) = snapshot.current_month {
            self.ledger.adopt_month(month);
        }
        if let Some(armed) = &self.armed_delete {
            if !self.requests.iter().any(|request| &request.id == armed) {
                self.armed_delete = None;
            }
        }

        info!(requests = self.requests.len(), pending = self.pending.len(), "board refreshed");
        Ok(())
    }

    /// Closes the budget month when the wall clock has moved past it.
    pub fn check_month_rollover(&mut self, now: DateTime<Utc>) -> Option<(MonthKey, Decimal)> {
        self.ledger.roll_over(&self.requests, MonthKey::from_datetime(now))
    }

    pub fn budget_summary(&self) -> BudgetSummary {
        BudgetSummary::compute(&self.requests, self.ledger.current_month(), self.monthly_budget)
    }

    pub fn pending_requests(&self) -> Vec<&Request> {
        self.requests.iter().filter(|r| r.status == RequestStatus::Pending).collect()
    }

    pub fn estimated_requests(&self) -> Vec<&Request> {
        prioritized(&self.requests, RequestStatus::Estimated)
    }

    pub fn approved_requests(&self) -> Vec<&Request> {
        prioritized(&self.requests, RequestStatus::Approved)
    }

    pub fn finished_requests(&self) -> Vec<&Request> {
        prioritized(&self.requests, RequestStatus::Finished)
    }

    /// Archived requests, most recently completed first.
    pub fn archived_requests(&self) -> Vec<&Request> {
        let mut archived: Vec<&Request> =
            self.requests.iter().filter(|r| r.status == RequestStatus::Archived).collect();
        archived.sort_by(|a, b| b.completed_date.cmp(&a.completed_date));
        archived
    }

    fn remaining_this_month(&self) -> Decimal {
        remaining_hours(&self.requests, self.ledger.current_month(), self.monthly_budget)
    }

    fn find_mut(&mut self, id: &RequestId) -> Result<&mut Request, DomainError> {
        self.requests
            .iter_mut()
            .find(|request| &request.id == id)
            .ok_or_else(|| DomainError::UnknownRequest(id.clone()))
    }

    /// Pushes the named record to the store in full. Failure keeps the local
    /// version pending; it rides along with the next successful push or
    /// survives the next refresh.
    async fn push_update(&mut self, id: &RequestId) {
        let Some(request) = self.requests.iter().find(|r| &r.id == id).cloned() else {
            return;
        };
        self.pending.insert(id.clone());

        self.syncing = true;
        match self.store.update_request(&request).await {
            Ok(()) => {
                self.pending.remove(id);
            }
            Err(error) => {
                warn!(request_id = %id, error = %error, "store update failed, keeping change pending");
            }
        }
        self.syncing = false;
    }
}
