use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::attachment::Attachment;
use crate::domain::comment::Comment;
use crate::domain::month::MonthKey;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Estimated,
    Approved,
    Finished,
    Archived,
}

impl RequestStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "estimated" => Some(Self::Estimated),
            "approved" => Some(Self::Approved),
            "finished" => Some(Self::Finished),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Estimated => "estimated",
            Self::Approved => "approved",
            Self::Finished => "finished",
            Self::Archived => "archived",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub title: String,
    pub description: Option<String>,
    pub status: RequestStatus,
    pub estimated_hours: Option<Decimal>,
    pub priority: Option<u32>,
    pub approved_month: Option<MonthKey>,
    pub estimated_completion_date: Option<NaiveDate>,
    pub completed_date: Option<DateTime<Utc>>,
    pub comments: Vec<Comment>,
    pub submitter_attachment: Option<Attachment>,
    pub estimator_attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// Builds a freshly submitted request. The only hard validation at
    /// submission time is a non-empty title.
    pub fn submit(
        id: RequestId,
        title: &str,
        description: Option<String>,
        submitter_attachment: Option<Attachment>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.to_string(),
            description: description.filter(|text| !text.trim().is_empty()),
            status: RequestStatus::Pending,
            estimated_hours: None,
            priority: None,
            approved_month: None,
            estimated_completion_date: None,
            completed_date: None,
            comments: Vec::new(),
            submitter_attachment,
            estimator_attachment: None,
            created_at,
        })
    }

    /// Self-edges cover in-place edits: re-estimating while estimated and
    /// setting a completion date while approved.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (&self.status, next),
            (RequestStatus::Pending, RequestStatus::Estimated)
                | (RequestStatus::Estimated, RequestStatus::Estimated)
                | (RequestStatus::Estimated, RequestStatus::Approved)
                | (RequestStatus::Approved, RequestStatus::Approved)
                | (RequestStatus::Approved, RequestStatus::Finished)
                | (RequestStatus::Finished, RequestStatus::Archived)
        )
    }

    fn transition_to(&mut self, next: RequestStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidTransition { from: self.status, to: next })
    }

    /// `pending -> estimated`: records hours, takes the priority slot the
    /// caller computed over the active prioritized set, and optionally
    /// captures the estimator's supporting file.
    pub fn estimate(
        &mut self,
        hours: Decimal,
        priority: u32,
        estimator_attachment: Option<Attachment>,
    ) -> Result<(), DomainError> {
        if hours < Decimal::ZERO {
            return Err(DomainError::NegativeHours(hours));
        }
        if self.status != RequestStatus::Pending {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: RequestStatus::Estimated,
            });
        }

        self.transition_to(RequestStatus::Estimated)?;
        self.estimated_hours = Some(hours);
        self.priority = Some(priority);
        self.estimator_attachment = estimator_attachment;
        Ok(())
    }

    /// Replaces the hour estimate while still estimated; priority is
    /// untouched.
    pub fn update_estimate(&mut self, hours: Decimal) -> Result<(), DomainError> {
        if hours < Decimal::ZERO {
            return Err(DomainError::NegativeHours(hours));
        }
        if self.status != RequestStatus::Estimated {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: RequestStatus::Estimated,
            });
        }

        self.estimated_hours = Some(hours);
        Ok(())
    }

    /// `estimated -> approved`: anchors the request to the budget month in
    /// which it consumed capacity. The anchor is set exactly once and never
    /// changes afterwards.
    pub fn approve(&mut self, month: MonthKey) -> Result<(), DomainError> {
        if self.status != RequestStatus::Estimated {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: RequestStatus::Approved,
            });
        }

        self.transition_to(RequestStatus::Approved)?;
        self.approved_month = Some(month);
        Ok(())
    }

    pub fn set_completion_date(&mut self, date: NaiveDate) -> Result<(), DomainError> {
        if self.status != RequestStatus::Approved {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: RequestStatus::Approved,
            });
        }

        self.estimated_completion_date = Some(date);
        Ok(())
    }

    pub fn mark_done(&mut self, completed_at: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(RequestStatus::Finished)?;
        self.completed_date = Some(completed_at);
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        self.transition_to(RequestStatus::Archived)
    }

    /// Append-only; the existing sequence is never shrunk or reordered.
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Priority is meaningful only for these two statuses.
    pub fn is_active_prioritized(&self) -> bool {
        matches!(self.status, RequestStatus::Estimated | RequestStatus::Approved)
    }

    /// Statuses whose hours stay anchored to their approval month.
    pub fn counts_against_budget(&self) -> bool {
        matches!(
            self.status,
            RequestStatus::Approved | RequestStatus::Finished | RequestStatus::Archived
        )
    }
}
