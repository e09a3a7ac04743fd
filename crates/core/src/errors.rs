use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::request::{RequestId, RequestStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid request transition from {from:?} to {to:?}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },
    #[error("request title must not be empty")]
    EmptyTitle,
    #[error("estimated hours must not be negative, got {0}")]
    NegativeHours(Decimal),
    #[error("approving {requested}h would overdraw the monthly budget ({remaining}h remaining)")]
    InsufficientBudget { requested: Decimal, remaining: Decimal },
    #[error("unknown request id `{0}`")]
    UnknownRequest(RequestId),
    #[error("invalid month key `{0}` (expected YYYY-MM)")]
    InvalidMonthKey(String),
}
