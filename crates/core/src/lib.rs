pub mod budget;
pub mod config;
pub mod domain;
pub mod encoder;
pub mod errors;
pub mod workflow;

pub use budget::{approved_hours, budget_percentage, remaining_hours, BudgetSummary, MonthLedger};
pub use domain::attachment::{Attachment, AttachmentKind, DataUri};
pub use domain::comment::{Comment, CommentAuthor, CommentId};
pub use domain::month::MonthKey;
pub use domain::request::{Request, RequestId, RequestStatus};
pub use encoder::{Base64FileEncoder, FileEncoder};
pub use errors::DomainError;
pub use workflow::{next_priority, prioritized, reorder, ReorderDirection};
