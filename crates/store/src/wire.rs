//! Sheet wire schema and its translation to the canonical model.
//!
//! The remote columns use capitalized headers, embed the comment list as a
//! JSON string, and split each attachment slot into a type/data column pair.
//! None of that casing leaks past this module. Decoding is tolerant: rows
//! written by older clients degrade (unknown status falls back to pending,
//! malformed comments decode to an empty list) instead of failing the fetch.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use ciboard_core::{
    Attachment, AttachmentKind, Comment, DataUri, MonthKey, Request, RequestId, RequestStatus,
};

use crate::StoreSnapshot;

/// One spreadsheet row. Every column is a string or number at rest, so most
/// fields arrive optional even when the canonical model requires them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestRow {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "EstimatedHours", default)]
    pub estimated_hours: Option<f64>,
    #[serde(rename = "Priority", default)]
    pub priority: Option<u32>,
    #[serde(rename = "ApprovedMonth", default)]
    pub approved_month: Option<String>,
    #[serde(rename = "EstimatedCompletionDate", default)]
    pub estimated_completion_date: Option<NaiveDate>,
    #[serde(rename = "CompletedDate", default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(rename = "Comments", default)]
    pub comments: Option<String>,
    #[serde(rename = "SubmitterAttachmentType", default)]
    pub submitter_attachment_type: Option<String>,
    #[serde(rename = "SubmitterAttachmentData", default)]
    pub submitter_attachment_data: Option<String>,
    #[serde(rename = "EstimatorAttachmentType", default)]
    pub estimator_attachment_type: Option<String>,
    #[serde(rename = "EstimatorAttachmentData", default)]
    pub estimator_attachment_data: Option<String>,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RequestRow {
    pub fn from_request(request: &Request) -> Self {
        let (submitter_type, submitter_data) = attachment_columns(&request.submitter_attachment);
        let (estimator_type, estimator_data) = attachment_columns(&request.estimator_attachment);

        Self {
            id: request.id.0.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            status: Some(request.status.as_str().to_string()),
            estimated_hours: request.estimated_hours.and_then(|hours| hours.to_f64()),
            priority: request.priority,
            approved_month: request.approved_month.as_ref().map(|month| month.as_str().to_string()),
            estimated_completion_date: request.estimated_completion_date,
            completed_date: request.completed_date,
            comments: encode_comments(&request.id, &request.comments),
            submitter_attachment_type: submitter_type,
            submitter_attachment_data: submitter_data,
            estimator_attachment_type: estimator_type,
            estimator_attachment_data: estimator_data,
            created_at: Some(request.created_at),
        }
    }

    /// Translates a row back into the canonical model. Rows without an id are
    /// unusable and dropped; every other defect degrades field by field.
    pub fn into_request(self) -> Option<Request> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            warn!("dropping request row without an id");
            return None;
        }

        let status = match self.status.as_deref() {
            None | Some("") => RequestStatus::Pending,
            Some(raw) => RequestStatus::parse(raw).unwrap_or_else(|| {
                warn!(request_id = %id, status = raw, "unknown status, falling back to pending");
                RequestStatus::Pending
            }),
        };

        let estimated_hours = self.estimated_hours.and_then(|hours| {
            let parsed = Decimal::from_f64(hours);
            if parsed.is_none() {
                warn!(request_id = %id, hours, "unparseable hour estimate, dropping");
            }
            parsed
        });

        let approved_month = self.approved_month.as_deref().filter(|raw| !raw.is_empty()).and_then(
            |raw| match MonthKey::parse(raw) {
                Ok(month) => Some(month),
                Err(_) => {
                    warn!(request_id = %id, month = raw, "invalid approval month, dropping");
                    None
                }
            },
        );

        Some(Request {
            id: RequestId(id.clone()),
            title: self.title,
            description: self.description.filter(|text| !text.trim().is_empty()),
            status,
            estimated_hours,
            priority: self.priority,
            approved_month,
            estimated_completion_date: self.estimated_completion_date,
            completed_date: self.completed_date,
            comments: decode_comments(&id, self.comments.as_deref()),
            submitter_attachment: decode_attachment(
                &id,
                self.submitter_attachment_type.as_deref(),
                self.submitter_attachment_data.as_deref(),
            ),
            estimator_attachment: decode_attachment(
                &id,
                self.estimator_attachment_type.as_deref(),
                self.estimator_attachment_data.as_deref(),
            ),
            created_at: self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        })
    }

    /// Flattens the row into form fields for a mutation POST. The full record
    /// is always sent; absent values become empty columns.
    pub fn to_form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Id", self.id.clone()),
            ("Title", self.title.clone()),
            ("Description", self.description.clone().unwrap_or_default()),
            ("Status", self.status.clone().unwrap_or_default()),
            (
                "EstimatedHours",
                self.estimated_hours.map(|hours| hours.to_string()).unwrap_or_default(),
            ),
            ("Priority", self.priority.map(|priority| priority.to_string()).unwrap_or_default()),
            ("ApprovedMonth", self.approved_month.clone().unwrap_or_default()),
            (
                "EstimatedCompletionDate",
                self.estimated_completion_date.map(|date| date.to_string()).unwrap_or_default(),
            ),
            (
                "CompletedDate",
                self.completed_date.map(|at| at.to_rfc3339()).unwrap_or_default(),
            ),
            ("Comments", self.comments.clone().unwrap_or_default()),
            (
                "SubmitterAttachmentType",
                self.submitter_attachment_type.clone().unwrap_or_default(),
            ),
            (
                "SubmitterAttachmentData",
                self.submitter_attachment_data.clone().unwrap_or_default(),
            ),
            (
                "EstimatorAttachmentType",
                self.estimator_attachment_type.clone().unwrap_or_default(),
            ),
            (
                "EstimatorAttachmentData",
                self.estimator_attachment_data.clone().unwrap_or_default(),
            ),
            ("CreatedAt", self.created_at.map(|at| at.to_rfc3339()).unwrap_or_default()),
        ]
    }
}

fn attachment_columns(attachment: &Option<Attachment>) -> (Option<String>, Option<String>) {
    match attachment {
        Some(attachment) => (
            Some(attachment.kind.as_str().to_string()),
            Some(attachment.data.as_str().to_string()),
        ),
        None => (None, None),
    }
}

fn decode_attachment(
    request_id: &str,
    kind: Option<&str>,
    data: Option<&str>,
) -> Option<Attachment> {
    let data = data.filter(|raw| !raw.is_empty())?;
    let raw_kind = kind.unwrap_or_default();
    let kind = match AttachmentKind::parse(raw_kind) {
        Some(kind) => kind,
        None => {
            warn!(request_id, kind = raw_kind, "unknown attachment kind, dropping slot");
            return None;
        }
    };
    Some(Attachment { kind, data: DataUri::new(data) })
}

fn encode_comments(id: &RequestId, comments: &[Comment]) -> Option<String> {
    if comments.is_empty() {
        return None;
    }
    match serde_json::to_string(comments) {
        Ok(encoded) => Some(encoded),
        Err(error) => {
            warn!(request_id = %id, error = %error, "failed to encode comments");
            None
        }
    }
}

fn decode_comments(request_id: &str, raw: Option<&str>) -> Vec<Comment> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Vec::new(),
    };

    match serde_json::from_str(raw) {
        Ok(comments) => comments,
        Err(error) => {
            warn!(request_id, error = %error, "malformed embedded comments, dropping");
            Vec::new()
        }
    }
}

/// `getAll` response envelope.
#[derive(Debug, Deserialize)]
pub struct GetAllResponse {
    #[serde(default)]
    pub requests: Vec<RequestRow>,
    #[serde(default)]
    pub history: BTreeMap<String, f64>,
    #[serde(default)]
    pub settings: Option<SettingsWire>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsWire {
    #[serde(default)]
    pub current_month: Option<String>,
}

impl GetAllResponse {
    pub fn into_snapshot(self) -> StoreSnapshot {
        let requests = self.requests.into_iter().filter_map(RequestRow::into_request).collect();

        let mut history = BTreeMap::new();
        for (raw_month, hours) in self.history {
            let Ok(month) = MonthKey::parse(&raw_month) else {
                warn!(month = %raw_month, "invalid history month key, skipping");
                continue;
            };
            let Some(hours) = Decimal::from_f64(hours) else {
                warn!(month = %raw_month, hours, "unparseable history hours, skipping");
                continue;
            };
            history.insert(month, hours);
        }

        let current_month = self
            .settings
            .and_then(|settings| settings.current_month)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match MonthKey::parse(&raw) {
                Ok(month) => Some(month),
                Err(_) => {
                    warn!(month = %raw, "invalid stored current month, ignoring");
                    None
                }
            });

        StoreSnapshot { requests, history, current_month }
    }
}

/// Mutation acknowledgement envelope shared by add, update, and delete.
#[derive(Debug, Deserialize)]
pub struct MutationAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
