use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

/// The two parties who post on a request: the team submitting improvement
/// work and the engineering side estimating and delivering it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAuthor {
    Submitter,
    Estimator,
}

impl CommentAuthor {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitter" => Some(Self::Submitter),
            "estimator" => Some(Self::Estimator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitter => "submitter",
            Self::Estimator => "estimator",
        }
    }
}

impl std::fmt::Display for CommentAuthor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable once created; comments are only ever appended to a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: CommentAuthor,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::CommentAuthor;

    #[test]
    fn author_round_trips_through_string_form() {
        for author in [CommentAuthor::Submitter, CommentAuthor::Estimator] {
            assert_eq!(CommentAuthor::parse(author.as_str()), Some(author));
        }
    }

    #[test]
    fn unknown_author_is_rejected() {
        assert_eq!(CommentAuthor::parse("management"), None);
    }
}
