//! Pull request model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a pull request. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Merged => write!(f, "MERGED"),
        }
    }
}

/// Input for creating a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// A pull request with its assigned reviewers.
///
/// `assigned_reviewers` is not a column; it is hydrated from `pr_reviewers`
/// and kept sorted by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PullRequest {
    pub pull_request_id: String,

    pub pull_request_name: String,

    /// User id of the author. May dangle after the author is removed.
    pub author_id: String,

    pub status: PullRequestStatus,

    /// Creation timestamp (Unix millis).
    pub created_at: i64,

    /// Merge timestamp (Unix millis, if merged).
    pub merged_at: Option<i64>,

    #[sqlx(skip)]
    pub assigned_reviewers: Vec<String>,
}

impl PullRequest {
    /// Check if the pull request is merged.
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    /// Check if a user is currently assigned as reviewer.
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }
}

/// Summary row returned by the per-reviewer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rejects_unknown_values() {
        let parsed: PullRequestStatus = serde_json::from_str("\"OPEN\"").unwrap();
        assert_eq!(parsed, PullRequestStatus::Open);
        assert!(serde_json::from_str::<PullRequestStatus>("\"CLOSED\"").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PullRequestStatus::Open.to_string(), "OPEN");
        assert_eq!(PullRequestStatus::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&PullRequestStatus::Merged).unwrap();
        assert_eq!(json, "\"MERGED\"");
    }

    #[test]
    fn test_has_reviewer() {
        let pr = PullRequest {
            pull_request_id: "pr-1".to_string(),
            pull_request_name: "Add search".to_string(),
            author_id: "u1".to_string(),
            status: PullRequestStatus::Open,
            created_at: 0,
            merged_at: None,
            assigned_reviewers: vec!["u2".to_string(), "u3".to_string()],
        };
        assert!(pr.has_reviewer("u3"));
        assert!(!pr.has_reviewer("u1"));
        assert!(!pr.is_merged());
    }
}
