use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

/// Unique document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review status. Pending transitions exactly once, to Approved or Rejected;
/// re-submission creates a new document row instead of re-reviewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DocumentStatus::Pending)
    }
}

/// A submitted verification document.
///
/// The file bytes live in the external storage collaborator; only the
/// opaque `file_ref` is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: AccountId,
    pub document_type: String,
    pub file_ref: String,
    pub status: DocumentStatus,
    pub reviewed_by: Option<AccountId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Document {
    pub fn pending(owner: AccountId, document_type: impl Into<String>, file_ref: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            owner,
            document_type: document_type.into(),
            file_ref: file_ref.into(),
            status: DocumentStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_at: Utc::now(),
        }
    }
}
