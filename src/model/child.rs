use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, GroupId};

/// Unique child identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildId(pub Uuid);

impl ChildId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique child-record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A child enrolled at the institution. Belongs to exactly one parent
/// account, optionally to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    pub parent_id: AccountId,
    pub group_id: Option<GroupId>,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Child {
    pub fn new(parent_id: AccountId, name: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self {
            id: ChildId::new(),
            parent_id,
            group_id: None,
            name: name.into(),
            date_of_birth,
            created_at: Utc::now(),
        }
    }
}

/// Kind of child-owned record produced by the surrounding CRUD layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Activity,
    Meal,
    Media,
    Progress,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Activity => "activity",
            RecordKind::Meal => "meal",
            RecordKind::Media => "media",
            RecordKind::Progress => "progress",
        }
    }
}

/// An activity/meal/media/progress row. The CRUD layer owns the payload
/// shape; the kernel only needs the ownership edges to scope it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: RecordId,
    pub child_id: ChildId,
    /// Denormalized owner, kept in lockstep with the child row.
    pub parent_id: AccountId,
    pub author: AccountId,
    pub kind: RecordKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ChildRecord {
    pub fn new(
        child: &Child,
        author: AccountId,
        kind: RecordKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: RecordId::new(),
            child_id: child.id,
            parent_id: child.parent_id,
            author,
            kind,
            payload,
            created_at: Utc::now(),
        }
    }
}
