use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

/// Unique group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classroom group. Owned by exactly one teacher, provisioned by a
/// reception account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub teacher_id: AccountId,
    pub created_by: AccountId,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        teacher_id: AccountId,
        created_by: AccountId,
        capacity: u32,
    ) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            teacher_id,
            created_by,
            capacity,
            created_at: Utc::now(),
        }
    }
}
