use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Portal roles. Fixed at account creation, never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Reception,
    Teacher,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Reception => "reception",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "reception" => Some(Role::Reception),
            "teacher" => Some(Role::Teacher),
            "parent" => Some(Role::Parent),
            _ => None,
        }
    }

    /// Whether an account of this role may be provisioned by a principal of
    /// the given role. `None` means bootstrap (no creating principal).
    ///
    /// The `created_by` links form a forest: admins at the roots (bootstrap
    /// or provisioned by super-admin/admin), reception under admins, and
    /// teacher/parent under reception.
    pub fn may_be_created_by(&self, creator: Option<Role>) -> bool {
        match self {
            Role::SuperAdmin => creator.is_none(),
            Role::Admin => matches!(creator, None | Some(Role::SuperAdmin) | Some(Role::Admin)),
            Role::Reception => creator == Some(Role::Admin),
            Role::Teacher | Role::Parent => creator == Some(Role::Reception),
        }
    }

    /// Only reception accounts are gated on document review; the activation
    /// triad is inert for every other role.
    pub fn uses_activation_gate(&self) -> bool {
        matches!(self, Role::Reception)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A portal account.
///
/// `password_hash` is excluded from serialization unconditionally; the only
/// comparison primitive is `Directory::verify_password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Stored normalized (lowercase); uniqueness is case-insensitive.
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    /// The account that provisioned this one. None for bootstrap roots.
    pub created_by: Option<AccountId>,
    /// Caseload edge for parents, independent of the creation tree.
    pub teacher_id: Option<AccountId>,
    pub group_id: Option<super::GroupId>,
    /// Has the account ever submitted at least one document.
    pub is_verified: bool,
    /// True iff the account has >= 1 document and all are approved.
    pub documents_approved: bool,
    /// Whether login is currently permitted (reception only; inert elsewhere).
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Normalize an email for storage and lookup.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_forest_edges() {
        assert!(Role::Admin.may_be_created_by(None));
        assert!(Role::Admin.may_be_created_by(Some(Role::Admin)));
        assert!(Role::Admin.may_be_created_by(Some(Role::SuperAdmin)));
        assert!(Role::Reception.may_be_created_by(Some(Role::Admin)));
        assert!(Role::Teacher.may_be_created_by(Some(Role::Reception)));
        assert!(Role::Parent.may_be_created_by(Some(Role::Reception)));

        assert!(!Role::Reception.may_be_created_by(Some(Role::Reception)));
        assert!(!Role::Teacher.may_be_created_by(Some(Role::Admin)));
        assert!(!Role::Parent.may_be_created_by(None));
        assert!(!Role::SuperAdmin.may_be_created_by(Some(Role::Admin)));
    }

    #[test]
    fn role_round_trips_as_str() {
        for role in [
            Role::SuperAdmin,
            Role::Admin,
            Role::Reception,
            Role::Teacher,
            Role::Parent,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("janitor"), None);
    }

    #[test]
    fn serialized_account_never_carries_hash() {
        let account = Account {
            id: AccountId::new(),
            email: "r@nido.test".into(),
            name: "Front Desk".into(),
            password_hash: "$2b$12$secret".into(),
            role: Role::Reception,
            created_by: None,
            teacher_id: None,
            group_id: None,
            is_verified: false,
            documents_approved: false,
            is_active: false,
            created_at: Utc::now(),
            deactivated_at: None,
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }
}
