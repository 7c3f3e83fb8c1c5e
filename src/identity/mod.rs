//! Identity store: account provisioning, the creation-forest invariant,
//! and the password primitives.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::crypto;
use crate::error::AuthError;
use crate::model::{Account, AccountId, GroupId, Role};
use crate::scope::{check_write, Resource};
use crate::session::Principal;
use crate::store::{Store, StoreError};

/// Account-creation payload, discriminated by target role. Each variant
/// carries exactly the fields that role accepts; there is no loosely-typed
/// bag of optional keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum CreateAccountRequest {
    Admin {
        email: String,
        name: String,
        password: String,
    },
    Reception {
        email: String,
        name: String,
        password: String,
    },
    Teacher {
        email: String,
        name: String,
        password: String,
    },
    Parent {
        email: String,
        name: String,
        password: String,
        /// Caseload assignment, independent of the creation tree.
        teacher_id: Option<AccountId>,
        group_id: Option<GroupId>,
    },
}

impl CreateAccountRequest {
    pub fn role(&self) -> Role {
        match self {
            CreateAccountRequest::Admin { .. } => Role::Admin,
            CreateAccountRequest::Reception { .. } => Role::Reception,
            CreateAccountRequest::Teacher { .. } => Role::Teacher,
            CreateAccountRequest::Parent { .. } => Role::Parent,
        }
    }

    fn credentials(&self) -> (&str, &str, &str) {
        match self {
            CreateAccountRequest::Admin { email, name, password }
            | CreateAccountRequest::Reception { email, name, password }
            | CreateAccountRequest::Teacher { email, name, password }
            | CreateAccountRequest::Parent { email, name, password, .. } => {
                (email, name, password)
            }
        }
    }
}

pub struct Directory {
    store: Arc<dyn Store>,
}

impl Directory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Provision a new account.
    ///
    /// The creator must hold the unique permitted parent role for the
    /// target role (`None` is the bootstrap path for admin roots). New
    /// reception accounts start dormant; every other role is implicitly
    /// active.
    pub async fn create_account(
        &self,
        request: CreateAccountRequest,
        creator: Option<&Principal>,
    ) -> Result<Account, AuthError> {
        let role = request.role();
        if !role.may_be_created_by(creator.map(|p| p.role)) {
            return Err(AuthError::InvalidOwnership(format!(
                "a {} account cannot be provisioned by this principal",
                role
            )));
        }

        let (email, name, password) = request.credentials();
        let normalized = Account::normalize_email(email);
        if self.store.account_by_email(&normalized).await?.is_some() {
            return Err(AuthError::DuplicateEmail(normalized));
        }

        let (teacher_id, group_id) = self.validate_parent_edges(&request).await?;

        let gated = role.uses_activation_gate();
        let account = Account {
            id: AccountId::new(),
            email: normalized,
            name: name.to_string(),
            password_hash: crypto::hash_password(password)?,
            role,
            created_by: creator.map(|p| p.id),
            teacher_id,
            group_id,
            is_verified: false,
            documents_approved: false,
            // Reception waits for document review; other roles are active
            // from the start and their flags are inert.
            is_active: !gated,
            created_at: Utc::now(),
            deactivated_at: None,
        };

        match self.store.insert_account(account.clone()).await {
            Ok(()) => {}
            // Lost a race on the same email between the check and the insert
            Err(StoreError::Duplicate(email)) => return Err(AuthError::DuplicateEmail(email)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!("created {} account {} ({})", role, account.email, account.id);
        Ok(account)
    }

    /// The only password-comparison primitive exposed by this crate.
    pub fn verify_password(&self, account: &Account, password: &str) -> Result<bool, AuthError> {
        crypto::verify_password(password, &account.password_hash)
    }

    /// Re-hash and store a new password.
    pub async fn set_password(&self, id: AccountId, password: &str) -> Result<(), AuthError> {
        let hash = crypto::hash_password(password)?;
        loop {
            let (mut account, version) = self
                .store
                .account_versioned(id)
                .await?
                .ok_or(AuthError::NotFound)?;
            account.password_hash = hash.clone();
            if self.store.update_account_if(version, account).await? {
                return Ok(());
            }
        }
    }

    /// Explicit administrative hard delete, cascading dependent children,
    /// documents, and child records. Everyday removal is soft, via the
    /// activation flags.
    pub async fn delete_account(
        &self,
        operator: &Principal,
        id: AccountId,
    ) -> Result<(), AuthError> {
        if !matches!(
            operator.role,
            Role::SuperAdmin | Role::Admin | Role::Reception
        ) {
            return Err(AuthError::Forbidden);
        }
        let account = self.store.account(id).await?.ok_or(AuthError::NotFound)?;
        check_write(self.store.as_ref(), operator, Resource::Account(&account)).await?;

        self.store.delete_account(id).await?;
        tracing::info!("deleted {} account {} ({})", account.role, account.email, id);
        Ok(())
    }

    /// Validate the caseload edges on a parent-creation request: the
    /// referenced teacher must exist (and be a teacher), and a group, when
    /// both are set, must belong to that teacher.
    async fn validate_parent_edges(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<(Option<AccountId>, Option<GroupId>), AuthError> {
        let (teacher_id, group_id) = match request {
            CreateAccountRequest::Parent {
                teacher_id,
                group_id,
                ..
            } => (*teacher_id, *group_id),
            _ => return Ok((None, None)),
        };

        if let Some(tid) = teacher_id {
            let teacher = self
                .store
                .account(tid)
                .await?
                .filter(|a| a.role == Role::Teacher)
                .ok_or_else(|| {
                    AuthError::InvalidOwnership("referenced teacher does not exist".to_string())
                })?;

            if let Some(gid) = group_id {
                let group = self.store.group(gid).await?.ok_or_else(|| {
                    AuthError::InvalidOwnership("referenced group does not exist".to_string())
                })?;
                if group.teacher_id != teacher.id {
                    return Err(AuthError::InvalidOwnership(
                        "group does not belong to the referenced teacher".to_string(),
                    ));
                }
            }
        } else if let Some(gid) = group_id {
            if self.store.group(gid).await?.is_none() {
                return Err(AuthError::InvalidOwnership(
                    "referenced group does not exist".to_string(),
                ));
            }
        }

        Ok((teacher_id, group_id))
    }
}
