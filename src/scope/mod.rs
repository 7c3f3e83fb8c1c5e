//! Ownership/visibility resolver.
//!
//! `scope()` is the single place that walks the ownership graph. Every
//! list/read/write operation in the surrounding CRUD layer resolves a
//! `ScopeFilter` here and applies it before touching the persistence layer;
//! no handler re-derives visibility on its own.

use std::collections::HashSet;

use crate::error::AuthError;
use crate::model::{Account, AccountId, Child, ChildRecord, Document, Group, Role};
use crate::session::Principal;
use crate::store::Store;

/// The resource families the resolver scopes. Account kinds are split by
/// role because visibility and writability differ per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    AdminAccounts,
    ReceptionAccounts,
    TeacherAccounts,
    ParentAccounts,
    Groups,
    Children,
    Documents,
    ChildRecords,
}

impl ResourceKind {
    /// The account kind for a given account role.
    pub fn accounts_of(role: Role) -> Self {
        match role {
            Role::SuperAdmin | Role::Admin => ResourceKind::AdminAccounts,
            Role::Reception => ResourceKind::ReceptionAccounts,
            Role::Teacher => ResourceKind::TeacherAccounts,
            Role::Parent => ResourceKind::ParentAccounts,
        }
    }
}

/// The filter predicate every list/read/write applies before the
/// persistence layer. Filters constrain ownership edges; the caller
/// combines them with the resource kind's own type restriction (e.g. a
/// role column filter when listing reception accounts).
///
/// A variant that does not apply to a record type matches nothing: the
/// resolver only hands out applicable variants, and anything else fails
/// closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Unrestricted (super-admin only).
    All,
    /// The empty ownership set. Never widened to an unscoped query.
    Nothing,
    /// Accounts (or groups) provisioned directly by this principal.
    CreatedBy(AccountId),
    /// The principal's own account, or records it owns directly.
    SelfOnly(AccountId),
    /// Parent accounts on this teacher's caseload.
    AssignedTeacher(AccountId),
    /// Groups owned by this teacher.
    OwnedByTeacher(AccountId),
    /// Children/records owned by any parent in the set.
    ParentIn(HashSet<AccountId>),
    /// Documents (or groups, keyed by owning teacher) owned by any account
    /// in the set.
    OwnerIn(HashSet<AccountId>),
}

impl ScopeFilter {
    pub fn is_empty(&self) -> bool {
        matches!(self, ScopeFilter::Nothing)
    }

    pub fn matches_account(&self, account: &Account) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Nothing => false,
            ScopeFilter::CreatedBy(id) => account.created_by == Some(*id),
            ScopeFilter::SelfOnly(id) => account.id == *id,
            ScopeFilter::AssignedTeacher(id) => account.teacher_id == Some(*id),
            _ => false,
        }
    }

    pub fn matches_document(&self, document: &Document) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Nothing => false,
            ScopeFilter::SelfOnly(id) => document.owner == *id,
            ScopeFilter::OwnerIn(ids) => ids.contains(&document.owner),
            _ => false,
        }
    }

    pub fn matches_group(&self, group: &Group) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Nothing => false,
            ScopeFilter::CreatedBy(id) => group.created_by == *id,
            ScopeFilter::OwnedByTeacher(id) => group.teacher_id == *id,
            ScopeFilter::OwnerIn(ids) => ids.contains(&group.teacher_id),
            _ => false,
        }
    }

    pub fn matches_child(&self, child: &Child) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Nothing => false,
            ScopeFilter::ParentIn(ids) => ids.contains(&child.parent_id),
            _ => false,
        }
    }

    pub fn matches_child_record(&self, record: &ChildRecord) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Nothing => false,
            ScopeFilter::ParentIn(ids) => ids.contains(&record.parent_id),
            _ => false,
        }
    }
}

/// Resolve the visibility filter for a principal over a resource kind.
///
/// Materializing a derived set (a teacher's reachable parents, an admin's
/// provisioned accounts) queries the store once; an empty result collapses
/// to `Nothing`, never to an unscoped query.
pub async fn scope(
    store: &dyn Store,
    principal: &Principal,
    kind: ResourceKind,
) -> Result<ScopeFilter, AuthError> {
    use ResourceKind::*;

    if principal.role == Role::SuperAdmin {
        return Ok(ScopeFilter::All);
    }
    let me = principal.id;

    let filter = match (principal.role, kind) {
        // Admin: one hop down the creation forest, never transitive.
        (Role::Admin, AdminAccounts) => ScopeFilter::SelfOnly(me),
        (Role::Admin, ReceptionAccounts | TeacherAccounts | ParentAccounts) => {
            ScopeFilter::CreatedBy(me)
        }
        (Role::Admin, Documents) => {
            owner_set(created_account_ids(store, me, None).await?)
        }
        (Role::Admin, Groups) => {
            owner_set(created_account_ids(store, me, Some(Role::Teacher)).await?)
        }
        (Role::Admin, Children | ChildRecords) => {
            parent_set(created_account_ids(store, me, Some(Role::Parent)).await?)
        }

        // Reception: its own provisioned subtree.
        (Role::Reception, TeacherAccounts | ParentAccounts) => ScopeFilter::CreatedBy(me),
        (Role::Reception, ReceptionAccounts) => ScopeFilter::SelfOnly(me),
        (Role::Reception, Groups) => ScopeFilter::CreatedBy(me),
        (Role::Reception, Documents) => ScopeFilter::SelfOnly(me),
        (Role::Reception, AdminAccounts | Children | ChildRecords) => ScopeFilter::Nothing,

        // Teacher: its caseload, and everything reachable from it.
        (Role::Teacher, ParentAccounts) => ScopeFilter::AssignedTeacher(me),
        (Role::Teacher, TeacherAccounts) => ScopeFilter::SelfOnly(me),
        (Role::Teacher, Groups) => ScopeFilter::OwnedByTeacher(me),
        (Role::Teacher, Documents) => ScopeFilter::SelfOnly(me),
        (Role::Teacher, Children | ChildRecords) => {
            parent_set(caseload_parent_ids(store, me).await?)
        }
        (Role::Teacher, AdminAccounts | ReceptionAccounts) => ScopeFilter::Nothing,

        // Parent: strictly single-tenant at the leaf.
        (Role::Parent, ParentAccounts) => ScopeFilter::SelfOnly(me),
        (Role::Parent, Documents) => ScopeFilter::SelfOnly(me),
        (Role::Parent, Children | ChildRecords) => {
            ScopeFilter::ParentIn(HashSet::from([me]))
        }
        (Role::Parent, AdminAccounts | ReceptionAccounts | TeacherAccounts | Groups) => {
            ScopeFilter::Nothing
        }

        (Role::SuperAdmin, _) => ScopeFilter::All,
    };
    Ok(filter)
}

/// Static read-write table. Reads are governed by `scope()` alone; writes
/// additionally require this to hold for the principal's role.
pub fn writable(role: Role, kind: ResourceKind) -> bool {
    use ResourceKind::*;
    match role {
        Role::SuperAdmin => true,
        Role::Admin => matches!(kind, ReceptionAccounts | Documents),
        Role::Reception => matches!(kind, TeacherAccounts | ParentAccounts | Groups),
        Role::Teacher => matches!(kind, ChildRecords),
        Role::Parent => matches!(kind, ParentAccounts | Children),
    }
}

/// A concrete record a read or write is targeting.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Account(&'a Account),
    Group(&'a Group),
    Document(&'a Document),
    Child(&'a Child),
    ChildRecord(&'a ChildRecord),
}

impl Resource<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Account(a) => ResourceKind::accounts_of(a.role),
            Resource::Group(_) => ResourceKind::Groups,
            Resource::Document(_) => ResourceKind::Documents,
            Resource::Child(_) => ResourceKind::Children,
            Resource::ChildRecord(_) => ResourceKind::ChildRecords,
        }
    }

    fn matched_by(&self, filter: &ScopeFilter) -> bool {
        match self {
            Resource::Account(a) => filter.matches_account(a),
            Resource::Group(g) => filter.matches_group(g),
            Resource::Document(d) => filter.matches_document(d),
            Resource::Child(c) => filter.matches_child(c),
            Resource::ChildRecord(r) => filter.matches_child_record(r),
        }
    }
}

/// Check that a principal may read one concrete record.
///
/// Out-of-scope operator resources (accounts, groups, documents) deny with
/// `Forbidden`; leaf resources (children, child records) deny with
/// `NotFound` so probing a foreign id is indistinguishable from probing a
/// nonexistent one.
pub async fn check_read(
    store: &dyn Store,
    principal: &Principal,
    resource: Resource<'_>,
) -> Result<(), AuthError> {
    let filter = scope(store, principal, resource.kind()).await?;
    if resource.matched_by(&filter) {
        Ok(())
    } else {
        Err(denial(resource.kind()))
    }
}

/// Check that a principal may mutate one concrete record.
pub async fn check_write(
    store: &dyn Store,
    principal: &Principal,
    resource: Resource<'_>,
) -> Result<(), AuthError> {
    let kind = resource.kind();
    if !writable(principal.role, kind) {
        return Err(denial(kind));
    }
    let filter = scope(store, principal, kind).await?;
    if resource.matched_by(&filter) {
        Ok(())
    } else {
        Err(denial(kind))
    }
}

/// One existence-leakage policy per resource kind, applied consistently.
fn denial(kind: ResourceKind) -> AuthError {
    match kind {
        ResourceKind::Children | ResourceKind::ChildRecords => AuthError::NotFound,
        _ => AuthError::Forbidden,
    }
}

async fn created_account_ids(
    store: &dyn Store,
    creator: AccountId,
    role: Option<Role>,
) -> Result<HashSet<AccountId>, AuthError> {
    let accounts = store.list_accounts(&ScopeFilter::CreatedBy(creator)).await?;
    Ok(accounts
        .into_iter()
        .filter(|a| role.map_or(true, |r| a.role == r))
        .map(|a| a.id)
        .collect())
}

async fn caseload_parent_ids(
    store: &dyn Store,
    teacher: AccountId,
) -> Result<HashSet<AccountId>, AuthError> {
    let parents = store
        .list_accounts(&ScopeFilter::AssignedTeacher(teacher))
        .await?;
    Ok(parents.into_iter().map(|a| a.id).collect())
}

fn parent_set(ids: HashSet<AccountId>) -> ScopeFilter {
    if ids.is_empty() {
        ScopeFilter::Nothing
    } else {
        ScopeFilter::ParentIn(ids)
    }
}

fn owner_set(ids: HashSet<AccountId>) -> ScopeFilter {
    if ids.is_empty() {
        ScopeFilter::Nothing
    } else {
        ScopeFilter::OwnerIn(ids)
    }
}
