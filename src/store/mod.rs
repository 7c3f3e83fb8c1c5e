//! Persistence collaborator for the authorization core.
//!
//! The backing engine is out of scope; this trait is the narrow surface the
//! kernel needs from it: create/read/update/delete, scoped list queries,
//! and one versioned compare-and-swap primitive sufficient to serialize the
//! per-account activation recomputation.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    Account, AccountId, Child, ChildId, ChildRecord, Document, DocumentId, Group, GroupId,
    RecordId,
};
use crate::scope::ScopeFilter;

/// Errors from the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Accounts

    /// Insert a new account. Fails with `Duplicate` if the normalized email
    /// is already registered.
    async fn insert_account(&self, account: Account) -> StoreResult<()>;

    async fn account(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Lookup by normalized email.
    async fn account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Read an account together with its current version, for a subsequent
    /// `update_account_if`.
    async fn account_versioned(&self, id: AccountId) -> StoreResult<Option<(Account, u64)>>;

    /// Compare-and-swap write. Returns false when the stored version no
    /// longer matches `expected_version`; the caller re-reads and retries.
    async fn update_account_if(&self, expected_version: u64, account: Account)
        -> StoreResult<bool>;

    async fn list_accounts(&self, filter: &ScopeFilter) -> StoreResult<Vec<Account>>;

    /// Hard delete, cascading dependent documents, children, and child
    /// records. Soft deactivation goes through the activation flags instead.
    async fn delete_account(&self, id: AccountId) -> StoreResult<()>;

    // Documents

    async fn insert_document(&self, document: Document) -> StoreResult<()>;

    async fn document(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    /// All documents belonging to one account, for the aggregate
    /// recomputation.
    async fn documents_for(&self, owner: AccountId) -> StoreResult<Vec<Document>>;

    async fn document_versioned(&self, id: DocumentId) -> StoreResult<Option<(Document, u64)>>;

    /// Compare-and-swap write; a pending->resolved transition can therefore
    /// never double-fire.
    async fn update_document_if(
        &self,
        expected_version: u64,
        document: Document,
    ) -> StoreResult<bool>;

    async fn list_documents(&self, filter: &ScopeFilter) -> StoreResult<Vec<Document>>;

    // Groups

    async fn insert_group(&self, group: Group) -> StoreResult<()>;

    async fn group(&self, id: GroupId) -> StoreResult<Option<Group>>;

    async fn list_groups(&self, filter: &ScopeFilter) -> StoreResult<Vec<Group>>;

    // Children

    async fn insert_child(&self, child: Child) -> StoreResult<()>;

    async fn child(&self, id: ChildId) -> StoreResult<Option<Child>>;

    async fn list_children(&self, filter: &ScopeFilter) -> StoreResult<Vec<Child>>;

    // Child-owned records (activity/meal/media/progress)

    async fn insert_child_record(&self, record: ChildRecord) -> StoreResult<()>;

    async fn child_record(&self, id: RecordId) -> StoreResult<Option<ChildRecord>>;

    async fn list_child_records(&self, filter: &ScopeFilter) -> StoreResult<Vec<ChildRecord>>;
}
