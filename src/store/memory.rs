//! In-memory store implementation. The test backend, and the reference
//! semantics for any external engine wired in behind the `Store` trait.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Store, StoreError, StoreResult};
use crate::model::{
    Account, AccountId, Child, ChildId, ChildRecord, Document, DocumentId, Group, GroupId,
    RecordId,
};
use crate::scope::ScopeFilter;

/// A record plus its compare-and-swap version counter.
#[derive(Debug, Clone)]
struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T> Versioned<T> {
    fn new(value: T) -> Self {
        Self { value, version: 0 }
    }
}

/// In-memory store over RwLock'd maps with per-record version counters.
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Versioned<Account>>>,
    /// normalized email -> account id
    emails: RwLock<HashMap<String, AccountId>>,
    documents: RwLock<HashMap<DocumentId, Versioned<Document>>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    children: RwLock<HashMap<ChildId, Child>>,
    records: RwLock<HashMap<RecordId, ChildRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            emails: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            children: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: Account) -> StoreResult<()> {
        let normalized = Account::normalize_email(&account.email);
        // Lock order is always accounts, then emails
        let mut accounts = self.accounts.write().unwrap();
        let mut emails = self.emails.write().unwrap();
        if emails.contains_key(&normalized) {
            return Err(StoreError::Duplicate(normalized));
        }
        emails.insert(normalized, account.id);
        accounts.insert(account.id, Versioned::new(account));
        Ok(())
    }

    async fn account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .get(&id)
            .map(|v| v.value.clone()))
    }

    async fn account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let normalized = Account::normalize_email(email);
        let id = match self.emails.read().unwrap().get(&normalized) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.account(id).await
    }

    async fn account_versioned(&self, id: AccountId) -> StoreResult<Option<(Account, u64)>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .get(&id)
            .map(|v| (v.value.clone(), v.version)))
    }

    async fn update_account_if(
        &self,
        expected_version: u64,
        account: Account,
    ) -> StoreResult<bool> {
        let mut accounts = self.accounts.write().unwrap();
        let entry = accounts
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::NotFound(account.id.to_string()))?;
        if entry.version != expected_version {
            return Ok(false);
        }
        // Keep the email index in lockstep if the address changed
        let old_email = Account::normalize_email(&entry.value.email);
        let new_email = Account::normalize_email(&account.email);
        if old_email != new_email {
            let mut emails = self.emails.write().unwrap();
            if emails.contains_key(&new_email) {
                return Err(StoreError::Duplicate(new_email));
            }
            emails.remove(&old_email);
            emails.insert(new_email, account.id);
        }
        entry.value = account;
        entry.version += 1;
        Ok(true)
    }

    async fn list_accounts(&self, filter: &ScopeFilter) -> StoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|v| filter.matches_account(&v.value))
            .map(|v| v.value.clone())
            .collect())
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        let removed = self.accounts.write().unwrap().remove(&id);
        let account = match removed {
            Some(v) => v.value,
            None => return Err(StoreError::NotFound(id.to_string())),
        };
        self.emails
            .write()
            .unwrap()
            .remove(&Account::normalize_email(&account.email));
        self.documents
            .write()
            .unwrap()
            .retain(|_, d| d.value.owner != id);
        self.children.write().unwrap().retain(|_, c| c.parent_id != id);
        self.records.write().unwrap().retain(|_, r| r.parent_id != id);
        Ok(())
    }

    async fn insert_document(&self, document: Document) -> StoreResult<()> {
        self.documents
            .write()
            .unwrap()
            .insert(document.id, Versioned::new(document));
        Ok(())
    }

    async fn document(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .get(&id)
            .map(|v| v.value.clone()))
    }

    async fn documents_for(&self, owner: AccountId) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .values()
            .filter(|v| v.value.owner == owner)
            .map(|v| v.value.clone())
            .collect())
    }

    async fn document_versioned(&self, id: DocumentId) -> StoreResult<Option<(Document, u64)>> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .get(&id)
            .map(|v| (v.value.clone(), v.version)))
    }

    async fn update_document_if(
        &self,
        expected_version: u64,
        document: Document,
    ) -> StoreResult<bool> {
        let mut documents = self.documents.write().unwrap();
        let entry = documents
            .get_mut(&document.id)
            .ok_or_else(|| StoreError::NotFound(document.id.to_string()))?;
        if entry.version != expected_version {
            return Ok(false);
        }
        entry.value = document;
        entry.version += 1;
        Ok(true)
    }

    async fn list_documents(&self, filter: &ScopeFilter) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .values()
            .filter(|v| filter.matches_document(&v.value))
            .map(|v| v.value.clone())
            .collect())
    }

    async fn insert_group(&self, group: Group) -> StoreResult<()> {
        self.groups.write().unwrap().insert(group.id, group);
        Ok(())
    }

    async fn group(&self, id: GroupId) -> StoreResult<Option<Group>> {
        Ok(self.groups.read().unwrap().get(&id).cloned())
    }

    async fn list_groups(&self, filter: &ScopeFilter) -> StoreResult<Vec<Group>> {
        Ok(self
            .groups
            .read()
            .unwrap()
            .values()
            .filter(|g| filter.matches_group(g))
            .cloned()
            .collect())
    }

    async fn insert_child(&self, child: Child) -> StoreResult<()> {
        self.children.write().unwrap().insert(child.id, child);
        Ok(())
    }

    async fn child(&self, id: ChildId) -> StoreResult<Option<Child>> {
        Ok(self.children.read().unwrap().get(&id).cloned())
    }

    async fn list_children(&self, filter: &ScopeFilter) -> StoreResult<Vec<Child>> {
        Ok(self
            .children
            .read()
            .unwrap()
            .values()
            .filter(|c| filter.matches_child(c))
            .cloned()
            .collect())
    }

    async fn insert_child_record(&self, record: ChildRecord) -> StoreResult<()> {
        self.records.write().unwrap().insert(record.id, record);
        Ok(())
    }

    async fn child_record(&self, id: RecordId) -> StoreResult<Option<ChildRecord>> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn list_child_records(&self, filter: &ScopeFilter) -> StoreResult<Vec<ChildRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| filter.matches_child_record(r))
            .cloned()
            .collect())
    }
}
