//! Document review ledger and the activation state machine.
//!
//! Every write to an account's activation triad goes through this module;
//! no other component sets `is_active`/`documents_approved` directly. The
//! aggregate recomputation is serialized per account through the store's
//! compare-and-swap primitive: concurrent reviews of sibling documents
//! re-read and retry instead of interleaving their read-modify-write.

use std::sync::Arc;

use chrono::Utc;

use crate::config;
use crate::error::AuthError;
use crate::model::{Account, AccountId, Document, DocumentId, DocumentStatus, Role};
use crate::notify::{NotificationKind, Notifier};
use crate::scope::{check_write, Resource};
use crate::session::Principal;
use crate::store::Store;

/// What an aggregate recomputation ended up doing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOutcome {
    pub documents_approved: bool,
    /// The account flipped from dormant to active in this recomputation.
    pub activated: bool,
    /// The account flipped from active to dormant in this recomputation.
    pub deactivated: bool,
}

pub struct ReviewLedger {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    max_retries: u32,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_retries(store, notifier, config::config().review.max_retries)
    }

    pub fn with_retries(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        max_retries: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            max_retries,
        }
    }

    /// Submit a new document for review. The first submission marks the
    /// account verified; the fresh pending row forces the aggregate false
    /// until it is reviewed. `is_active` is not touched here: only a
    /// rejection or a manual toggle revokes an already-active account.
    pub async fn submit(
        &self,
        submitter: &Principal,
        document_type: &str,
        file_ref: &str,
    ) -> Result<Document, AuthError> {
        let document = Document::pending(submitter.id, document_type, file_ref);
        self.store.insert_document(document.clone()).await?;
        tracing::info!(
            "document {} ({}) submitted by {}",
            document.id,
            document_type,
            submitter.id
        );

        self.recompute_aggregate(submitter.id).await?;
        Ok(document)
    }

    /// Approve a pending document.
    ///
    /// The reviewer must have created the owning account, directly or
    /// transitively. When the approval completes the set (every document
    /// approved), the account auto-activates; that is the only
    /// document-driven path to login capability.
    pub async fn approve(
        &self,
        reviewer: &Principal,
        document_id: DocumentId,
    ) -> Result<Document, AuthError> {
        let (mut document, version) = self.reviewable(reviewer, document_id).await?;

        document.status = DocumentStatus::Approved;
        document.reviewed_by = Some(reviewer.id);
        document.reviewed_at = Some(Utc::now());
        if !self
            .store
            .update_document_if(version, document.clone())
            .await?
        {
            // Lost the race to another reviewer; the document is resolved.
            return Err(AuthError::NotPending);
        }
        tracing::info!("document {} approved by {}", document.id, reviewer.id);

        let outcome = self.recompute_aggregate(document.owner).await?;
        self.send(
            document.owner,
            NotificationKind::DocumentApproved,
            &format!("Document {} was approved", document.document_type),
        )
        .await;
        if outcome.activated {
            self.send(
                document.owner,
                NotificationKind::AccountActivated,
                "All documents approved; your account is now active",
            )
            .await;
        }
        Ok(document)
    }

    /// Reject a pending document. Rejection is a stronger signal than
    /// "some documents pending": it always revokes login eligibility, even
    /// if every sibling document was previously approved.
    pub async fn reject(
        &self,
        reviewer: &Principal,
        document_id: DocumentId,
        reason: &str,
    ) -> Result<Document, AuthError> {
        let (mut document, version) = self.reviewable(reviewer, document_id).await?;

        document.status = DocumentStatus::Rejected;
        document.reviewed_by = Some(reviewer.id);
        document.reviewed_at = Some(Utc::now());
        document.rejection_reason = Some(reason.to_string());
        if !self
            .store
            .update_document_if(version, document.clone())
            .await?
        {
            return Err(AuthError::NotPending);
        }
        tracing::info!("document {} rejected by {}: {}", document.id, reviewer.id, reason);

        let outcome = self.revoke(document.owner).await?;
        self.send(
            document.owner,
            NotificationKind::DocumentRejected,
            &format!("Document {} was rejected: {}", document.document_type, reason),
        )
        .await;
        if outcome.deactivated {
            self.send(
                document.owner,
                NotificationKind::AccountDeactivated,
                "Your account was deactivated pending new documents",
            )
            .await;
        }
        Ok(document)
    }

    /// Manual activate/deactivate by an authorized operator, independent of
    /// document state. Never alters `documents_approved`.
    pub async fn set_active(
        &self,
        operator: &Principal,
        account_id: AccountId,
        active: bool,
    ) -> Result<Account, AuthError> {
        let account = self
            .store
            .account(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        check_write(self.store.as_ref(), operator, Resource::Account(&account)).await?;

        let mut attempts = 0;
        loop {
            let (mut current, version) = self
                .store
                .account_versioned(account_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            if current.is_active == active {
                return Ok(current);
            }
            current.is_active = active;
            current.deactivated_at = if active { None } else { Some(Utc::now()) };
            if self.store.update_account_if(version, current.clone()).await? {
                tracing::info!(
                    "account {} manually {} by {}",
                    account_id,
                    if active { "activated" } else { "deactivated" },
                    operator.id
                );
                let (kind, message) = if active {
                    (NotificationKind::AccountActivated, "Your account was activated")
                } else {
                    (NotificationKind::AccountDeactivated, "Your account was deactivated")
                };
                self.send(account_id, kind, message).await;
                return Ok(current);
            }
            attempts += 1;
            if attempts > self.max_retries {
                return Err(AuthError::Conflict);
            }
        }
    }

    /// Load a document and verify the reviewer may resolve it: the owner
    /// must sit in the reviewer's creation chain (super-admin bypasses),
    /// and the document must still be pending.
    async fn reviewable(
        &self,
        reviewer: &Principal,
        document_id: DocumentId,
    ) -> Result<(Document, u64), AuthError> {
        let (document, version) = self
            .store
            .document_versioned(document_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        let owner = self
            .store
            .account(document.owner)
            .await?
            .ok_or(AuthError::NotFound)?;
        if reviewer.role != Role::SuperAdmin
            && !self.in_creation_chain(reviewer.id, &owner).await?
        {
            return Err(AuthError::Forbidden);
        }

        if document.status != DocumentStatus::Pending {
            return Err(AuthError::NotPending);
        }
        Ok((document, version))
    }

    /// Walk the `created_by` chain upwards from `account`, looking for the
    /// reviewer. Creation links always point at strictly older accounts,
    /// so the walk terminates.
    async fn in_creation_chain(
        &self,
        reviewer: AccountId,
        account: &Account,
    ) -> Result<bool, AuthError> {
        let mut current = account.created_by;
        while let Some(id) = current {
            if id == reviewer {
                return Ok(true);
            }
            current = match self.store.account(id).await? {
                Some(ancestor) => ancestor.created_by,
                None => None,
            };
        }
        Ok(false)
    }

    /// Recompute `documents_approved` from the full document set and
    /// auto-activate on a false->true flip. Serialized per account via
    /// compare-and-swap; bounded retries, then `Conflict`.
    async fn recompute_aggregate(&self, owner: AccountId) -> Result<AggregateOutcome, AuthError> {
        let mut attempts = 0;
        loop {
            let (account, version) = self
                .store
                .account_versioned(owner)
                .await?
                .ok_or(AuthError::NotFound)?;
            let documents = self.store.documents_for(owner).await?;

            let all_approved = !documents.is_empty()
                && documents
                    .iter()
                    .all(|d| d.status == DocumentStatus::Approved);

            let mut updated = account.clone();
            updated.is_verified = account.is_verified || !documents.is_empty();
            updated.documents_approved = all_approved;

            let newly_approved = all_approved && !account.documents_approved;
            let activated = newly_approved
                && account.role.uses_activation_gate()
                && !account.is_active;
            if activated {
                updated.is_active = true;
                updated.deactivated_at = None;
            }

            if updated.is_verified == account.is_verified
                && updated.documents_approved == account.documents_approved
                && updated.is_active == account.is_active
            {
                return Ok(AggregateOutcome {
                    documents_approved: all_approved,
                    ..Default::default()
                });
            }

            if self.store.update_account_if(version, updated).await? {
                if activated {
                    tracing::info!("account {} auto-activated: all documents approved", owner);
                }
                return Ok(AggregateOutcome {
                    documents_approved: all_approved,
                    activated,
                    deactivated: false,
                });
            }

            attempts += 1;
            if attempts > self.max_retries {
                tracing::warn!("aggregate recomputation for {} exhausted retries", owner);
                return Err(AuthError::Conflict);
            }
        }
    }

    /// A rejection always forces the aggregate false and revokes login
    /// eligibility for gated roles.
    async fn revoke(&self, owner: AccountId) -> Result<AggregateOutcome, AuthError> {
        let mut attempts = 0;
        loop {
            let (account, version) = self
                .store
                .account_versioned(owner)
                .await?
                .ok_or(AuthError::NotFound)?;

            let deactivated = account.role.uses_activation_gate() && account.is_active;
            if !account.documents_approved && !deactivated {
                return Ok(AggregateOutcome::default());
            }

            let mut updated = account.clone();
            updated.documents_approved = false;
            if deactivated {
                updated.is_active = false;
                updated.deactivated_at = Some(Utc::now());
            }

            if self.store.update_account_if(version, updated).await? {
                if deactivated {
                    tracing::info!("account {} deactivated by document rejection", owner);
                }
                return Ok(AggregateOutcome {
                    documents_approved: false,
                    activated: false,
                    deactivated,
                });
            }

            attempts += 1;
            if attempts > self.max_retries {
                tracing::warn!("revocation for {} exhausted retries", owner);
                return Err(AuthError::Conflict);
            }
        }
    }

    /// Fire-and-forget: a failing sender is logged and never fails the
    /// transition that triggered it.
    async fn send(&self, account: AccountId, kind: NotificationKind, message: &str) {
        if let Err(e) = self.notifier.notify(account, kind, message).await {
            tracing::warn!("notification to {} dropped: {}", account, e);
        }
    }
}
