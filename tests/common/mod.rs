#![allow(dead_code)]

use std::sync::Arc;

use nido_auth::identity::{CreateAccountRequest, Directory};
use nido_auth::model::Account;
use nido_auth::notify::RecordingNotifier;
use nido_auth::review::ReviewLedger;
use nido_auth::session::{Principal, SessionIssuer, SessionKeys};
use nido_auth::store::{MemoryStore, Store};

pub const PASSWORD: &str = "letmein-nido-1";

/// Test fixture wiring every service over one in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub directory: Directory,
    pub ledger: Arc<ReviewLedger>,
    pub issuer: SessionIssuer,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let directory = Directory::new(store.clone());
        let ledger = Arc::new(ReviewLedger::with_retries(
            store.clone(),
            notifier.clone(),
            16,
        ));
        let issuer = SessionIssuer::new(store.clone(), test_keys());
        Self {
            store,
            directory,
            ledger,
            issuer,
            notifier,
        }
    }

    /// Bootstrap an admin root (no creating principal).
    pub async fn admin(&self, email: &str) -> Account {
        self.directory
            .create_account(
                CreateAccountRequest::Admin {
                    email: email.to_string(),
                    name: "Admin".to_string(),
                    password: PASSWORD.to_string(),
                },
                None,
            )
            .await
            .expect("admin creation")
    }

    pub async fn reception(&self, admin: &Account, email: &str) -> Account {
        self.directory
            .create_account(
                CreateAccountRequest::Reception {
                    email: email.to_string(),
                    name: "Front Desk".to_string(),
                    password: PASSWORD.to_string(),
                },
                Some(&principal(admin)),
            )
            .await
            .expect("reception creation")
    }

    pub async fn teacher(&self, reception: &Account, email: &str) -> Account {
        self.directory
            .create_account(
                CreateAccountRequest::Teacher {
                    email: email.to_string(),
                    name: "Teacher".to_string(),
                    password: PASSWORD.to_string(),
                },
                Some(&principal(reception)),
            )
            .await
            .expect("teacher creation")
    }

    pub async fn parent(
        &self,
        reception: &Account,
        teacher: Option<&Account>,
        email: &str,
    ) -> Account {
        self.directory
            .create_account(
                CreateAccountRequest::Parent {
                    email: email.to_string(),
                    name: "Parent".to_string(),
                    password: PASSWORD.to_string(),
                    teacher_id: teacher.map(|t| t.id),
                    group_id: None,
                },
                Some(&principal(reception)),
            )
            .await
            .expect("parent creation")
    }

    /// Reception account walked through a single-document approval so the
    /// activation gate is open.
    pub async fn activated_reception(&self, admin: &Account, email: &str) -> Account {
        let reception = self.reception(admin, email).await;
        let document = self
            .ledger
            .submit(&principal(&reception), "operating_license", "files/license.pdf")
            .await
            .expect("submission");
        self.ledger
            .approve(&principal(admin), document.id)
            .await
            .expect("approval");
        self.account(&reception).await
    }

    /// Re-read the current state of an account.
    pub async fn account(&self, account: &Account) -> Account {
        self.store
            .account(account.id)
            .await
            .expect("store read")
            .expect("account exists")
    }
}

pub fn principal(account: &Account) -> Principal {
    Principal::of(account)
}

pub fn test_keys() -> SessionKeys {
    SessionKeys {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 60 * 60 * 24 * 7,
    }
}
