//! Outbound notification collaborator.
//!
//! The core emits fire-and-forget notifications on activation flips and
//! review completions; delivery lives outside this crate and a failing
//! sender must never fail the state transition that triggered it.

use async_trait::async_trait;

use crate::model::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    AccountActivated,
    AccountDeactivated,
    DocumentApproved,
    DocumentRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AccountActivated => "account_activated",
            NotificationKind::AccountDeactivated => "account_deactivated",
            NotificationKind::DocumentApproved => "document_approved",
            NotificationKind::DocumentRejected => "document_rejected",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        account: AccountId,
        kind: NotificationKind,
        message: &str,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Default sender: logs the notification and succeeds.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        account: AccountId,
        kind: NotificationKind,
        message: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!("notify {} [{}]: {}", account, kind.as_str(), message);
        Ok(())
    }
}

/// Test double that records every send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<(AccountId, NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_of_kind(&self, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        account: AccountId,
        kind: NotificationKind,
        message: &str,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((account, kind, message.to_string()));
        Ok(())
    }
}

/// Sender that always fails, for exercising the fire-and-forget contract.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(
        &self,
        _account: AccountId,
        _kind: NotificationKind,
        _message: &str,
    ) -> Result<(), NotifyError> {
        Err(NotifyError("sender unavailable".to_string()))
    }
}
