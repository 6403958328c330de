use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use fulfil_delivery::PlatformKind;

/// What a platform call was trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationAction {
    CreateOrder,
    UpdateStatus,
    CancelOrder,
}

impl IntegrationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrationAction::CreateOrder => "create_order",
            IntegrationAction::UpdateStatus => "update_status",
            IntegrationAction::CancelOrder => "cancel_order",
        }
    }
}

/// One audited platform call: the request we sent, the response we got.
///
/// Exactly one entry per adapter invocation, success or failure. When the
/// call never produced a response, `response` is an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationLogEntry {
    pub id: Uuid,
    pub platform: PlatformKind,
    pub action: IntegrationAction,
    pub request: Value,
    pub response: Value,
    pub status_code: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// The audit sink itself failed.
#[derive(Debug, Error)]
#[error("failed to write integration audit log: {0}")]
pub struct AuditWriteError(pub String);

/// Append-only audit log of outbound platform calls.
pub trait IntegrationLog: Send + Sync {
    fn append(&self, entry: IntegrationLogEntry) -> Result<(), AuditWriteError>;

    fn entries(&self) -> Result<Vec<IntegrationLogEntry>, AuditWriteError>;
}

impl<L> IntegrationLog for Arc<L>
where
    L: IntegrationLog + ?Sized,
{
    fn append(&self, entry: IntegrationLogEntry) -> Result<(), AuditWriteError> {
        (**self).append(entry)
    }

    fn entries(&self) -> Result<Vec<IntegrationLogEntry>, AuditWriteError> {
        (**self).entries()
    }
}

/// In-memory audit log. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIntegrationLog {
    entries: RwLock<Vec<IntegrationLogEntry>>,
}

impl InMemoryIntegrationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntegrationLog for InMemoryIntegrationLog {
    fn append(&self, entry: IntegrationLogEntry) -> Result<(), AuditWriteError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditWriteError("audit log lock poisoned".into()))?;
        entries.push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<IntegrationLogEntry>, AuditWriteError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuditWriteError("audit log lock poisoned".into()))?;
        Ok(entries.clone())
    }
}
