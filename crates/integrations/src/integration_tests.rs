//! End-to-end dispatcher tests with scripted adapters.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use fulfil_core::{
    BranchId, CompanyId, DeliveryOrderId, DomainError, InvoiceId, OpContext, OrderId, OrderLineId,
    PartyId, ProductId,
};
use fulfil_delivery::{
    DeliveryOrder, DeliveryStatus, DeliveryStore, InMemoryDeliveryBook, PlatformKind,
};
use fulfil_orders::{Order, OrderKind, SalesInvoice};

use crate::adapter::{Acknowledgement, CallFailure, CallOutcome, PlatformAdapter};
use crate::audit::{
    AuditWriteError, InMemoryIntegrationLog, IntegrationAction, IntegrationLog,
    IntegrationLogEntry,
};
use crate::dispatcher::DeliveryDispatcher;
use crate::error::IntegrationError;
use crate::registry::AdapterRegistry;

/// Adapter that replays a scripted sequence of outcomes and counts calls.
struct ScriptedAdapter {
    platform: PlatformKind,
    script: Mutex<VecDeque<CallOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(platform: PlatformKind, outcomes: Vec<CallOutcome>) -> Self {
        Self {
            platform,
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> CallOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted adapter ran out of outcomes")
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedAdapter {
    fn platform(&self) -> PlatformKind {
        self.platform
    }

    async fn create_order(&self, _order: &DeliveryOrder, _invoice: &SalesInvoice) -> CallOutcome {
        self.next_outcome()
    }

    async fn update_status(&self, _platform_order_id: &str, _status: DeliveryStatus) -> CallOutcome {
        self.next_outcome()
    }

    async fn cancel_order(&self, _platform_order_id: &str) -> CallOutcome {
        self.next_outcome()
    }
}

/// Audit log whose writes always fail.
struct FailingLog;

impl IntegrationLog for FailingLog {
    fn append(&self, _entry: IntegrationLogEntry) -> Result<(), AuditWriteError> {
        Err(AuditWriteError("disk full".into()))
    }

    fn entries(&self) -> Result<Vec<IntegrationLogEntry>, AuditWriteError> {
        Ok(Vec::new())
    }
}

fn created_outcome(order_id: &str) -> CallOutcome {
    CallOutcome {
        request: json!({"customer_name": "Sara"}),
        response: Some(json!({"order_id": order_id})),
        status_code: Some(201),
        result: Ok(Acknowledgement {
            platform_order_id: Some(order_id.to_string()),
        }),
    }
}

fn ack_outcome() -> CallOutcome {
    CallOutcome {
        request: json!({"status": "preparing"}),
        response: Some(json!({"ok": true})),
        status_code: Some(200),
        result: Ok(Acknowledgement {
            platform_order_id: None,
        }),
    }
}

fn timeout_outcome() -> CallOutcome {
    CallOutcome {
        request: json!({"customer_name": "Sara"}),
        response: None,
        status_code: None,
        result: Err(CallFailure::Transport("request timed out".into())),
    }
}

fn rejected_outcome(status: u16) -> CallOutcome {
    CallOutcome {
        request: json!({"customer_name": "Sara"}),
        response: Some(json!({"error": "address outside coverage"})),
        status_code: Some(status),
        result: Err(CallFailure::Rejected {
            status: Some(status),
            message: "address outside coverage".into(),
        }),
    }
}

fn test_invoice() -> SalesInvoice {
    let ctx = OpContext::new(CompanyId::new(), BranchId::new());
    let mut order = Order::new(OrderId::new(), OrderKind::Sales, ctx, PartyId::new());
    order
        .add_line(OrderLineId::new(), ProductId::new(), "Shawarma plate", 2, 2_500, 0)
        .unwrap();
    order.submit().unwrap();
    order.confirm().unwrap();
    SalesInvoice::from_order(InvoiceId::new(), "INV-0042", &order).unwrap()
}

struct Harness {
    dispatcher:
        DeliveryDispatcher<Arc<InMemoryDeliveryBook>, Arc<InMemoryIntegrationLog>>,
    adapter: Arc<ScriptedAdapter>,
    book: Arc<InMemoryDeliveryBook>,
    log: Arc<InMemoryIntegrationLog>,
    order_id: DeliveryOrderId,
    invoice: SalesInvoice,
}

fn harness(platform: PlatformKind, outcomes: Vec<CallOutcome>) -> Harness {
    let invoice = test_invoice();
    let order = DeliveryOrder::new(
        DeliveryOrderId::new(),
        invoice.id(),
        platform,
        "Sara",
        "+966500000001",
        "12 Olaya St, Riyadh",
    );
    let order_id = order.id;

    let book = Arc::new(InMemoryDeliveryBook::new());
    book.insert(order).unwrap();
    let log = Arc::new(InMemoryIntegrationLog::new());

    let adapter = Arc::new(ScriptedAdapter::new(PlatformKind::Hanger, outcomes));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());

    Harness {
        dispatcher: DeliveryDispatcher::new(registry, book.clone(), log.clone()),
        adapter,
        book,
        log,
        order_id,
        invoice,
    }
}

#[tokio::test]
async fn successful_creation_confirms_and_audits_once() {
    let h = harness(PlatformKind::Hanger, vec![created_outcome("X123")]);

    let platform_order_id = h
        .dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();
    assert_eq!(platform_order_id, "X123");

    let stored = h.book.get(h.order_id).unwrap();
    assert_eq!(stored.status, DeliveryStatus::Confirmed);
    assert_eq!(stored.platform_order_id.as_deref(), Some("X123"));
    assert_eq!(h.book.tracking_history(h.order_id).unwrap().len(), 1);

    let entries = h.log.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].success);
    assert_eq!(entries[0].action, IntegrationAction::CreateOrder);
    assert_eq!(entries[0].status_code, Some(201));
    assert_eq!(h.adapter.calls(), 1);
}

#[tokio::test]
async fn timeout_leaves_order_untouched_but_audits_the_failure() {
    let h = harness(PlatformKind::Hanger, vec![timeout_outcome()]);

    let err = h
        .dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::Transport(_)));

    let stored = h.book.get(h.order_id).unwrap();
    assert_eq!(stored.status, DeliveryStatus::Pending);
    assert!(stored.platform_order_id.is_none());
    assert!(h.book.tracking_history(h.order_id).unwrap().is_empty());

    // The failure is still audited, with an empty response body.
    let entries = h.log.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].success);
    assert_eq!(entries[0].response, json!({}));
    assert_eq!(entries[0].status_code, None);
    assert!(entries[0].error.is_some());
}

#[tokio::test]
async fn remote_rejection_audits_status_and_body() {
    let h = harness(PlatformKind::Hanger, vec![rejected_outcome(422)]);

    let err = h
        .dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntegrationError::RemoteRejected {
            status: Some(422),
            ..
        }
    ));

    assert_eq!(h.book.get(h.order_id).unwrap().status, DeliveryStatus::Pending);
    let entries = h.log.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status_code, Some(422));
    assert_eq!(entries[0].response["error"], "address outside coverage");
}

#[tokio::test]
async fn unsupported_platform_fails_fast_with_no_audit_entry() {
    // Order targets Kita; only a Hanger adapter is registered.
    let h = harness(PlatformKind::Kita, vec![]);

    let err = h
        .dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::UnsupportedPlatform(_)));

    assert_eq!(h.book.get(h.order_id).unwrap().status, DeliveryStatus::Pending);
    assert!(h.log.entries().unwrap().is_empty());
    assert_eq!(h.adapter.calls(), 0);
}

#[tokio::test]
async fn already_created_order_is_rejected_without_a_second_call() {
    let h = harness(PlatformKind::Hanger, vec![created_outcome("X123")]);
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    let err = h
        .dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntegrationError::Domain(DomainError::Conflict(_))
    ));
    assert_eq!(h.adapter.calls(), 1);
    assert_eq!(h.log.entries().unwrap().len(), 1);
}

#[tokio::test]
async fn unwritable_audit_log_aborts_before_any_mutation() {
    let invoice = test_invoice();
    let order = DeliveryOrder::new(
        DeliveryOrderId::new(),
        invoice.id(),
        PlatformKind::Hanger,
        "Sara",
        "+966500000001",
        "12 Olaya St, Riyadh",
    );
    let order_id = order.id;
    let book = Arc::new(InMemoryDeliveryBook::new());
    book.insert(order).unwrap();

    let adapter = Arc::new(ScriptedAdapter::new(
        PlatformKind::Hanger,
        vec![created_outcome("X123")],
    ));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    let dispatcher = DeliveryDispatcher::new(registry, book.clone(), FailingLog);

    let err = dispatcher.create_order(order_id, &invoice).await.unwrap_err();
    assert!(matches!(err, IntegrationError::AuditWrite(_)));

    // The platform accepted, but with no audit record we refuse to advance.
    let stored = book.get(order_id).unwrap();
    assert_eq!(stored.status, DeliveryStatus::Pending);
    assert!(stored.platform_order_id.is_none());
}

#[tokio::test]
async fn status_update_pushes_remote_then_applies_locally() {
    let h = harness(
        PlatformKind::Hanger,
        vec![created_outcome("X123"), ack_outcome()],
    );
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    let entry = h
        .dispatcher
        .update_status(h.order_id, DeliveryStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(entry.status, DeliveryStatus::Preparing);
    assert_eq!(h.book.get(h.order_id).unwrap().status, DeliveryStatus::Preparing);

    let entries = h.log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].action, IntegrationAction::UpdateStatus);
}

#[tokio::test]
async fn illegal_local_step_never_reaches_the_platform() {
    let h = harness(PlatformKind::Hanger, vec![created_outcome("X123")]);
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    // Confirmed -> OnTheWay skips preparing and ready.
    let err = h
        .dispatcher
        .update_status(h.order_id, DeliveryStatus::OnTheWay)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntegrationError::Domain(DomainError::InvalidTransition(_))
    ));
    assert_eq!(h.adapter.calls(), 1);
    assert_eq!(h.log.entries().unwrap().len(), 1);
}

#[tokio::test]
async fn updating_an_order_never_created_on_a_platform_is_rejected() {
    let h = harness(PlatformKind::Hanger, vec![]);

    let err = h
        .dispatcher
        .update_status(h.order_id, DeliveryStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntegrationError::Domain(DomainError::Validation(_))
    ));
    assert_eq!(h.adapter.calls(), 0);
    assert!(h.log.entries().unwrap().is_empty());
}

#[tokio::test]
async fn cancellation_applies_locally_only_after_remote_ack() {
    let h = harness(
        PlatformKind::Hanger,
        vec![created_outcome("X123"), ack_outcome()],
    );
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    let entry = h.dispatcher.cancel_order(h.order_id).await.unwrap();
    assert_eq!(entry.status, DeliveryStatus::Cancelled);
    assert_eq!(h.book.get(h.order_id).unwrap().status, DeliveryStatus::Cancelled);
    assert_eq!(h.log.entries().unwrap().len(), 2);
}

#[tokio::test]
async fn failed_cancellation_leaves_the_order_open() {
    let h = harness(
        PlatformKind::Hanger,
        vec![created_outcome("X123"), rejected_outcome(409)],
    );
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    let err = h.dispatcher.cancel_order(h.order_id).await.unwrap_err();
    assert!(matches!(err, IntegrationError::RemoteRejected { .. }));
    assert_eq!(h.book.get(h.order_id).unwrap().status, DeliveryStatus::Confirmed);
    let entries = h.log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(!entries[1].success);
}

#[tokio::test]
async fn platform_reported_status_is_applied_without_an_outbound_call() {
    let h = harness(PlatformKind::Hanger, vec![created_outcome("X123")]);
    h.dispatcher
        .create_order(h.order_id, &h.invoice)
        .await
        .unwrap();

    // Webhook says the driver is already on the way.
    let entry = h
        .dispatcher
        .record_platform_update(h.order_id, DeliveryStatus::OnTheWay, None)
        .await
        .unwrap();
    assert_eq!(entry.status, DeliveryStatus::OnTheWay);
    assert_eq!(h.adapter.calls(), 1);
    assert_eq!(h.log.entries().unwrap().len(), 1);
}
