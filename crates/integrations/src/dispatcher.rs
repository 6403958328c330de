use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use fulfil_core::{DeliveryOrderId, DomainError};
use fulfil_delivery::{
    DeliveryStatus, DeliveryStore, GeoPoint, TrackingEntry, TransitionSource, validate_transition,
};
use fulfil_orders::SalesInvoice;

use crate::adapter::CallOutcome;
use crate::audit::{IntegrationAction, IntegrationLog, IntegrationLogEntry};
use crate::error::{IntegrationError, IntegrationResult};
use crate::registry::AdapterRegistry;

/// Coordinates delivery orders with their external platforms.
///
/// Every adapter call is audited, success or failure, exactly once. Local
/// state changes only after the platform acknowledged, and only after the
/// audit entry landed; an unwritable audit log aborts the operation with
/// nothing mutated. Calls for the same delivery order are serialized so two
/// operators cannot race the same order onto the platform twice.
pub struct DeliveryDispatcher<D, L> {
    registry: AdapterRegistry,
    deliveries: D,
    audit: L,
    in_flight: Mutex<HashMap<DeliveryOrderId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<D, L> DeliveryDispatcher<D, L>
where
    D: DeliveryStore,
    L: IntegrationLog,
{
    pub fn new(registry: AdapterRegistry, deliveries: D, audit: L) -> Self {
        Self {
            registry,
            deliveries,
            audit,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn deliveries(&self) -> &D {
        &self.deliveries
    }

    pub fn audit(&self) -> &L {
        &self.audit
    }

    /// Per-order mutex, created on first use. The map lock is only held long
    /// enough to clone the entry; the await happens outside it.
    async fn order_guard(
        &self,
        id: DeliveryOrderId,
    ) -> IntegrationResult<tokio::sync::OwnedMutexGuard<()>> {
        let guard = {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| DomainError::conflict("dispatcher lock poisoned"))?;
            Arc::clone(in_flight.entry(id).or_default())
        };
        Ok(guard.lock_owned().await)
    }

    fn audit_call(
        &self,
        platform: fulfil_delivery::PlatformKind,
        action: IntegrationAction,
        outcome: &CallOutcome,
    ) -> IntegrationResult<()> {
        let (success, error) = match &outcome.result {
            Ok(_) => (true, None),
            Err(failure) => (false, Some(format!("{failure:?}"))),
        };
        self.audit.append(IntegrationLogEntry {
            id: Uuid::now_v7(),
            platform,
            action,
            request: outcome.request.clone(),
            response: outcome.response.clone().unwrap_or_else(|| json!({})),
            status_code: outcome.status_code,
            success,
            error,
            logged_at: Utc::now(),
        })?;
        Ok(())
    }

    /// Create a pending delivery order on its platform.
    ///
    /// Returns the platform's order id. Orders already created on the
    /// platform (or past pending) are rejected before any call goes out.
    pub async fn create_order(
        &self,
        id: DeliveryOrderId,
        invoice: &SalesInvoice,
    ) -> IntegrationResult<String> {
        // Resolve before taking the guard so an unsupported platform fails
        // fast with no audit entry and no call.
        let order = self.deliveries.get(id)?;
        let adapter = self.registry.resolve(order.platform)?;

        let _guard = self.order_guard(id).await?;

        // Re-read under the guard: a concurrent create may have won.
        let order = self.deliveries.get(id)?;
        if order.platform_order_id.is_some() {
            return Err(DomainError::conflict(format!(
                "delivery order {id} already exists on {}",
                order.platform
            ))
            .into());
        }
        if order.status != DeliveryStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "delivery order {id} is {}, not pending",
                order.status
            ))
            .into());
        }

        let outcome = adapter.create_order(&order, invoice).await;
        self.audit_call(order.platform, IntegrationAction::CreateOrder, &outcome)?;

        let ack = match outcome.result {
            Ok(ack) => ack,
            Err(failure) => {
                warn!(
                    delivery_order = %id,
                    platform = %order.platform,
                    "platform rejected order creation"
                );
                return Err(failure.into());
            }
        };
        let platform_order_id = ack.platform_order_id.ok_or_else(|| {
            IntegrationError::RemoteRejected {
                status: outcome.status_code,
                message: "acknowledgement missing order_id".to_string(),
            }
        })?;

        self.deliveries.confirm_created(id, &platform_order_id)?;
        info!(
            delivery_order = %id,
            platform = %order.platform,
            platform_order_id,
            "delivery order created on platform"
        );
        Ok(platform_order_id)
    }

    /// Push a local status change to the platform, then apply it locally.
    ///
    /// The transition is validated before the call goes out: an illegal local
    /// step fails fast with no call and no audit entry.
    pub async fn update_status(
        &self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
    ) -> IntegrationResult<TrackingEntry> {
        let _guard = self.order_guard(id).await?;

        let order = self.deliveries.get(id)?;
        let platform_order_id = order.platform_order_id.clone().ok_or_else(|| {
            DomainError::validation(format!("delivery order {id} was never created on a platform"))
        })?;
        validate_transition(order.status, to, TransitionSource::Local)?;
        let adapter = self.registry.resolve(order.platform)?;

        let outcome = adapter.update_status(&platform_order_id, to).await;
        self.audit_call(order.platform, IntegrationAction::UpdateStatus, &outcome)?;
        if let Err(failure) = outcome.result {
            warn!(
                delivery_order = %id,
                platform = %order.platform,
                status = %to,
                "platform rejected status update"
            );
            return Err(failure.into());
        }

        Ok(self
            .deliveries
            .transition(id, to, TransitionSource::Local, None)?)
    }

    /// Cancel the order on the platform, then cancel it locally.
    pub async fn cancel_order(&self, id: DeliveryOrderId) -> IntegrationResult<TrackingEntry> {
        let _guard = self.order_guard(id).await?;

        let order = self.deliveries.get(id)?;
        let platform_order_id = order.platform_order_id.clone().ok_or_else(|| {
            DomainError::validation(format!("delivery order {id} was never created on a platform"))
        })?;
        validate_transition(order.status, DeliveryStatus::Cancelled, TransitionSource::Local)?;
        let adapter = self.registry.resolve(order.platform)?;

        let outcome = adapter.cancel_order(&platform_order_id).await;
        self.audit_call(order.platform, IntegrationAction::CancelOrder, &outcome)?;
        if let Err(failure) = outcome.result {
            warn!(
                delivery_order = %id,
                platform = %order.platform,
                "platform rejected cancellation"
            );
            return Err(failure.into());
        }

        Ok(self.deliveries.transition(
            id,
            DeliveryStatus::Cancelled,
            TransitionSource::Local,
            None,
        )?)
    }

    /// Apply a status the platform reported (webhook or poll). No outbound
    /// call is made and nothing is audited; the platform is the source.
    pub async fn record_platform_update(
        &self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
        location: Option<GeoPoint>,
    ) -> IntegrationResult<TrackingEntry> {
        let _guard = self.order_guard(id).await?;
        Ok(self
            .deliveries
            .transition(id, to, TransitionSource::Platform, location)?)
    }
}
