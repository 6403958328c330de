use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::info;

use fulfil_core::{DeliveryOrderId, DomainError, DomainResult, InvoiceId};

use crate::order::{DeliveryOrder, DriverInfo};
use crate::status::{DeliveryStatus, TransitionSource, validate_transition};
use crate::tracking::{GeoPoint, TrackingEntry};

/// Storage for delivery orders and their tracking history.
///
/// A transition validates, applies, and appends its tracking entry as one
/// atomic unit: a concurrent transition on the same order sees either the
/// state before or the state after, never a half-applied change.
pub trait DeliveryStore: Send + Sync {
    /// Insert a new delivery order. At most one delivery per invoice.
    fn insert(&self, order: DeliveryOrder) -> DomainResult<()>;

    fn get(&self, id: DeliveryOrderId) -> DomainResult<DeliveryOrder>;

    fn by_invoice(&self, invoice: InvoiceId) -> DomainResult<DeliveryOrder>;

    /// Apply a status transition and append the matching tracking entry.
    fn transition(
        &self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
        source: TransitionSource,
        location: Option<GeoPoint>,
    ) -> DomainResult<TrackingEntry>;

    /// Record that the platform accepted the order: stores the platform's
    /// order id and moves the delivery from pending to confirmed.
    fn confirm_created(
        &self,
        id: DeliveryOrderId,
        platform_order_id: &str,
    ) -> DomainResult<TrackingEntry>;

    fn assign_driver(&self, id: DeliveryOrderId, driver: DriverInfo) -> DomainResult<()>;

    /// Tracking history for an order, in recorded order.
    fn tracking_history(&self, id: DeliveryOrderId) -> DomainResult<Vec<TrackingEntry>>;
}

impl<S> DeliveryStore for Arc<S>
where
    S: DeliveryStore + ?Sized,
{
    fn insert(&self, order: DeliveryOrder) -> DomainResult<()> {
        (**self).insert(order)
    }

    fn get(&self, id: DeliveryOrderId) -> DomainResult<DeliveryOrder> {
        (**self).get(id)
    }

    fn by_invoice(&self, invoice: InvoiceId) -> DomainResult<DeliveryOrder> {
        (**self).by_invoice(invoice)
    }

    fn transition(
        &self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
        source: TransitionSource,
        location: Option<GeoPoint>,
    ) -> DomainResult<TrackingEntry> {
        (**self).transition(id, to, source, location)
    }

    fn confirm_created(
        &self,
        id: DeliveryOrderId,
        platform_order_id: &str,
    ) -> DomainResult<TrackingEntry> {
        (**self).confirm_created(id, platform_order_id)
    }

    fn assign_driver(&self, id: DeliveryOrderId, driver: DriverInfo) -> DomainResult<()> {
        (**self).assign_driver(id, driver)
    }

    fn tracking_history(&self, id: DeliveryOrderId) -> DomainResult<Vec<TrackingEntry>> {
        (**self).tracking_history(id)
    }
}

#[derive(Debug, Default)]
struct BookState {
    orders: HashMap<DeliveryOrderId, DeliveryOrder>,
    by_invoice: HashMap<InvoiceId, DeliveryOrderId>,
    tracking: HashMap<DeliveryOrderId, Vec<TrackingEntry>>,
}

impl BookState {
    fn apply(
        &mut self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
        source: TransitionSource,
        location: Option<GeoPoint>,
        note: Option<String>,
    ) -> DomainResult<TrackingEntry> {
        let order = self.orders.get_mut(&id).ok_or_else(DomainError::not_found)?;
        validate_transition(order.status, to, source)?;
        order.status = to;
        if to == DeliveryStatus::Delivered {
            order.actual_delivery_at = Some(Utc::now());
        }
        let entry = TrackingEntry::new(id, to, location, note);
        self.tracking.entry(id).or_default().push(entry.clone());
        Ok(entry)
    }
}

/// In-memory delivery book. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryBook {
    inner: RwLock<BookState>,
}

impl InMemoryDeliveryBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, BookState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("delivery book lock poisoned"))
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, BookState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("delivery book lock poisoned"))
    }
}

impl DeliveryStore for InMemoryDeliveryBook {
    fn insert(&self, order: DeliveryOrder) -> DomainResult<()> {
        let mut state = self.write()?;
        if state.orders.contains_key(&order.id) {
            return Err(DomainError::conflict(format!(
                "delivery order {} already exists",
                order.id
            )));
        }
        if state.by_invoice.contains_key(&order.invoice) {
            return Err(DomainError::conflict(format!(
                "invoice {} already has a delivery order",
                order.invoice
            )));
        }
        state.by_invoice.insert(order.invoice, order.id);
        state.orders.insert(order.id, order);
        Ok(())
    }

    fn get(&self, id: DeliveryOrderId) -> DomainResult<DeliveryOrder> {
        let state = self.read()?;
        state.orders.get(&id).cloned().ok_or_else(DomainError::not_found)
    }

    fn by_invoice(&self, invoice: InvoiceId) -> DomainResult<DeliveryOrder> {
        let state = self.read()?;
        let id = state
            .by_invoice
            .get(&invoice)
            .ok_or_else(DomainError::not_found)?;
        state.orders.get(id).cloned().ok_or_else(DomainError::not_found)
    }

    fn transition(
        &self,
        id: DeliveryOrderId,
        to: DeliveryStatus,
        source: TransitionSource,
        location: Option<GeoPoint>,
    ) -> DomainResult<TrackingEntry> {
        let mut state = self.write()?;
        let entry = state.apply(id, to, source, location, None)?;
        info!(delivery_order = %id, status = %to, "delivery status changed");
        Ok(entry)
    }

    fn confirm_created(
        &self,
        id: DeliveryOrderId,
        platform_order_id: &str,
    ) -> DomainResult<TrackingEntry> {
        let mut state = self.write()?;
        let entry = state.apply(
            id,
            DeliveryStatus::Confirmed,
            TransitionSource::Local,
            None,
            Some(format!("platform order {platform_order_id} created")),
        )?;
        // apply() verified the order exists.
        if let Some(order) = state.orders.get_mut(&id) {
            order.platform_order_id = Some(platform_order_id.to_string());
        }
        info!(delivery_order = %id, platform_order_id, "platform accepted delivery order");
        Ok(entry)
    }

    fn assign_driver(&self, id: DeliveryOrderId, driver: DriverInfo) -> DomainResult<()> {
        let mut state = self.write()?;
        let order = state.orders.get_mut(&id).ok_or_else(DomainError::not_found)?;
        order.driver = Some(driver);
        Ok(())
    }

    fn tracking_history(&self, id: DeliveryOrderId) -> DomainResult<Vec<TrackingEntry>> {
        let state = self.read()?;
        Ok(state.tracking.get(&id).cloned().unwrap_or_default())
    }
}
