use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fulfil_core::{DomainError, DomainResult, MovementId, OrderId, OrderLineId, ReceiptId};
use fulfil_stock::{MovementReference, MovementType, NewMovement, ReferenceKind, StockLedger};

use crate::order::{Order, OrderKind, OrderStatus};

/// One line of a goods receipt (purchase side) or shipment (sales side).
///
/// `quantity_moved` is what physically arrived or left; acceptance splits it
/// into what enters stock and what is rejected back to the counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub receipt: ReceiptId,
    pub order_line: OrderLineId,
    pub quantity_moved: i64,
    pub quantity_accepted: i64,
    pub quantity_rejected: i64,
}

impl ReceiptLine {
    fn validate(&self) -> DomainResult<()> {
        if self.quantity_moved <= 0 {
            return Err(DomainError::invalid_quantity(
                "moved quantity must be positive",
            ));
        }
        if self.quantity_accepted < 0 || self.quantity_rejected < 0 {
            return Err(DomainError::invalid_quantity(
                "accepted and rejected quantities cannot be negative",
            ));
        }
        if self.quantity_accepted + self.quantity_rejected > self.quantity_moved {
            return Err(DomainError::invalid_quantity(
                "accepted + rejected cannot exceed the moved quantity",
            ));
        }
        Ok(())
    }
}

/// What `apply_receipt` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptOutcome {
    /// Ledger movement appended for the accepted quantity; `None` when the
    /// receipt accepted nothing (all rejected).
    pub movement: Option<MovementId>,
    /// Line's cumulative fulfilled quantity after this receipt.
    pub line_fulfilled: i64,
    /// Order status after recomputation.
    pub order_status: OrderStatus,
}

/// Holds live orders and reconciles receipts/shipments against them.
///
/// Every mutating call runs under the book's write lock for its whole
/// read-check-write unit, so two racing receipts against the same line
/// cannot both pass the over-receipt check.
#[derive(Debug)]
pub struct OrderBook<L: StockLedger> {
    orders: RwLock<HashMap<OrderId, Order>>,
    ledger: L,
}

impl<L: StockLedger> OrderBook<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            ledger,
        }
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<OrderId, Order>>> {
        self.orders
            .write()
            .map_err(|_| DomainError::conflict("order book lock poisoned"))
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<OrderId, Order>>> {
        self.orders
            .read()
            .map_err(|_| DomainError::conflict("order book lock poisoned"))
    }

    pub fn insert(&self, order: Order) -> DomainResult<()> {
        let mut orders = self.write()?;
        if orders.contains_key(&order.id()) {
            return Err(DomainError::conflict("order already exists"));
        }
        orders.insert(order.id(), order);
        Ok(())
    }

    pub fn get(&self, id: OrderId) -> DomainResult<Order> {
        let orders = self.read()?;
        orders.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn submit(&self, id: OrderId) -> DomainResult<OrderStatus> {
        self.with_order(id, Order::submit)
    }

    pub fn confirm(&self, id: OrderId) -> DomainResult<OrderStatus> {
        self.with_order(id, Order::confirm)
    }

    pub fn cancel(&self, id: OrderId) -> DomainResult<OrderStatus> {
        self.with_order(id, Order::cancel)
    }

    fn with_order(
        &self,
        id: OrderId,
        f: impl FnOnce(&mut Order) -> DomainResult<()>,
    ) -> DomainResult<OrderStatus> {
        let mut orders = self.write()?;
        let order = orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        f(order)?;
        Ok(order.status())
    }

    /// Reconcile one receipt/shipment line against its order.
    ///
    /// Appends one stock movement for the accepted quantity (purchase
    /// movements for purchase orders, sale movements for sales orders),
    /// updates the line's cumulative fulfillment, and recomputes the order
    /// status as a pure function of line fulfillment. An over-receipt fails
    /// before anything is written.
    pub fn apply_receipt(&self, order_id: OrderId, receipt: ReceiptLine) -> DomainResult<ReceiptOutcome> {
        receipt.validate()?;

        let mut orders = self.write()?;
        let order = orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;

        if order.status().is_terminal() {
            return Err(DomainError::invalid_transition(
                "cannot receive against a terminal order",
            ));
        }

        let kind = order.kind();
        let branch = order.branch();
        let line = order
            .line(receipt.order_line)
            .ok_or(DomainError::NotFound)?;

        if line.fulfilled_quantity() + receipt.quantity_accepted > line.quantity() {
            return Err(DomainError::over_receipt(format!(
                "accepting {} would exceed ordered quantity {} (already fulfilled {})",
                receipt.quantity_accepted,
                line.quantity(),
                line.fulfilled_quantity()
            )));
        }

        let movement = if receipt.quantity_accepted > 0 {
            let (movement_type, reference_kind) = match kind {
                OrderKind::Purchase => (MovementType::Purchase, ReferenceKind::Receipt),
                OrderKind::Sales => (MovementType::Sale, ReferenceKind::Shipment),
            };
            let id = self.ledger.record_movement(NewMovement {
                product: line.product(),
                branch,
                movement_type,
                quantity: receipt.quantity_accepted,
                unit_price: line.unit_price(),
                reference: Some(MovementReference::new(
                    reference_kind,
                    Uuid::from(receipt.receipt),
                )),
            })?;
            Some(id)
        } else {
            None
        };

        let line = order
            .line_mut(receipt.order_line)
            .ok_or(DomainError::NotFound)?;
        line.add_fulfilled(receipt.quantity_accepted);
        let line_fulfilled = line.fulfilled_quantity();
        order.refresh_fulfillment();

        info!(
            order = %order_id,
            line = %receipt.order_line,
            accepted = receipt.quantity_accepted,
            rejected = receipt.quantity_rejected,
            status = ?order.status(),
            "receipt applied"
        );

        Ok(ReceiptOutcome {
            movement,
            line_fulfilled,
            order_status: order.status(),
        })
    }
}
