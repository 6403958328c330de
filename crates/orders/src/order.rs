use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fulfil_core::{
    BranchId, CompanyId, DomainError, DomainResult, OpContext, OrderId, OrderLineId, PartyId,
    ProductId,
};

/// Which side of the business an order sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Goods bought from a supplier; fulfillment is a goods receipt.
    Purchase,
    /// Goods sold to a customer; fulfillment is a shipment.
    Sales,
}

impl OrderKind {
    /// Terminal status reached when every line is fully fulfilled.
    pub fn fulfilled_status(self) -> OrderStatus {
        match self {
            OrderKind::Purchase => OrderStatus::Received,
            OrderKind::Sales => OrderStatus::Delivered,
        }
    }
}

/// Order status lifecycle.
///
/// `Draft -> Submitted -> Confirmed` are the only caller-driven forward
/// transitions; `Partial` and the fulfilled terminal states are computed
/// from line fulfillment, and `Cancelled` is reachable from any non-terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Submitted,
    Confirmed,
    Partial,
    Received,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Received | OrderStatus::Delivered | OrderStatus::Cancelled
        )
    }
}

/// A line of an order.
///
/// `line_total` is always recomputed from quantity, price and discount;
/// it is never stored independently of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    id: OrderLineId,
    product: ProductId,
    /// Product name snapshot at order time (used on invoices and delivery
    /// payloads; the catalog record may change afterwards).
    description: String,
    quantity: i64,
    /// Unit price in smallest currency unit.
    unit_price: i64,
    /// Discount in basis points (0..=10_000), i.e. hundredths of a percent.
    discount_bps: i64,
    line_total: i64,
    /// Cumulative accepted (received/shipped) quantity across all receipts.
    fulfilled_quantity: i64,
}

impl OrderLine {
    fn new(
        id: OrderLineId,
        product: ProductId,
        description: String,
        quantity: i64,
        unit_price: i64,
        discount_bps: i64,
    ) -> DomainResult<Self> {
        let mut line = Self {
            id,
            product,
            description,
            quantity: 0,
            unit_price: 0,
            discount_bps: 0,
            line_total: 0,
            fulfilled_quantity: 0,
        };
        line.set_terms(quantity, unit_price, discount_bps)?;
        Ok(line)
    }

    fn set_terms(&mut self, quantity: i64, unit_price: i64, discount_bps: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "ordered quantity must be positive",
            ));
        }
        if unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        if !(0..=10_000).contains(&discount_bps) {
            return Err(DomainError::validation(
                "discount must be between 0 and 10000 basis points",
            ));
        }
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.discount_bps = discount_bps;
        let gross = quantity * unit_price;
        self.line_total = gross - gross * discount_bps / 10_000;
        Ok(())
    }

    pub fn id(&self) -> OrderLineId {
        self.id
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }

    pub fn discount_bps(&self) -> i64 {
        self.discount_bps
    }

    pub fn line_total(&self) -> i64 {
        self.line_total
    }

    pub fn fulfilled_quantity(&self) -> i64 {
        self.fulfilled_quantity
    }

    pub fn outstanding_quantity(&self) -> i64 {
        self.quantity - self.fulfilled_quantity
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled_quantity >= self.quantity
    }

    pub(crate) fn add_fulfilled(&mut self, accepted: i64) {
        self.fulfilled_quantity += accepted;
    }
}

/// A purchase or sales order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    kind: OrderKind,
    company: CompanyId,
    branch: BranchId,
    /// Supplier for purchase orders, customer for sales orders.
    party: PartyId,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    subtotal: i64,
    tax_amount: i64,
    discount_amount: i64,
    total_amount: i64,
    created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: OrderId, kind: OrderKind, ctx: OpContext, party: PartyId) -> Self {
        Self {
            id,
            kind,
            company: ctx.company,
            branch: ctx.branch,
            party,
            status: OrderStatus::Draft,
            lines: Vec::new(),
            subtotal: 0,
            tax_amount: 0,
            discount_amount: 0,
            total_amount: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn party(&self) -> PartyId {
        self.party
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, id: OrderLineId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub(crate) fn line_mut(&mut self, id: OrderLineId) -> Option<&mut OrderLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    pub fn tax_amount(&self) -> i64 {
        self.tax_amount
    }

    pub fn discount_amount(&self) -> i64 {
        self.discount_amount
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.status != OrderStatus::Draft {
            return Err(DomainError::invalid_transition(
                "only draft orders can be edited",
            ));
        }
        Ok(())
    }

    pub fn add_line(
        &mut self,
        id: OrderLineId,
        product: ProductId,
        description: impl Into<String>,
        quantity: i64,
        unit_price: i64,
        discount_bps: i64,
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        let line = OrderLine::new(
            id,
            product,
            description.into(),
            quantity,
            unit_price,
            discount_bps,
        )?;
        self.lines.push(line);
        self.recompute_totals();
        Ok(())
    }

    /// Change a line's quantity/price/discount. The line total and order
    /// totals are recomputed from the new inputs.
    pub fn update_line(
        &mut self,
        id: OrderLineId,
        quantity: i64,
        unit_price: i64,
        discount_bps: i64,
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        let line = self
            .line_mut(id)
            .ok_or_else(DomainError::not_found)?;
        line.set_terms(quantity, unit_price, discount_bps)?;
        self.recompute_totals();
        Ok(())
    }

    pub fn remove_line(&mut self, id: OrderLineId) -> DomainResult<()> {
        self.ensure_editable()?;
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        if self.lines.len() == before {
            return Err(DomainError::not_found());
        }
        self.recompute_totals();
        Ok(())
    }

    /// Set order-level tax and discount amounts (flat arithmetic only).
    pub fn set_charges(&mut self, tax_amount: i64, discount_amount: i64) -> DomainResult<()> {
        self.ensure_editable()?;
        if tax_amount < 0 || discount_amount < 0 {
            return Err(DomainError::validation(
                "tax and discount amounts cannot be negative",
            ));
        }
        self.tax_amount = tax_amount;
        self.discount_amount = discount_amount;
        self.recompute_totals();
        Ok(())
    }

    fn recompute_totals(&mut self) {
        self.subtotal = self.lines.iter().map(|l| l.line_total).sum();
        self.total_amount = self.subtotal + self.tax_amount - self.discount_amount;
    }

    pub fn submit(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Draft {
            return Err(DomainError::invalid_transition(
                "only draft orders can be submitted",
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot submit an order without lines",
            ));
        }
        self.status = OrderStatus::Submitted;
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Submitted {
            return Err(DomainError::invalid_transition(
                "only submitted orders can be confirmed",
            ));
        }
        self.status = OrderStatus::Confirmed;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                "cannot cancel a received, delivered or cancelled order",
            ));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Status implied by current line fulfillment: the kind's terminal state
    /// when every line is fulfilled, `Partial` when anything has been
    /// accepted, otherwise the current status unchanged.
    pub fn fulfillment_status(&self) -> OrderStatus {
        if !self.lines.is_empty() && self.lines.iter().all(OrderLine::is_fulfilled) {
            return self.kind.fulfilled_status();
        }
        if self.lines.iter().any(|l| l.fulfilled_quantity > 0) {
            return OrderStatus::Partial;
        }
        self.status
    }

    /// Recompute `status` from line fulfillment. Runs after every line
    /// update; never called on terminal orders.
    pub(crate) fn refresh_fulfillment(&mut self) {
        debug_assert!(!self.status.is_terminal());
        self.status = self.fulfillment_status();
    }
}
