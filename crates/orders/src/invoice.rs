use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fulfil_core::{BranchId, CompanyId, DomainError, DomainResult, InvoiceId, OrderId, PartyId, ProductId};

use crate::order::{Order, OrderKind, OrderStatus};

/// A billed line, snapshotted from the order line it was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product: ProductId,
    pub description: String,
    pub quantity: i64,
    /// Unit price in smallest currency unit.
    pub unit_price: i64,
    pub line_total: i64,
}

/// A sales invoice cut from a confirmed sales order.
///
/// Invoicing is what makes an order deliverable: a delivery order references
/// exactly one invoice, and delivery payloads are built from its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesInvoice {
    id: InvoiceId,
    invoice_number: String,
    order: OrderId,
    company: CompanyId,
    branch: BranchId,
    customer: PartyId,
    lines: Vec<InvoiceLine>,
    subtotal: i64,
    tax_amount: i64,
    discount_amount: i64,
    total_amount: i64,
    issued_at: DateTime<Utc>,
}

impl SalesInvoice {
    /// Cut an invoice from a sales order.
    ///
    /// Only confirmed (or partially/fully fulfilled) sales orders can be
    /// invoiced; drafts have no committed terms and cancelled orders have
    /// nothing to bill.
    pub fn from_order(
        id: InvoiceId,
        invoice_number: impl Into<String>,
        order: &Order,
    ) -> DomainResult<Self> {
        if order.kind() != OrderKind::Sales {
            return Err(DomainError::validation(
                "only sales orders can be invoiced",
            ));
        }
        match order.status() {
            OrderStatus::Confirmed | OrderStatus::Partial | OrderStatus::Delivered => {}
            _ => {
                return Err(DomainError::invalid_transition(
                    "order must be confirmed before invoicing",
                ));
            }
        }
        let invoice_number = invoice_number.into();
        if invoice_number.trim().is_empty() {
            return Err(DomainError::validation("invoice number cannot be empty"));
        }

        let lines = order
            .lines()
            .iter()
            .map(|l| InvoiceLine {
                product: l.product(),
                description: l.description().to_string(),
                quantity: l.quantity(),
                unit_price: l.unit_price(),
                line_total: l.line_total(),
            })
            .collect();

        Ok(Self {
            id,
            invoice_number,
            order: order.id(),
            company: order.company(),
            branch: order.branch(),
            customer: order.party(),
            lines,
            subtotal: order.subtotal(),
            tax_amount: order.tax_amount(),
            discount_amount: order.discount_amount(),
            total_amount: order.total_amount(),
            issued_at: Utc::now(),
        })
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn order(&self) -> OrderId {
        self.order
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn customer(&self) -> PartyId {
        self.customer
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
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

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulfil_core::{OpContext, OrderLineId};

    fn confirmed_sales_order() -> Order {
        let ctx = OpContext::new(CompanyId::new(), BranchId::new());
        let mut order = Order::new(OrderId::new(), OrderKind::Sales, ctx, PartyId::new());
        order
            .add_line(OrderLineId::new(), ProductId::new(), "Falafel wrap", 2, 1_500, 0)
            .unwrap();
        order
            .add_line(OrderLineId::new(), ProductId::new(), "Mint lemonade", 1, 800, 0)
            .unwrap();
        order.submit().unwrap();
        order.confirm().unwrap();
        order
    }

    #[test]
    fn invoice_snapshots_order_lines_and_totals() {
        let order = confirmed_sales_order();
        let invoice = SalesInvoice::from_order(InvoiceId::new(), "INV-0001", &order).unwrap();

        assert_eq!(invoice.order(), order.id());
        assert_eq!(invoice.lines().len(), 2);
        assert_eq!(invoice.subtotal(), 3_800);
        assert_eq!(invoice.total_amount(), order.total_amount());
        assert_eq!(invoice.lines()[0].description, "Falafel wrap");
    }

    #[test]
    fn unconfirmed_orders_cannot_be_invoiced() {
        let ctx = OpContext::new(CompanyId::new(), BranchId::new());
        let mut order = Order::new(OrderId::new(), OrderKind::Sales, ctx, PartyId::new());
        order
            .add_line(OrderLineId::new(), ProductId::new(), "Wrap", 1, 1_000, 0)
            .unwrap();

        let err = SalesInvoice::from_order(InvoiceId::new(), "INV-0002", &order).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn purchase_orders_cannot_be_invoiced() {
        let ctx = OpContext::new(CompanyId::new(), BranchId::new());
        let mut order = Order::new(OrderId::new(), OrderKind::Purchase, ctx, PartyId::new());
        order
            .add_line(OrderLineId::new(), ProductId::new(), "Beans", 1, 1_000, 0)
            .unwrap();
        order.submit().unwrap();
        order.confirm().unwrap();

        let err = SalesInvoice::from_order(InvoiceId::new(), "INV-0003", &order).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
