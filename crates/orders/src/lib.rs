//! Purchase/sales orders, invoicing, and order reconciliation.
//!
//! Purchase and sales orders are structurally identical (`Order` +
//! `OrderKind`); what differs is the party role, the fulfillment terminal
//! state, and the direction of the stock movement a receipt or shipment
//! appends.

pub mod invoice;
pub mod order;
pub mod reconciliation;

pub use invoice::{InvoiceLine, SalesInvoice};
pub use order::{Order, OrderKind, OrderLine, OrderStatus};
pub use reconciliation::{OrderBook, ReceiptLine, ReceiptOutcome};
