//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod context;
pub mod error;
pub mod id;

pub use context::OpContext;
pub use error::{DomainError, DomainResult};
pub use id::{
    BranchId, CompanyId, DeliveryOrderId, InvoiceId, MovementId, OrderId, OrderLineId, PartyId,
    ProductId, ProductionOrderId, ReceiptId, RecipeId,
};
