//! Recipes and production orders.
//!
//! Completing a production order is a stock event: output enters the ledger
//! as production, consumed ingredients leave it as outbound adjustments,
//! all referencing the production order.

pub mod production;
pub mod recipe;

pub use production::{ProductionOrder, ProductionStatus, complete_production};
pub use recipe::{Recipe, RecipeIngredient};
