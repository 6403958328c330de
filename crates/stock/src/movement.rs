use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fulfil_core::{BranchId, MovementId, ProductId};

/// Effect of a movement on on-hand quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Kind of stock movement.
///
/// Quantity on a movement is always non-negative; the effect on on-hand
/// quantity is encoded here. Purchases, production output and returns are
/// inbound; sales and damage are outbound. Adjustments and transfers carry
/// their own direction: a physical count can correct either way, and a
/// transfer is outbound at the source branch, inbound at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Adjustment(Direction),
    Transfer(Direction),
    Production,
    Return,
    Damage,
}

impl MovementType {
    pub fn direction(self) -> Direction {
        match self {
            MovementType::Purchase | MovementType::Production | MovementType::Return => {
                Direction::Inbound
            }
            MovementType::Sale | MovementType::Damage => Direction::Outbound,
            MovementType::Adjustment(d) | MovementType::Transfer(d) => d,
        }
    }
}

/// What kind of document a movement refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    PurchaseOrder,
    SalesOrder,
    Receipt,
    Shipment,
    ProductionOrder,
    PhysicalCount,
}

/// Back-reference from a movement to the document that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementReference {
    pub kind: ReferenceKind,
    pub id: Uuid,
}

impl MovementReference {
    pub fn new(kind: ReferenceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// A movement ready to be appended (not yet assigned an id or timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product: ProductId,
    pub branch: BranchId,
    pub movement_type: MovementType,
    /// Always >= 0; direction comes from `movement_type`.
    pub quantity: i64,
    /// Unit price in smallest currency unit (e.g. cents).
    pub unit_price: i64,
    pub reference: Option<MovementReference>,
}

/// An immutable, recorded stock movement.
///
/// Never updated or deleted once recorded; corrections are new movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product: ProductId,
    pub branch: BranchId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub unit_price: i64,
    pub reference: Option<MovementReference>,
    pub recorded_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed effect of this movement on on-hand quantity.
    pub fn signed_quantity(&self) -> i64 {
        match self.movement_type.direction() {
            Direction::Inbound => self.quantity,
            Direction::Outbound => -self.quantity,
        }
    }
}
