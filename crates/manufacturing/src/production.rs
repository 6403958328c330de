use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fulfil_core::{
    BranchId, CompanyId, DomainError, DomainResult, OpContext, ProductionOrderId, RecipeId,
};
use fulfil_stock::{
    Direction, MovementReference, MovementType, NewMovement, ReferenceKind, StockLedger,
};

/// Lifecycle of a production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Draft,
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl ProductionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProductionStatus::Completed | ProductionStatus::Cancelled)
    }
}

/// An order to manufacture a quantity of a recipe's output product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrder {
    id: ProductionOrderId,
    recipe: RecipeId,
    company: CompanyId,
    branch: BranchId,
    status: ProductionStatus,
    /// Units of output planned.
    planned_quantity: i64,
    /// Units actually produced, set on completion.
    produced_quantity: i64,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl ProductionOrder {
    pub fn new(
        id: ProductionOrderId,
        recipe: RecipeId,
        ctx: OpContext,
        planned_quantity: i64,
    ) -> DomainResult<Self> {
        if planned_quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "planned production quantity must be positive",
            ));
        }
        Ok(Self {
            id,
            recipe,
            company: ctx.company,
            branch: ctx.branch,
            status: ProductionStatus::Draft,
            planned_quantity,
            produced_quantity: 0,
            started_at: None,
            completed_at: None,
        })
    }

    pub fn id(&self) -> ProductionOrderId {
        self.id
    }

    pub fn recipe(&self) -> RecipeId {
        self.recipe
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn status(&self) -> ProductionStatus {
        self.status
    }

    pub fn planned_quantity(&self) -> i64 {
        self.planned_quantity
    }

    pub fn produced_quantity(&self) -> i64 {
        self.produced_quantity
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn plan(&mut self) -> DomainResult<()> {
        if self.status != ProductionStatus::Draft {
            return Err(DomainError::invalid_transition(
                "only draft production orders can be planned",
            ));
        }
        self.status = ProductionStatus::Planned;
        Ok(())
    }

    pub fn start(&mut self) -> DomainResult<()> {
        if self.status != ProductionStatus::Planned {
            return Err(DomainError::invalid_transition(
                "only planned production orders can be started",
            ));
        }
        self.status = ProductionStatus::InProgress;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                "production order is already closed",
            ));
        }
        self.status = ProductionStatus::Cancelled;
        Ok(())
    }
}

/// Complete an in-progress production order against the stock ledger.
///
/// Records one outbound adjustment per ingredient for the consumed raw
/// materials and one production movement for the finished output. Ingredient
/// draw-down scales with the produced quantity, which may differ from the
/// planned one. All movements reference the production order.
pub fn complete_production<L: StockLedger>(
    ledger: &L,
    order: &mut ProductionOrder,
    recipe: &crate::recipe::Recipe,
    produced: i64,
) -> DomainResult<()> {
    if order.status != ProductionStatus::InProgress {
        return Err(DomainError::invalid_transition(
            "only in-progress production orders can be completed",
        ));
    }
    if produced <= 0 {
        return Err(DomainError::invalid_quantity(
            "produced quantity must be positive",
        ));
    }
    if recipe.id() != order.recipe {
        return Err(DomainError::validation(
            "recipe does not belong to this production order",
        ));
    }

    let reference = MovementReference::new(ReferenceKind::ProductionOrder, Uuid::from(order.id));

    for ingredient in recipe.consumption_for(produced) {
        ledger.record_movement(NewMovement {
            product: ingredient.product,
            branch: order.branch,
            movement_type: MovementType::Adjustment(Direction::Outbound),
            quantity: ingredient.quantity,
            unit_price: 0,
            reference: Some(reference),
        })?;
    }

    ledger.record_movement(NewMovement {
        product: recipe.output_product(),
        branch: order.branch,
        movement_type: MovementType::Production,
        quantity: produced,
        unit_price: 0,
        reference: Some(reference),
    })?;

    order.produced_quantity = produced;
    order.status = ProductionStatus::Completed;
    order.completed_at = Some(Utc::now());
    info!(
        production_order = %order.id,
        recipe = %recipe.id(),
        produced,
        "production order completed"
    );
    Ok(())
}
