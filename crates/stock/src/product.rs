use serde::{Deserialize, Serialize};

use fulfil_core::{CompanyId, DomainError, DomainResult, ProductId};

/// Unit of measure for a product (e.g. "pcs", "kg").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitOfMeasure(String);

impl UnitOfMeasure {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("unit of measure cannot be empty"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Product master record.
///
/// Deliberately carries no stored on-hand quantity: on-hand is derived from
/// the stock ledger per (product, branch), and only the ledger maintains its
/// cache of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    company: CompanyId,
    name: String,
    code: String,
    unit: UnitOfMeasure,
    /// Cost price in smallest currency unit.
    cost_price: i64,
    /// Selling price in smallest currency unit.
    selling_price: i64,
    reorder_level: i64,
    active: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        company: CompanyId,
        name: impl Into<String>,
        code: impl Into<String>,
        unit: UnitOfMeasure,
        cost_price: i64,
        selling_price: i64,
        reorder_level: i64,
    ) -> DomainResult<Self> {
        let name = name.into();
        let code = code.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if code.trim().is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if cost_price < 0 || selling_price < 0 {
            return Err(DomainError::validation("prices cannot be negative"));
        }
        if reorder_level < 0 {
            return Err(DomainError::invalid_quantity(
                "reorder level cannot be negative",
            ));
        }
        Ok(Self {
            id,
            company,
            name,
            code,
            unit,
            cost_price,
            selling_price,
            reorder_level,
            active: true,
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn cost_price(&self) -> i64 {
        self.cost_price
    }

    pub fn selling_price(&self) -> i64 {
        self.selling_price
    }

    pub fn reorder_level(&self) -> i64 {
        self.reorder_level
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether the given on-hand quantity has fallen to the reorder level.
    pub fn needs_reorder(&self, on_hand: i64) -> bool {
        on_hand <= self.reorder_level
    }
}
