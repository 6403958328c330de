use serde::{Deserialize, Serialize};

use fulfil_core::{CompanyId, DomainError, DomainResult, ProductId, RecipeId};

/// One raw material consumed by a recipe, per output batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub product: ProductId,
    /// Quantity consumed per `output_quantity` units produced.
    pub quantity: i64,
}

/// A bill of materials: which ingredients make which finished product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    id: RecipeId,
    company: CompanyId,
    name: String,
    code: String,
    output_product: ProductId,
    /// Units of `output_product` one batch yields.
    output_quantity: i64,
    ingredients: Vec<RecipeIngredient>,
}

impl Recipe {
    pub fn new(
        id: RecipeId,
        company: CompanyId,
        name: impl Into<String>,
        code: impl Into<String>,
        output_product: ProductId,
        output_quantity: i64,
        ingredients: Vec<RecipeIngredient>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let code = code.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("recipe name cannot be empty"));
        }
        if output_quantity <= 0 {
            return Err(DomainError::invalid_quantity(
                "recipe output quantity must be positive",
            ));
        }
        if ingredients.is_empty() {
            return Err(DomainError::validation(
                "recipe must have at least one ingredient",
            ));
        }
        if ingredients.iter().any(|i| i.quantity <= 0) {
            return Err(DomainError::invalid_quantity(
                "ingredient quantities must be positive",
            ));
        }
        Ok(Self {
            id,
            company,
            name,
            code,
            output_product,
            output_quantity,
            ingredients,
        })
    }

    pub fn id(&self) -> RecipeId {
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

    pub fn output_product(&self) -> ProductId {
        self.output_product
    }

    pub fn output_quantity(&self) -> i64 {
        self.output_quantity
    }

    pub fn ingredients(&self) -> &[RecipeIngredient] {
        &self.ingredients
    }

    /// Ingredient draw-down for producing `produced` units of output.
    pub fn consumption_for(&self, produced: i64) -> Vec<RecipeIngredient> {
        self.ingredients
            .iter()
            .map(|i| RecipeIngredient {
                product: i.product,
                quantity: i.quantity * produced / self.output_quantity,
            })
            .collect()
    }
}
