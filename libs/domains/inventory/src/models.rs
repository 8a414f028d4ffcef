use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{InventoryError, InventoryResult};

/// Prices are stored as `decimal(12, 2)`: ten integer digits at most
const PRICE_LIMIT: i64 = 10_000_000_000;

/// Custom validator for prices
fn validate_price(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(validator::ValidationError::new("negative_price"));
    }
    if value.round_dp(2) >= Decimal::from(PRICE_LIMIT) {
        return Err(validator::ValidationError::new("price_too_large"));
    }
    Ok(())
}

/// Kind of a stock movement, persisted by its textual label
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_kind")]
#[serde(try_from = "String")]
pub enum MovementKind {
    /// Increases the product quantity
    #[sea_orm(string_value = "Entrada")]
    #[serde(rename = "Entrada")]
    #[strum(serialize = "Entrada")]
    Entry,
    /// Decreases the product quantity, bounded by the available stock
    #[sea_orm(string_value = "Saida")]
    #[serde(rename = "Saida")]
    #[strum(serialize = "Saida")]
    Exit,
}

impl MovementKind {
    /// The kind that undoes this one
    pub fn reversed(self) -> Self {
        match self {
            MovementKind::Entry => MovementKind::Exit,
            MovementKind::Exit => MovementKind::Entry,
        }
    }
}

impl TryFrom<String> for MovementKind {
    type Error = InventoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Entrada" => Ok(MovementKind::Entry),
            "Saida" => Ok(MovementKind::Exit),
            _ => Err(InventoryError::InvalidState(
                "Tipo de movimentação não definido".to_string(),
            )),
        }
    }
}

/// Quantity after applying a movement of `amount` units to `current`.
///
/// Fails without side effects when an exit exceeds the available stock.
pub fn next_quantity(current: i32, amount: i32, kind: MovementKind) -> InventoryResult<i32> {
    match kind {
        MovementKind::Exit => match current.checked_sub(amount) {
            Some(next) if next >= 0 => Ok(next),
            _ => Err(InventoryError::InvalidState(format!(
                "Estoque {} não contém a quantidade solicitada {}",
                current, amount
            ))),
        },
        MovementKind::Entry => current.checked_add(amount).ok_or_else(|| {
            InventoryError::InvalidState(format!(
                "Estoque {} não comporta a entrada de {} unidades",
                current, amount
            ))
        }),
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
}

/// Body of category create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
}

/// Product with its category resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: Decimal,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
    #[serde(rename = "estoqueMinimo")]
    pub min_stock: i32,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "dataCadastro")]
    pub registered_at: DateTime<Utc>,
    #[serde(rename = "categoria")]
    pub category: Category,
}

impl Product {
    /// New active product with empty stock, registered now
    pub fn new(input: ProductInput, category: Category) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            price: input.price.round_dp(2),
            quantity: 0,
            min_stock: input.min_stock,
            active: true,
            registered_at: Utc::now(),
            category,
        }
    }

    /// Overwrite the editable fields, keeping id, quantity and registration date
    pub fn apply_update(&mut self, input: ProductInput, category: Category) {
        self.name = input.name;
        self.description = input.description;
        self.price = input.price.round_dp(2);
        self.min_stock = input.min_stock;
        self.category = category;
    }

    pub fn apply_movement(&mut self, amount: i32, kind: MovementKind) -> InventoryResult<()> {
        self.quantity = next_quantity(self.quantity, amount, kind)?;
        Ok(())
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.min_stock
    }
}

/// Body of product create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "preco")]
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[serde(rename = "estoqueMinimo", default)]
    #[validate(range(min = 0))]
    pub min_stock: i32,
    /// Name of an existing category
    #[serde(rename = "categoriaNome")]
    #[validate(length(min = 1))]
    pub category_name: String,
}

/// Query parameters for listing products; every bound is strict
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Substring of the product name
    #[serde(rename = "nome")]
    pub name: Option<String>,
    /// Substring of the product description
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "minValor")]
    pub min_price: Option<Decimal>,
    #[serde(rename = "maxValor")]
    pub max_price: Option<Decimal>,
    #[serde(rename = "minQuantidade")]
    pub min_quantity: Option<i32>,
    #[serde(rename = "maxQuantidade")]
    pub max_quantity: Option<i32>,
    /// Category name, case-insensitive
    #[serde(rename = "categoriaNome")]
    pub category_name: Option<String>,
    #[serde(rename = "minData")]
    pub min_date: Option<DateTime<Utc>>,
    #[serde(rename = "maxData")]
    pub max_date: Option<DateTime<Utc>>,
    #[serde(rename = "ativo")]
    pub active: Option<bool>,
}

impl ProductFilter {
    /// Text criteria left empty in a query string are ignored
    pub fn name_term(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    pub fn description_term(&self) -> Option<&str> {
        self.description.as_deref().filter(|s| !s.is_empty())
    }

    pub fn category_term(&self) -> Option<&str> {
        self.category_name.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.name_term().is_none_or(|term| product.name.contains(term))
            && self
                .description_term()
                .is_none_or(|term| product.description.contains(term))
            && self.min_price.is_none_or(|min| product.price > min)
            && self.max_price.is_none_or(|max| product.price < max)
            && self.min_quantity.is_none_or(|min| product.quantity > min)
            && self.max_quantity.is_none_or(|max| product.quantity < max)
            && self
                .category_term()
                .is_none_or(|name| product.category.name.to_lowercase() == name.to_lowercase())
            && self.min_date.is_none_or(|min| product.registered_at > min)
            && self.max_date.is_none_or(|max| product.registered_at < max)
            && self.active.is_none_or(|active| product.active == active)
    }
}

/// Query parameters of `DELETE /produtos/{id}`
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteProductParams {
    /// Deactivate instead of removing the record
    #[serde(default)]
    pub soft: bool,
}

/// Body of `POST /estoques`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMovement {
    #[serde(rename = "produtoId")]
    pub product_id: Uuid,
    #[serde(rename = "tipoMovimentacao")]
    pub kind: MovementKind,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
}

/// A recorded stock movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Movement {
    #[serde(rename = "movimentacaoId")]
    pub id: Uuid,
    #[serde(rename = "produtoId")]
    pub product_id: Uuid,
    #[serde(rename = "tipoMovimentacao")]
    pub kind: MovementKind,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
    /// When the movement was recorded
    #[serde(rename = "data")]
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    pub fn new(input: &CreateMovement) -> Self {
        Self {
            id: Uuid::now_v7(),
            product_id: input.product_id,
            kind: input.kind,
            quantity: input.quantity,
            occurred_at: Utc::now(),
        }
    }
}

/// Quantity on hand for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockSnapshot {
    #[serde(rename = "produtoId")]
    pub product_id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco")]
    pub price: Decimal,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
}

impl From<&Product> for StockSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: product.quantity,
        }
    }
}

/// Response of movement create and delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MovementReceipt {
    #[serde(rename = "estoque")]
    pub stock: StockSnapshot,
    #[serde(rename = "movimentacaoId")]
    pub movement_id: Uuid,
}

/// Stock of one product with its movement history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockDetail {
    #[serde(rename = "estoque")]
    pub stock: StockSnapshot,
    #[serde(rename = "movimentacoes")]
    pub movements: Vec<Movement>,
}

/// Query parameters for listing movements; every bound is strict
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    #[serde(rename = "produtoId")]
    pub product_id: Option<Uuid>,
    #[serde(rename = "categoriaId")]
    pub category_id: Option<Uuid>,
    /// Lower bound on the product's current quantity
    #[serde(rename = "minQuantidade")]
    pub min_quantity: Option<i32>,
    /// Upper bound on the product's current quantity
    #[serde(rename = "maxQuantidade")]
    pub max_quantity: Option<i32>,
    #[serde(rename = "minData")]
    pub min_date: Option<DateTime<Utc>>,
    #[serde(rename = "maxData")]
    pub max_date: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement, product: &Product) -> bool {
        self.product_id.is_none_or(|id| movement.product_id == id)
            && self.category_id.is_none_or(|id| product.category.id == id)
            && self.min_quantity.is_none_or(|min| product.quantity > min)
            && self.max_quantity.is_none_or(|max| product.quantity < max)
            && self.min_date.is_none_or(|min| movement.occurred_at > min)
            && self.max_date.is_none_or(|max| movement.occurred_at < max)
    }
}
