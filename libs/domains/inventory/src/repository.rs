use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{Category, Movement, MovementFilter, Product, ProductFilter};

pub(crate) const STOCK_CHANGED: &str = "Estoque do produto foi alterado por outra operação";

/// How a category name is compared when looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    CaseInsensitive,
}

impl NameMatch {
    pub fn matches(self, stored: &str, wanted: &str) -> bool {
        match self {
            NameMatch::Exact => stored == wanted,
            NameMatch::CaseInsensitive => stored.to_lowercase() == wanted.to_lowercase(),
        }
    }
}

/// Quantity write guarded by the value the caller read.
///
/// The write only happens while the product still holds `expected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    pub product_id: Uuid,
    pub expected: i32,
    pub new: i32,
}

/// Repository trait for Category persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    async fn list(&self) -> InventoryResult<Vec<Category>>;

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Category>>;

    /// Whether another category already uses this name, ignoring case
    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool>;

    /// Whether any product references the category
    async fn has_products(&self, id: Uuid) -> InventoryResult<bool>;

    async fn create(&self, category: Category) -> InventoryResult<Category>;

    async fn update(&self, category: Category) -> InventoryResult<Category>;
}

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products matching every criterion of the filter, ordered by name
    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>>;

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>>;

    /// Whether another product already uses this name, ignoring case
    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool>;

    async fn find_category(&self, name: &str, matching: NameMatch)
    -> InventoryResult<Option<Category>>;

    /// Whether any stock movement references the product
    async fn has_movements(&self, id: Uuid) -> InventoryResult<bool>;

    async fn create(&self, product: Product) -> InventoryResult<Product>;

    /// Persist the editable fields; quantity is left untouched
    async fn update(&self, product: Product) -> InventoryResult<Product>;

    /// Returns `false` when no product had this id
    async fn delete(&self, id: Uuid) -> InventoryResult<bool>;

    /// Returns `false` when no product had this id
    async fn set_active(&self, id: Uuid, active: bool) -> InventoryResult<bool>;
}

/// Repository trait for stock levels and movements
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn get_product(&self, id: Uuid) -> InventoryResult<Option<Product>>;

    /// All products ordered by name
    async fn list_products(&self) -> InventoryResult<Vec<Product>>;

    /// Products whose quantity is strictly below their minimum stock
    async fn list_low_stock(&self) -> InventoryResult<Vec<Product>>;

    async fn get_movement(&self, id: Uuid) -> InventoryResult<Option<Movement>>;

    /// Movements matching the filter, ordered by product name
    async fn list_movements(&self, filter: MovementFilter) -> InventoryResult<Vec<Movement>>;

    async fn list_by_product(&self, product_id: Uuid) -> InventoryResult<Vec<Movement>>;

    /// Store the movement and the new quantity atomically.
    ///
    /// Fails with `Conflict` and changes nothing when the quantity moved
    /// away from `change.expected`.
    async fn record_movement(
        &self,
        movement: Movement,
        change: QuantityChange,
    ) -> InventoryResult<()>;

    /// Remove the movement and store the new quantity atomically, with the
    /// same guard as [`StockRepository::record_movement`].
    async fn remove_movement(&self, movement_id: Uuid, change: QuantityChange)
    -> InventoryResult<()>;
}

#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    movements: HashMap<Uuid, Movement>,
}

impl Tables {
    /// Product with its category as currently stored
    fn product(&self, id: Uuid) -> Option<Product> {
        self.products.get(&id).map(|p| self.resolve(p))
    }

    fn resolve(&self, product: &Product) -> Product {
        let mut product = product.clone();
        if let Some(category) = self.categories.get(&product.category.id) {
            product.category = category.clone();
        }
        product
    }

    fn products_sorted(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.values().map(|p| self.resolve(p)).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    fn swap_quantity(&mut self, change: QuantityChange) -> InventoryResult<()> {
        match self.products.get_mut(&change.product_id) {
            Some(product) if product.quantity == change.expected => {
                product.quantity = change.new;
                Ok(())
            }
            _ => Err(InventoryError::Conflict(STOCK_CHANGED.to_string())),
        }
    }
}

/// In-memory implementation of all inventory repositories (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryInventoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryInventoryStore {
    async fn list(&self) -> InventoryResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.get(&id).cloned())
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().any(|c| {
            Some(c.id) != exclude && NameMatch::CaseInsensitive.matches(&c.name, name)
        }))
    }

    async fn has_products(&self, id: Uuid) -> InventoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().any(|p| p.category.id == id))
    }

    async fn create(&self, category: Category) -> InventoryResult<Category> {
        let mut tables = self.tables.write().await;
        tables.categories.insert(category.id, category.clone());

        tracing::info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    async fn update(&self, category: Category) -> InventoryResult<Category> {
        let mut tables = self.tables.write().await;
        match tables.categories.get_mut(&category.id) {
            Some(stored) => *stored = category.clone(),
            None => return Err(InventoryError::NotFound("Categoria não existe".to_string())),
        }

        tracing::info!(category_id = %category.id, "Updated category");
        Ok(category)
    }
}

#[async_trait]
impl ProductRepository for InMemoryInventoryStore {
    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let products = tables
            .products_sorted()
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        Ok(products)
    }

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.product(id))
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().any(|p| {
            Some(p.id) != exclude && NameMatch::CaseInsensitive.matches(&p.name, name)
        }))
    }

    async fn find_category(
        &self,
        name: &str,
        matching: NameMatch,
    ) -> InventoryResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| matching.matches(&c.name, name))
            .cloned())
    }

    async fn has_movements(&self, id: Uuid) -> InventoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.movements.values().any(|m| m.product_id == id))
    }

    async fn create(&self, product: Product) -> InventoryResult<Product> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&product.category.id) {
            return Err(InventoryError::NotFound("Categoria não existe".to_string()));
        }
        tables.products.insert(product.id, product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn update(&self, product: Product) -> InventoryResult<Product> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.products.get_mut(&product.id) else {
            return Err(InventoryError::NotFound("Produto não encontrado".to_string()));
        };
        stored.name = product.name;
        stored.description = product.description;
        stored.price = product.price;
        stored.min_stock = product.min_stock;
        stored.category = product.category;
        let updated = stored.clone();

        tracing::info!(product_id = %updated.id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> InventoryResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.products.remove(&id).is_some() {
            tables.movements.retain(|_, m| m.product_id != id);
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn set_active(&self, id: Uuid, active: bool) -> InventoryResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&id) {
            Some(product) => {
                product.active = active;
                tracing::info!(product_id = %id, active, "Changed product activation");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl StockRepository for InMemoryInventoryStore {
    async fn get_product(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.product(id))
    }

    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products_sorted())
    }

    async fn list_low_stock(&self) -> InventoryResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products_sorted()
            .into_iter()
            .filter(Product::is_low_stock)
            .collect())
    }

    async fn get_movement(&self, id: Uuid) -> InventoryResult<Option<Movement>> {
        let tables = self.tables.read().await;
        Ok(tables.movements.get(&id).cloned())
    }

    async fn list_movements(&self, filter: MovementFilter) -> InventoryResult<Vec<Movement>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<(String, Movement)> = tables
            .movements
            .values()
            .filter_map(|m| {
                let product = tables.product(m.product_id)?;
                filter
                    .matches(m, &product)
                    .then(|| (product.name, m.clone()))
            })
            .collect();
        matched.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.occurred_at.cmp(&b.1.occurred_at)));
        Ok(matched.into_iter().map(|(_, m)| m).collect())
    }

    async fn list_by_product(&self, product_id: Uuid) -> InventoryResult<Vec<Movement>> {
        let tables = self.tables.read().await;
        let mut movements: Vec<Movement> = tables
            .movements
            .values()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect();
        movements.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(movements)
    }

    async fn record_movement(
        &self,
        movement: Movement,
        change: QuantityChange,
    ) -> InventoryResult<()> {
        let mut tables = self.tables.write().await;
        tables.swap_quantity(change)?;
        tables.movements.insert(movement.id, movement.clone());

        tracing::info!(
            movement_id = %movement.id,
            product_id = %change.product_id,
            quantity = change.new,
            "Recorded stock movement"
        );
        Ok(())
    }

    async fn remove_movement(
        &self,
        movement_id: Uuid,
        change: QuantityChange,
    ) -> InventoryResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.movements.contains_key(&movement_id) {
            return Err(InventoryError::Conflict(STOCK_CHANGED.to_string()));
        }
        tables.swap_quantity(change)?;
        tables.movements.remove(&movement_id);

        tracing::info!(
            movement_id = %movement_id,
            product_id = %change.product_id,
            quantity = change.new,
            "Removed stock movement"
        );
        Ok(())
    }
}
