use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{
    Category, CategoryInput, CreateMovement, Movement, MovementFilter, MovementReceipt, Product,
    ProductFilter, ProductInput, StockDetail, StockSnapshot, next_quantity,
};
use crate::repository::{
    CategoryRepository, NameMatch, ProductRepository, QuantityChange, StockRepository,
};

fn product_not_found() -> InventoryError {
    InventoryError::NotFound("Produto não encontrado".to_string())
}

fn product_id_not_found(id: Uuid) -> InventoryError {
    InventoryError::NotFound(format!("Produto com Id {} não encontrado", id))
}

fn category_not_found() -> InventoryError {
    InventoryError::NotFound("Categoria não existe".to_string())
}

/// Service layer for Category business logic
#[derive(Clone)]
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn list_categories(&self) -> InventoryResult<Vec<Category>> {
        self.repository.list().await
    }

    pub async fn get_category(&self, id: Uuid) -> InventoryResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(category_not_found)
    }

    /// Create a category; names are unique ignoring case
    pub async fn create_category(&self, input: CategoryInput) -> InventoryResult<Category> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        if self.repository.name_taken(&input.name, None).await? {
            return Err(InventoryError::Conflict(
                "Já existe esta categoria".to_string(),
            ));
        }

        let category = Category {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
        };
        self.repository.create(category).await
    }

    /// Rename or redescribe a category that no product references yet
    pub async fn update_category(
        &self,
        id: Uuid,
        input: CategoryInput,
    ) -> InventoryResult<Category> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let mut category = self.get_category(id).await?;

        if self.repository.has_products(id).await? {
            return Err(InventoryError::Conflict(
                "Existe um produto com essa categoria".to_string(),
            ));
        }

        if self.repository.name_taken(&input.name, Some(id)).await? {
            return Err(InventoryError::Conflict("Categoria já existe".to_string()));
        }

        category.name = input.name;
        category.description = input.description;
        self.repository.update(category).await
    }
}

/// Service layer for Product business logic
#[derive(Clone)]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn list_products(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        self.repository.list(filter).await
    }

    pub async fn get_product(&self, id: Uuid) -> InventoryResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| product_id_not_found(id))
    }

    /// Create a product with empty stock under an existing category
    pub async fn create_product(&self, input: ProductInput) -> InventoryResult<Product> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let category = self
            .repository
            .find_category(&input.category_name, NameMatch::CaseInsensitive)
            .await?
            .ok_or_else(category_not_found)?;

        if self.repository.name_taken(&input.name, None).await? {
            return Err(InventoryError::Conflict("Produto já existe".to_string()));
        }

        self.repository.create(Product::new(input, category)).await
    }

    /// Replace the editable fields of a product; stock is not touched
    pub async fn update_product(&self, id: Uuid, input: ProductInput) -> InventoryResult<Product> {
        input
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        let category = self
            .repository
            .find_category(&input.category_name, NameMatch::Exact)
            .await?
            .ok_or_else(category_not_found)?;

        let mut product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(product_not_found)?;

        if product.name != input.name && self.repository.name_taken(&input.name, Some(id)).await? {
            return Err(InventoryError::Conflict(
                "Já existe um produto com esse nome".to_string(),
            ));
        }

        product.apply_update(input, category);
        self.repository.update(product).await
    }

    /// Remove a product that has no stock movements
    pub async fn delete_product(&self, id: Uuid) -> InventoryResult<()> {
        if self.repository.get_by_id(id).await?.is_none() {
            return Err(product_id_not_found(id));
        }

        if self.repository.has_movements(id).await? {
            return Err(InventoryError::Conflict(
                "Não é possível excluir produto que possui movimentação".to_string(),
            ));
        }

        if !self.repository.delete(id).await? {
            return Err(product_id_not_found(id));
        }
        Ok(())
    }

    /// Soft delete: the record, its stock and its movements are kept
    pub async fn deactivate_product(&self, id: Uuid) -> InventoryResult<()> {
        if !self.repository.set_active(id, false).await? {
            return Err(product_not_found());
        }
        Ok(())
    }
}

/// Service layer for stock levels and movements
#[derive(Clone)]
pub struct StockService<R: StockRepository> {
    repository: Arc<R>,
}

impl<R: StockRepository> StockService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Record an entry or exit and apply it to the product's stock
    pub async fn create_movement(&self, input: CreateMovement) -> InventoryResult<MovementReceipt> {
        if input.quantity <= 0 {
            return Err(InventoryError::InvalidState(
                "Quantidade deve ser > 0".to_string(),
            ));
        }

        let mut product = self
            .repository
            .get_product(input.product_id)
            .await?
            .ok_or_else(product_not_found)?;

        let expected = product.quantity;
        product.apply_movement(input.quantity, input.kind)?;

        let movement = Movement::new(&input);
        let movement_id = movement.id;
        let change = QuantityChange {
            product_id: product.id,
            expected,
            new: product.quantity,
        };
        self.repository.record_movement(movement, change).await?;

        Ok(MovementReceipt {
            stock: StockSnapshot::from(&product),
            movement_id,
        })
    }

    /// Delete a movement, undoing its effect on the product's stock
    pub async fn delete_movement(&self, id: Uuid) -> InventoryResult<MovementReceipt> {
        let movement = self.get_movement(id).await?;

        let mut product = self
            .repository
            .get_product(movement.product_id)
            .await?
            .ok_or_else(product_not_found)?;

        let expected = product.quantity;
        product.quantity = next_quantity(expected, movement.quantity, movement.kind.reversed())?;

        let change = QuantityChange {
            product_id: product.id,
            expected,
            new: product.quantity,
        };
        self.repository.remove_movement(id, change).await?;

        Ok(MovementReceipt {
            stock: StockSnapshot::from(&product),
            movement_id: id,
        })
    }

    pub async fn get_stock(&self, product_id: Uuid) -> InventoryResult<StockDetail> {
        let product = self
            .repository
            .get_product(product_id)
            .await?
            .ok_or_else(product_not_found)?;
        let movements = self.repository.list_by_product(product_id).await?;

        Ok(StockDetail {
            stock: StockSnapshot::from(&product),
            movements,
        })
    }

    pub async fn list_stocks(&self) -> InventoryResult<Vec<StockSnapshot>> {
        let products = self.repository.list_products().await?;
        Ok(products.iter().map(StockSnapshot::from).collect())
    }

    /// Products whose quantity is strictly below their minimum stock
    pub async fn low_stock(&self) -> InventoryResult<Vec<StockSnapshot>> {
        let products = self.repository.list_low_stock().await?;
        Ok(products.iter().map(StockSnapshot::from).collect())
    }

    pub async fn get_movement(&self, id: Uuid) -> InventoryResult<Movement> {
        self.repository
            .get_movement(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound("Movimentação não encontrada".to_string()))
    }

    /// List movements; a filter is required, even an empty one
    pub async fn list_movements(
        &self,
        filter: Option<MovementFilter>,
    ) -> InventoryResult<Vec<Movement>> {
        let filter = filter
            .ok_or_else(|| InventoryError::InvalidState("Filtro não setado".to_string()))?;
        self.repository.list_movements(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovementKind;
    use crate::repository::{MockCategoryRepository, MockProductRepository, MockStockRepository};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: "Aparelhos".to_string(),
        }
    }

    fn product_input(name: &str, category_name: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: "Periférico".to_string(),
            price: "150.00".parse().unwrap(),
            min_stock: 5,
            category_name: category_name.to_string(),
        }
    }

    fn product(name: &str, quantity: i32) -> Product {
        let mut product = Product::new(product_input(name, "Eletrônicos"), category("Eletrônicos"));
        product.quantity = quantity;
        product
    }

    fn movement(product_id: Uuid, kind: MovementKind, quantity: i32) -> Movement {
        Movement {
            id: Uuid::new_v4(),
            product_id,
            kind,
            quantity,
            occurred_at: Utc::now(),
        }
    }

    fn assert_conflict(err: InventoryError, expected: &str) {
        assert!(
            matches!(&err, InventoryError::Conflict(msg) if msg == expected),
            "unexpected error: {:?}",
            err
        );
    }

    fn assert_not_found(err: InventoryError, expected: &str) {
        assert!(
            matches!(&err, InventoryError::NotFound(msg) if msg == expected),
            "unexpected error: {:?}",
            err
        );
    }

    // Categories

    #[tokio::test]
    async fn test_create_category_rejects_duplicate_name() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_name_taken()
            .withf(|name, exclude| name.to_string() == "eletrônicos" && exclude.is_none())
            .returning(|_, _| Ok(true));
        repo.expect_create().never();

        let service = CategoryService::new(repo);
        let err = service
            .create_category(category_input("eletrônicos"))
            .await
            .unwrap_err();

        assert_conflict(err, "Já existe esta categoria");
    }

    #[tokio::test]
    async fn test_create_category_persists_input() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_name_taken().returning(|_, _| Ok(false));
        repo.expect_create()
            .withf(|c| c.name == "Livros" && c.description == "Aparelhos")
            .returning(Ok);

        let service = CategoryService::new(repo);
        let created = service.create_category(category_input("Livros")).await.unwrap();

        assert_eq!(created.name, "Livros");
    }

    #[tokio::test]
    async fn test_create_category_validates_name_length() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_name_taken().never();

        let service = CategoryService::new(repo);
        let err = service
            .create_category(category_input(&"x".repeat(101)))
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_category_fails() {
        let id = Uuid::new_v4();
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id().with(eq(id)).returning(|_| Ok(None));
        repo.expect_update().never();

        let service = CategoryService::new(repo);
        let err = service
            .update_category(id, category_input("Livros"))
            .await
            .unwrap_err();

        assert_not_found(err, "Categoria não existe");
    }

    #[tokio::test]
    async fn test_update_category_with_products_conflicts() {
        let existing = category("Eletrônicos");
        let id = existing.id;
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_has_products().with(eq(id)).returning(|_| Ok(true));
        repo.expect_update().never();

        let service = CategoryService::new(repo);
        let err = service
            .update_category(id, category_input("Eletro"))
            .await
            .unwrap_err();

        assert_conflict(err, "Existe um produto com essa categoria");
    }

    #[tokio::test]
    async fn test_update_category_rejects_name_of_another_category() {
        let existing = category("Eletrônicos");
        let id = existing.id;
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_has_products().returning(|_| Ok(false));
        repo.expect_name_taken()
            .withf(move |_, exclude| *exclude == Some(id))
            .returning(|_, _| Ok(true));

        let service = CategoryService::new(repo);
        let err = service
            .update_category(id, category_input("Livros"))
            .await
            .unwrap_err();

        assert_conflict(err, "Categoria já existe");
    }

    #[tokio::test]
    async fn test_update_category_overwrites_fields() {
        let existing = category("Eletrônicos");
        let id = existing.id;
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_has_products().returning(|_| Ok(false));
        repo.expect_name_taken().returning(|_, _| Ok(false));
        repo.expect_update().returning(Ok);

        let service = CategoryService::new(repo);
        let updated = service
            .update_category(id, category_input("Eletro"))
            .await
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Eletro");
        assert_eq!(updated.description, "Aparelhos");
    }

    // Products

    #[tokio::test]
    async fn test_create_product_requires_category() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .withf(|name, matching| {
                name.to_string() == "eletrônicos" && *matching == NameMatch::CaseInsensitive
            })
            .returning(|_, _| Ok(None));
        repo.expect_create().never();

        let service = ProductService::new(repo);
        let err = service
            .create_product(product_input("Teclado", "eletrônicos"))
            .await
            .unwrap_err();

        assert_not_found(err, "Categoria não existe");
    }

    #[tokio::test]
    async fn test_create_product_rejects_duplicate_name() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .returning(|_, _| Ok(Some(category("Eletrônicos"))));
        repo.expect_name_taken().returning(|_, _| Ok(true));
        repo.expect_create().never();

        let service = ProductService::new(repo);
        let err = service
            .create_product(product_input("teclado", "Eletrônicos"))
            .await
            .unwrap_err();

        assert_conflict(err, "Produto já existe");
    }

    #[tokio::test]
    async fn test_create_product_starts_active_with_empty_stock() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .returning(|_, _| Ok(Some(category("Eletrônicos"))));
        repo.expect_name_taken().returning(|_, _| Ok(false));
        repo.expect_create().returning(Ok);

        let service = ProductService::new(repo);
        let product = service
            .create_product(product_input("Teclado", "Eletrônicos"))
            .await
            .unwrap();

        assert_eq!(product.quantity, 0);
        assert!(product.active);
        assert_eq!(product.category.name, "Eletrônicos");
    }

    #[tokio::test]
    async fn test_get_missing_product_reports_id() {
        let id = Uuid::new_v4();
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service.get_product(id).await.unwrap_err();

        assert_not_found(err, &format!("Produto com Id {} não encontrado", id));
    }

    #[tokio::test]
    async fn test_update_product_uses_exact_category_name() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .withf(|_, matching| *matching == NameMatch::Exact)
            .returning(|_, _| Ok(None));

        let service = ProductService::new(repo);
        let err = service
            .update_product(Uuid::new_v4(), product_input("Teclado", "eletrônicos"))
            .await
            .unwrap_err();

        assert_not_found(err, "Categoria não existe");
    }

    #[tokio::test]
    async fn test_update_missing_product_fails() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .returning(|_, _| Ok(Some(category("Eletrônicos"))));
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service
            .update_product(Uuid::new_v4(), product_input("Teclado", "Eletrônicos"))
            .await
            .unwrap_err();

        assert_not_found(err, "Produto não encontrado");
    }

    #[tokio::test]
    async fn test_update_product_rename_collision_conflicts() {
        let existing = product("Teclado", 3);
        let id = existing.id;
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .returning(|_, _| Ok(Some(category("Eletrônicos"))));
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_name_taken()
            .withf(move |name, exclude| name.to_string() == "Mouse" && *exclude == Some(id))
            .returning(|_, _| Ok(true));
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product(id, product_input("Mouse", "Eletrônicos"))
            .await
            .unwrap_err();

        assert_conflict(err, "Já existe um produto com esse nome");
    }

    #[tokio::test]
    async fn test_update_product_keeps_identity_and_registration_date() {
        let existing = product("Teclado", 3);
        let id = existing.id;
        let registered_at = existing.registered_at;
        let mut repo = MockProductRepository::new();
        repo.expect_find_category()
            .returning(|_, _| Ok(Some(category("Periféricos"))));
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        // Same name: no collision lookup
        repo.expect_name_taken().never();
        repo.expect_update().returning(Ok);

        let service = ProductService::new(repo);
        let updated = service
            .update_product(id, product_input("Teclado", "Periféricos"))
            .await
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.registered_at, registered_at);
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.category.name, "Periféricos");
    }

    #[tokio::test]
    async fn test_delete_product_with_movements_conflicts() {
        let existing = product("Teclado", 3);
        let id = existing.id;
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_has_movements().with(eq(id)).returning(|_| Ok(true));
        repo.expect_delete().never();

        let service = ProductService::new(repo);
        let err = service.delete_product(id).await.unwrap_err();

        assert_conflict(err, "Não é possível excluir produto que possui movimentação");
    }

    #[tokio::test]
    async fn test_delete_missing_product_fails() {
        let id = Uuid::new_v4();
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service.delete_product(id).await.unwrap_err();

        assert_not_found(err, &format!("Produto com Id {} não encontrado", id));
    }

    #[tokio::test]
    async fn test_deactivate_product_ignores_movements() {
        let id = Uuid::new_v4();
        let mut repo = MockProductRepository::new();
        repo.expect_has_movements().never();
        repo.expect_set_active()
            .with(eq(id), eq(false))
            .returning(|_, _| Ok(true));

        let service = ProductService::new(repo);
        service.deactivate_product(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivate_missing_product_fails() {
        let mut repo = MockProductRepository::new();
        repo.expect_set_active().returning(|_, _| Ok(false));

        let service = ProductService::new(repo);
        let err = service.deactivate_product(Uuid::new_v4()).await.unwrap_err();

        assert_not_found(err, "Produto não encontrado");
    }

    // Stock

    #[tokio::test]
    async fn test_create_movement_rejects_non_positive_quantity() {
        let mut repo = MockStockRepository::new();
        repo.expect_get_product().never();

        let service = StockService::new(repo);
        for quantity in [0, -3] {
            let input = CreateMovement {
                product_id: Uuid::new_v4(),
                kind: MovementKind::Entry,
                quantity,
            };
            let err = service.create_movement(input).await.unwrap_err();
            assert!(matches!(err, InventoryError::InvalidState(msg) if msg == "Quantidade deve ser > 0"));
        }
    }

    #[tokio::test]
    async fn test_create_movement_for_unknown_product_fails() {
        let mut repo = MockStockRepository::new();
        repo.expect_get_product().returning(|_| Ok(None));

        let service = StockService::new(repo);
        let input = CreateMovement {
            product_id: Uuid::new_v4(),
            kind: MovementKind::Entry,
            quantity: 1,
        };
        let err = service.create_movement(input).await.unwrap_err();

        assert_not_found(err, "Produto não encontrado");
    }

    #[tokio::test]
    async fn test_exit_beyond_stock_writes_nothing() {
        let existing = product("Teclado", 3);
        let mut repo = MockStockRepository::new();
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_record_movement().never();

        let service = StockService::new(repo);
        let input = CreateMovement {
            product_id: Uuid::new_v4(),
            kind: MovementKind::Exit,
            quantity: 5,
        };
        let err = service.create_movement(input).await.unwrap_err();

        assert!(matches!(
            err,
            InventoryError::InvalidState(msg) if msg == "Estoque 3 não contém a quantidade solicitada 5"
        ));
    }

    #[tokio::test]
    async fn test_create_movement_writes_guarded_quantity() {
        let existing = product("Teclado", 10);
        let product_id = existing.id;
        let mut repo = MockStockRepository::new();
        repo.expect_get_product()
            .with(eq(product_id))
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_record_movement()
            .withf(move |movement, change| {
                movement.product_id == product_id
                    && movement.kind == MovementKind::Exit
                    && movement.quantity == 6
                    && *change
                        == QuantityChange {
                            product_id,
                            expected: 10,
                            new: 4,
                        }
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = StockService::new(repo);
        let receipt = service
            .create_movement(CreateMovement {
                product_id,
                kind: MovementKind::Exit,
                quantity: 6,
            })
            .await
            .unwrap();

        assert_eq!(receipt.stock.product_id, product_id);
        assert_eq!(receipt.stock.quantity, 4);
    }

    #[tokio::test]
    async fn test_concurrent_stock_change_surfaces_conflict() {
        let existing = product("Teclado", 10);
        let mut repo = MockStockRepository::new();
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_record_movement().returning(|_, _| {
            Err(InventoryError::Conflict(
                crate::repository::STOCK_CHANGED.to_string(),
            ))
        });

        let service = StockService::new(repo);
        let err = service
            .create_movement(CreateMovement {
                product_id: Uuid::new_v4(),
                kind: MovementKind::Exit,
                quantity: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_entry_subtracts_it_back() {
        let existing = product("Teclado", 9);
        let product_id = existing.id;
        let entry = movement(product_id, MovementKind::Entry, 5);
        let entry_id = entry.id;
        let mut repo = MockStockRepository::new();
        repo.expect_get_movement()
            .with(eq(entry_id))
            .returning(move |_| Ok(Some(entry.clone())));
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_remove_movement()
            .withf(move |id, change| *id == entry_id && change.expected == 9 && change.new == 4)
            .returning(|_, _| Ok(()));

        let service = StockService::new(repo);
        let receipt = service.delete_movement(entry_id).await.unwrap();

        assert_eq!(receipt.movement_id, entry_id);
        assert_eq!(receipt.stock.quantity, 4);
    }

    #[tokio::test]
    async fn test_delete_entry_already_consumed_is_rejected() {
        let existing = product("Teclado", 2);
        let entry = movement(existing.id, MovementKind::Entry, 5);
        let entry_id = entry.id;
        let mut repo = MockStockRepository::new();
        repo.expect_get_movement()
            .returning(move |_| Ok(Some(entry.clone())));
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_remove_movement().never();

        let service = StockService::new(repo);
        let err = service.delete_movement(entry_id).await.unwrap_err();

        assert!(matches!(err, InventoryError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_delete_exit_restores_quantity() {
        let existing = product("Teclado", 4);
        let exit = movement(existing.id, MovementKind::Exit, 6);
        let exit_id = exit.id;
        let mut repo = MockStockRepository::new();
        repo.expect_get_movement()
            .returning(move |_| Ok(Some(exit.clone())));
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_remove_movement()
            .withf(|_, change| change.new == 10)
            .returning(|_, _| Ok(()));

        let service = StockService::new(repo);
        let receipt = service.delete_movement(exit_id).await.unwrap();

        assert_eq!(receipt.stock.quantity, 10);
    }

    #[tokio::test]
    async fn test_get_missing_movement_fails() {
        let mut repo = MockStockRepository::new();
        repo.expect_get_movement().returning(|_| Ok(None));

        let service = StockService::new(repo);
        let err = service.get_movement(Uuid::new_v4()).await.unwrap_err();

        assert_not_found(err, "Movimentação não encontrada");
    }

    #[tokio::test]
    async fn test_list_movements_requires_filter() {
        let mut repo = MockStockRepository::new();
        repo.expect_list_movements().never();

        let service = StockService::new(repo);
        let err = service.list_movements(None).await.unwrap_err();

        assert!(matches!(err, InventoryError::InvalidState(msg) if msg == "Filtro não setado"));
    }

    #[tokio::test]
    async fn test_stock_detail_includes_movements() {
        let existing = product("Teclado", 5);
        let product_id = existing.id;
        let entry = movement(product_id, MovementKind::Entry, 5);
        let mut repo = MockStockRepository::new();
        repo.expect_get_product()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_list_by_product()
            .with(eq(product_id))
            .returning(move |_| Ok(vec![entry.clone()]));

        let service = StockService::new(repo);
        let detail = service.get_stock(product_id).await.unwrap();

        assert_eq!(detail.stock.quantity, 5);
        assert_eq!(detail.movements.len(), 1);
    }

    #[tokio::test]
    async fn test_low_stock_maps_to_snapshots() {
        let low = product("Mouse", 4);
        let mut repo = MockStockRepository::new();
        repo.expect_list_low_stock()
            .returning(move || Ok(vec![low.clone()]));

        let service = StockService::new(repo);
        let snapshots = service.low_stock().await.unwrap();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name, "Mouse");
        assert_eq!(snapshots[0].quantity, 4);
    }
}
