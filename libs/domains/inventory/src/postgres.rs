use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SelectTwo, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{category, movement, product},
    error::{InventoryError, InventoryResult},
    models::{Category, Movement, MovementFilter, Product, ProductFilter},
    repository::{
        CategoryRepository, NameMatch, ProductRepository, QuantityChange, StockRepository,
        STOCK_CHANGED,
    },
};

/// `lower(column) = lower(name)`
fn name_equals_ignoring_case<C: ColumnTrait>(column: C, name: &str) -> Condition {
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
            .eq(name.to_lowercase()),
    )
}

/// Products strictly below their minimum stock, with their category
fn low_stock_query() -> SelectTwo<product::Entity, category::Entity> {
    product::Entity::find()
        .find_also_related(category::Entity)
        .filter(
            Expr::col((product::Entity, product::Column::Quantity))
                .lt(Expr::col((product::Entity, product::Column::MinStock))),
        )
        .order_by_asc(product::Column::Name)
}

fn with_category(
    (model, category): (product::Model, Option<category::Model>),
) -> InventoryResult<Product> {
    let category = category.ok_or_else(|| {
        InventoryError::Database(format!("Product {} has no category", model.id))
    })?;
    Ok(model.into_product(category.into()))
}

pub struct PgCategoryRepository {
    base: BaseRepository<category::Entity>,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> InventoryResult<Vec<Category>> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Category>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool> {
        let mut query = category::Entity::find()
            .filter(name_equals_ignoring_case(category::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(category::Column::Id.ne(id));
        }

        Ok(query.count(self.base.db()).await? > 0)
    }

    async fn has_products(&self, id: Uuid) -> InventoryResult<bool> {
        let count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(self.base.db())
            .await?;
        Ok(count > 0)
    }

    async fn create(&self, category: Category) -> InventoryResult<Category> {
        let model = self.base.insert(category.into()).await?;

        tracing::info!(category_id = %model.id, "Created category");
        Ok(model.into())
    }

    async fn update(&self, category: Category) -> InventoryResult<Category> {
        let id = category.id;
        let model = self.base.update(category.into()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => InventoryError::NotFound("Categoria não existe".to_string()),
            other => other.into(),
        })?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(model.into())
    }
}

pub struct PgProductRepository {
    base: BaseRepository<product::Entity>,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, filter: ProductFilter) -> InventoryResult<Vec<Product>> {
        let mut query = product::Entity::find().find_also_related(category::Entity);

        if let Some(term) = filter.name_term() {
            query = query.filter(product::Column::Name.contains(term));
        }
        if let Some(term) = filter.description_term() {
            query = query.filter(product::Column::Description.contains(term));
        }
        if let Some(min) = filter.min_price {
            query = query.filter(product::Column::Price.gt(min));
        }
        if let Some(max) = filter.max_price {
            query = query.filter(product::Column::Price.lt(max));
        }
        if let Some(min) = filter.min_quantity {
            query = query.filter(product::Column::Quantity.gt(min));
        }
        if let Some(max) = filter.max_quantity {
            query = query.filter(product::Column::Quantity.lt(max));
        }
        if let Some(name) = filter.category_term() {
            query = query.filter(name_equals_ignoring_case(category::Column::Name, name));
        }
        if let Some(min) = filter.min_date {
            query = query.filter(product::Column::RegisteredAt.gt(min));
        }
        if let Some(max) = filter.max_date {
            query = query.filter(product::Column::RegisteredAt.lt(max));
        }
        if let Some(active) = filter.active {
            query = query.filter(product::Column::Active.eq(active));
        }

        let rows = query
            .order_by_asc(product::Column::Name)
            .all(self.base.db())
            .await?;

        rows.into_iter().map(with_category).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let row = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(self.base.db())
            .await?;

        row.map(with_category).transpose()
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> InventoryResult<bool> {
        let mut query = product::Entity::find()
            .filter(name_equals_ignoring_case(product::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(product::Column::Id.ne(id));
        }

        Ok(query.count(self.base.db()).await? > 0)
    }

    async fn find_category(
        &self,
        name: &str,
        matching: NameMatch,
    ) -> InventoryResult<Option<Category>> {
        let condition = match matching {
            NameMatch::Exact => Condition::all().add(category::Column::Name.eq(name)),
            NameMatch::CaseInsensitive => name_equals_ignoring_case(category::Column::Name, name),
        };

        let model = category::Entity::find()
            .filter(condition)
            .one(self.base.db())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn has_movements(&self, id: Uuid) -> InventoryResult<bool> {
        let count = movement::Entity::find()
            .filter(movement::Column::ProductId.eq(id))
            .count(self.base.db())
            .await?;
        Ok(count > 0)
    }

    async fn create(&self, product: Product) -> InventoryResult<Product> {
        let category = product.category.clone();
        let model = self.base.insert(product.into()).await?;

        tracing::info!(product_id = %model.id, "Created product");
        Ok(model.into_product(category))
    }

    async fn update(&self, product: Product) -> InventoryResult<Product> {
        let model = self
            .base
            .update(product::editable_fields(&product))
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => {
                    InventoryError::NotFound("Produto não encontrado".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(product_id = %model.id, "Updated product");
        Ok(model.into_product(product.category))
    }

    async fn delete(&self, id: Uuid) -> InventoryResult<bool> {
        let rows_affected = self.base.delete_by_id(id).await?;

        if rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn set_active(&self, id: Uuid, active: bool) -> InventoryResult<bool> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::Active, Expr::value(active))
            .filter(product::Column::Id.eq(id))
            .exec(self.base.db())
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, active, "Changed product activation");
        }
        Ok(result.rows_affected > 0)
    }
}

pub struct PgStockRepository {
    base: BaseRepository<movement::Entity>,
}

impl PgStockRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Compare-and-swap of the product quantity inside `txn`
    async fn swap_quantity<C: sea_orm::ConnectionTrait>(
        txn: &C,
        change: QuantityChange,
    ) -> InventoryResult<bool> {
        let result = product::Entity::update_many()
            .col_expr(product::Column::Quantity, Expr::value(change.new))
            .filter(product::Column::Id.eq(change.product_id))
            .filter(product::Column::Quantity.eq(change.expected))
            .exec(txn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl StockRepository for PgStockRepository {
    async fn get_product(&self, id: Uuid) -> InventoryResult<Option<Product>> {
        let row = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(self.base.db())
            .await?;

        row.map(with_category).transpose()
    }

    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let rows = product::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(product::Column::Name)
            .all(self.base.db())
            .await?;

        rows.into_iter().map(with_category).collect()
    }

    async fn list_low_stock(&self) -> InventoryResult<Vec<Product>> {
        let rows = low_stock_query().all(self.base.db()).await?;

        rows.into_iter().map(with_category).collect()
    }

    async fn get_movement(&self, id: Uuid) -> InventoryResult<Option<Movement>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn list_movements(&self, filter: MovementFilter) -> InventoryResult<Vec<Movement>> {
        let mut query = movement::Entity::find().inner_join(product::Entity);

        if let Some(id) = filter.product_id {
            query = query.filter(movement::Column::ProductId.eq(id));
        }
        if let Some(id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(id));
        }
        if let Some(min) = filter.min_quantity {
            query = query.filter(product::Column::Quantity.gt(min));
        }
        if let Some(max) = filter.max_quantity {
            query = query.filter(product::Column::Quantity.lt(max));
        }
        if let Some(min) = filter.min_date {
            query = query.filter(movement::Column::OccurredAt.gt(min));
        }
        if let Some(max) = filter.max_date {
            query = query.filter(movement::Column::OccurredAt.lt(max));
        }

        let models = query
            .order_by_asc(product::Column::Name)
            .order_by_asc(movement::Column::OccurredAt)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_by_product(&self, product_id: Uuid) -> InventoryResult<Vec<Movement>> {
        let models = movement::Entity::find()
            .filter(movement::Column::ProductId.eq(product_id))
            .order_by_asc(movement::Column::OccurredAt)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn record_movement(
        &self,
        movement: Movement,
        change: QuantityChange,
    ) -> InventoryResult<()> {
        let txn = self.base.db().begin().await?;

        if !Self::swap_quantity(&txn, change).await? {
            txn.rollback().await?;
            tracing::warn!(product_id = %change.product_id, "Stock changed concurrently");
            return Err(InventoryError::Conflict(STOCK_CHANGED.to_string()));
        }

        let movement_id = movement.id;
        movement::ActiveModel::from(movement).insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            movement_id = %movement_id,
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
        let txn = self.base.db().begin().await?;

        let deleted = movement::Entity::delete_by_id(movement_id).exec(&txn).await?;
        if deleted.rows_affected == 0 || !Self::swap_quantity(&txn, change).await? {
            txn.rollback().await?;
            tracing::warn!(movement_id = %movement_id, "Stock changed concurrently");
            return Err(InventoryError::Conflict(STOCK_CHANGED.to_string()));
        }

        txn.commit().await?;

        tracing::info!(
            movement_id = %movement_id,
            product_id = %change.product_id,
            quantity = change.new,
            "Removed stock movement"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovementKind;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};

    #[test]
    fn test_case_insensitive_name_lowers_both_sides() {
        let sql = category::Entity::find()
            .filter(name_equals_ignoring_case(category::Column::Name, "BeBidas"))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#"LOWER("categories"."name") = 'bebidas'"#), "{}", sql);
    }

    #[test]
    fn test_low_stock_compares_quantity_with_minimum() {
        let sql = low_stock_query().build(DatabaseBackend::Postgres).to_string();

        assert!(
            sql.contains(r#""products"."quantity" < "products"."min_stock""#),
            "{}",
            sql
        );
        assert!(sql.contains(r#"ORDER BY "products"."name" ASC"#), "{}", sql);
    }

    fn change() -> QuantityChange {
        QuantityChange {
            product_id: Uuid::new_v4(),
            expected: 10,
            new: 4,
        }
    }

    #[tokio::test]
    async fn test_record_movement_conflicts_when_quantity_moved() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgStockRepository::new(db);
        let change = change();
        let movement = Movement {
            id: Uuid::new_v4(),
            product_id: change.product_id,
            kind: MovementKind::Exit,
            quantity: 6,
            occurred_at: Utc::now(),
        };

        let err = repo.record_movement(movement, change).await.unwrap_err();

        assert!(matches!(err, InventoryError::Conflict(msg) if msg == STOCK_CHANGED));
    }

    #[tokio::test]
    async fn test_remove_missing_movement_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgStockRepository::new(db);

        let err = repo.remove_movement(Uuid::new_v4(), change()).await.unwrap_err();

        assert!(matches!(err, InventoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_active_reports_missing_product() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert!(!repo.set_active(Uuid::new_v4(), false).await.unwrap());
    }
}
