use crate::state::AppState;
use axum::Router;
use domain_inventory::{
    CategoryService, PgCategoryRepository, PgProductRepository, PgStockRepository,
    ProductService, StockService,
};

/// Wires the PostgreSQL repositories into the inventory services and handlers
pub fn router(state: &AppState) -> Router {
    let categories = CategoryService::new(PgCategoryRepository::new(state.db.clone()));
    let products = ProductService::new(PgProductRepository::new(state.db.clone()));
    let stock = StockService::new(PgStockRepository::new(state.db.clone()));

    domain_inventory::handlers::router(categories, products, stock)
}
