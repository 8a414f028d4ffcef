//! HTTP endpoints for categories, products and stock.
//!
//! Each resource has its own router; [`router`] nests them under
//! `/categorias`, `/produtos` and `/estoques`.

pub mod categories;
pub mod products;
pub mod stock;

use axum::{Router, http::HeaderMap};
use axum_helpers::{
    AuditEvent, AuditOutcome,
    errors::responses::{
        BadRequestStateResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, InternalServerErrorResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde::Serialize;
use utoipa::OpenApi;

use crate::models::{
    Category, CategoryInput, CreateMovement, Movement, MovementFilter, MovementKind,
    MovementReceipt, Product, ProductFilter, ProductInput, StockDetail, StockSnapshot,
};
use crate::repository::{CategoryRepository, ProductRepository, StockRepository};
use crate::service::{CategoryService, ProductService, StockService};

pub(crate) const CATEGORY_TAG: &str = "categorias";
pub(crate) const PRODUCT_TAG: &str = "produtos";
pub(crate) const STOCK_TAG: &str = "estoques";

/// OpenAPI documentation for the inventory API
#[derive(OpenApi)]
#[openapi(
    paths(
        categories::list_categories,
        categories::create_category,
        categories::get_category,
        categories::update_category,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        stock::create_movement,
        stock::list_stocks,
        stock::low_stock,
        stock::get_stock,
        stock::list_movements,
        stock::get_movement,
        stock::delete_movement,
    ),
    components(
        schemas(
            Category,
            CategoryInput,
            Product,
            ProductInput,
            ProductFilter,
            CreateMovement,
            Movement,
            MovementKind,
            MovementFilter,
            MovementReceipt,
            StockSnapshot,
            StockDetail,
        ),
        responses(
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            BadRequestStateResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = CATEGORY_TAG, description = "Product categories"),
        (name = PRODUCT_TAG, description = "Product catalog"),
        (name = STOCK_TAG, description = "Stock levels and movements")
    )
)]
pub struct ApiDoc;

/// Create the inventory router with all HTTP endpoints
pub fn router<C, P, S>(
    categories: CategoryService<C>,
    products: ProductService<P>,
    stock: StockService<S>,
) -> Router
where
    C: CategoryRepository + 'static,
    P: ProductRepository + 'static,
    S: StockRepository + 'static,
{
    Router::new()
        .nest("/categorias", categories::router(categories))
        .nest("/produtos", products::router(products))
        .nest("/estoques", stock::router(stock))
}

/// Log a successful mutation on the audit target
pub(crate) fn audit(headers: &HeaderMap, action: &str, resource: String, details: impl Serialize) {
    AuditEvent::new(action, Some(resource), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
        .with_details(details)
        .log();
}
