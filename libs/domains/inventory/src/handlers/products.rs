use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    QueryParams, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestStateResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse,
    },
};
use serde_json::json;
use std::sync::Arc;

use super::{PRODUCT_TAG, audit};
use crate::error::InventoryResult;
use crate::models::{DeleteProductParams, Product, ProductFilter, ProductInput};
use crate::repository::ProductRepository;
use crate::service::ProductService;

pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(shared_service)
}

/// List products matching every given filter, ordered by name
#[utoipa::path(
    get,
    path = "/produtos",
    tag = PRODUCT_TAG,
    params(ProductFilter),
    responses(
        (status = 200, description = "List of products", body = Vec<Product>),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> InventoryResult<Json<Vec<Product>>> {
    let products = service.list_products(filter).await?;
    Ok(Json(products))
}

/// Create a new product with empty stock
#[utoipa::path(
    post,
    path = "/produtos",
    tag = PRODUCT_TAG,
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = Product,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> InventoryResult<impl IntoResponse> {
    let product = service.create_product(input).await?;

    audit(
        &headers,
        "product.create",
        format!("product:{}", product.id),
        json!({
            "nome": product.name,
            "preco": product.price,
            "categoria": product.category.name,
        }),
    );

    let location = format!("/api/produtos/{}", product.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/produtos/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
) -> InventoryResult<Json<Product>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Update the editable fields of a product
#[utoipa::path(
    put,
    path = "/produtos/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> InventoryResult<Json<Product>> {
    let product = service.update_product(id, input).await?;

    audit(
        &headers,
        "product.update",
        format!("product:{}", id),
        json!({ "nome": product.name, "categoria": product.category.name }),
    );

    Ok(Json(product))
}

/// Delete a product, or only deactivate it with `soft=true`
#[utoipa::path(
    delete,
    path = "/produtos/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        DeleteProductParams
    ),
    responses(
        (status = 204, description = "Product deleted or deactivated"),
        (status = 400, response = BadRequestStateResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    QueryParams(params): QueryParams<DeleteProductParams>,
) -> InventoryResult<StatusCode> {
    let action = if params.soft {
        service.deactivate_product(id).await?;
        "product.deactivate"
    } else {
        service.delete_product(id).await?;
        "product.delete"
    };

    audit(&headers, action, format!("product:{}", id), json!({ "soft": params.soft }));

    Ok(StatusCode::NO_CONTENT)
}
