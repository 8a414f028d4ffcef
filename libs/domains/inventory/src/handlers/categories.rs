use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestStateResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse,
    },
};
use serde_json::json;
use std::sync::Arc;

use super::{CATEGORY_TAG, audit};
use crate::error::InventoryResult;
use crate::models::{Category, CategoryInput};
use crate::repository::CategoryRepository;
use crate::service::CategoryService;

pub fn router<R: CategoryRepository + 'static>(service: CategoryService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", get(get_category).put(update_category))
        .with_state(shared_service)
}

/// List all categories ordered by name
#[utoipa::path(
    get,
    path = "/categorias",
    tag = CATEGORY_TAG,
    responses(
        (status = 200, description = "List of categories", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> InventoryResult<Json<Vec<Category>>> {
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/categorias",
    tag = CATEGORY_TAG,
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = Category,
            headers(("Location" = String, description = "URL of the new category"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> InventoryResult<impl IntoResponse> {
    let category = service.create_category(input).await?;

    audit(
        &headers,
        "category.create",
        format!("category:{}", category.id),
        json!({ "nome": category.name }),
    );

    let location = format!("/api/categorias/{}", category.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(category),
    ))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/categorias/{id}",
    tag = CATEGORY_TAG,
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> InventoryResult<Json<Category>> {
    let category = service.get_category(id).await?;
    Ok(Json(category))
}

/// Update a category that no product uses yet
#[utoipa::path(
    put,
    path = "/categorias/{id}",
    tag = CATEGORY_TAG,
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> InventoryResult<Json<Category>> {
    let category = service.update_category(id, input).await?;

    audit(
        &headers,
        "category.update",
        format!("category:{}", id),
        json!({ "nome": category.name }),
    );

    Ok(Json(category))
}
