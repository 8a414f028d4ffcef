use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    QueryParams, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestStateResponse, ConflictResponse, InternalServerErrorResponse,
    },
};
use serde_json::json;
use std::sync::Arc;

use super::{STOCK_TAG, audit};
use crate::error::InventoryResult;
use crate::models::{
    CreateMovement, Movement, MovementFilter, MovementReceipt, StockDetail, StockSnapshot,
};
use crate::repository::StockRepository;
use crate::service::StockService;

pub fn router<R: StockRepository + 'static>(service: StockService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_stocks).post(create_movement))
        .route("/minimo", get(low_stock))
        .route("/movimentacao", get(list_movements))
        .route("/movimentacao/{id}", get(get_movement).delete(delete_movement))
        .route("/{id}", get(get_stock))
        .with_state(shared_service)
}

/// Record a stock entry or exit
#[utoipa::path(
    post,
    path = "/estoques",
    tag = STOCK_TAG,
    request_body = CreateMovement,
    responses(
        (status = 201, description = "Movement recorded", body = MovementReceipt,
            headers(("Location" = String, description = "URL of the new movement"))),
        (status = 400, response = BadRequestStateResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn create_movement<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateMovement>,
) -> InventoryResult<impl IntoResponse> {
    let kind = input.kind;
    let quantity = input.quantity;
    let receipt = service.create_movement(input).await?;

    audit(
        &headers,
        "stock.movement.create",
        format!("movement:{}", receipt.movement_id),
        json!({
            "produtoId": receipt.stock.product_id,
            "tipoMovimentacao": kind,
            "quantidade": quantity,
            "estoque": receipt.stock.quantity,
        }),
    );

    let location = format!("/api/estoques/movimentacao/{}", receipt.movement_id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(receipt)))
}

/// Stock snapshot of every product
#[utoipa::path(
    get,
    path = "/estoques",
    tag = STOCK_TAG,
    responses(
        (status = 200, description = "Stock of every product", body = Vec<StockSnapshot>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn list_stocks<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
) -> InventoryResult<Json<Vec<StockSnapshot>>> {
    let stocks = service.list_stocks().await?;
    Ok(Json(stocks))
}

/// Products whose quantity is below their minimum stock
#[utoipa::path(
    get,
    path = "/estoques/minimo",
    tag = STOCK_TAG,
    responses(
        (status = 200, description = "Products below minimum stock", body = Vec<StockSnapshot>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn low_stock<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
) -> InventoryResult<Json<Vec<StockSnapshot>>> {
    let stocks = service.low_stock().await?;
    Ok(Json(stocks))
}

/// Stock of one product with its movements
#[utoipa::path(
    get,
    path = "/estoques/{id}",
    tag = STOCK_TAG,
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Stock and movements of the product", body = StockDetail),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn get_stock<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
    UuidPath(product_id): UuidPath,
) -> InventoryResult<Json<StockDetail>> {
    let detail = service.get_stock(product_id).await?;
    Ok(Json(detail))
}

/// List movements; the query string must carry at least one parameter
#[utoipa::path(
    get,
    path = "/estoques/movimentacao",
    tag = STOCK_TAG,
    params(MovementFilter),
    responses(
        (status = 200, description = "Movements ordered by product name", body = Vec<Movement>),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn list_movements<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
    uri: Uri,
    QueryParams(filter): QueryParams<MovementFilter>,
) -> InventoryResult<Json<Vec<Movement>>> {
    let filter = uri.query().filter(|q| !q.is_empty()).map(|_| filter);
    let movements = service.list_movements(filter).await?;
    Ok(Json(movements))
}

/// Get a movement by ID
#[utoipa::path(
    get,
    path = "/estoques/movimentacao/{id}",
    tag = STOCK_TAG,
    params(
        ("id" = Uuid, Path, description = "Movement ID")
    ),
    responses(
        (status = 200, description = "Movement found", body = Movement),
        (status = 400, response = BadRequestStateResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn get_movement<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
    UuidPath(id): UuidPath,
) -> InventoryResult<Json<Movement>> {
    let movement = service.get_movement(id).await?;
    Ok(Json(movement))
}

/// Delete a movement and undo its effect on the stock
#[utoipa::path(
    delete,
    path = "/estoques/movimentacao/{id}",
    tag = STOCK_TAG,
    params(
        ("id" = Uuid, Path, description = "Movement ID")
    ),
    responses(
        (status = 200, description = "Movement deleted", body = MovementReceipt),
        (status = 400, response = BadRequestStateResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
pub(crate) async fn delete_movement<R: StockRepository>(
    State(service): State<Arc<StockService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> InventoryResult<Json<MovementReceipt>> {
    let receipt = service.delete_movement(id).await?;

    audit(
        &headers,
        "stock.movement.delete",
        format!("movement:{}", id),
        json!({
            "produtoId": receipt.stock.product_id,
            "estoque": receipt.stock.quantity,
        }),
    );

    Ok(Json(receipt))
}
