//! Handler tests for the inventory domain
//!
//! These tests drive `handlers::router` over the in-memory store and check:
//! - Request deserialization (wire names, enum labels)
//! - Status codes and `Location` headers
//! - Error bodies for business rule violations

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use domain_inventory::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    let store = InMemoryInventoryStore::new();
    handlers::router(
        CategoryService::new(store.clone()),
        ProductService::new(store.clone()),
        StockService::new(store),
    )
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    let request = match body {
        Some(body) => request.body(Body::from(serde_json::to_string(&body).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn create_category(app: &Router, name: &str) -> Category {
    let response = send(
        app,
        "POST",
        "/categorias",
        Some(json!({ "nome": name, "descricao": "Categoria de teste" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

async fn create_product(app: &Router, name: &str, price: f64, category: &str) -> Product {
    let response = send(
        app,
        "POST",
        "/produtos",
        Some(json!({
            "nome": name,
            "descricao": "Produto de teste",
            "preco": price,
            "estoqueMinimo": 5,
            "categoriaNome": category
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

async fn move_stock(app: &Router, product: &Product, kind: &str, quantity: i32) -> Response<Body> {
    send(
        app,
        "POST",
        "/estoques",
        Some(json!({
            "produtoId": product.id,
            "tipoMovimentacao": kind,
            "quantidade": quantity
        })),
    )
    .await
}

#[tokio::test]
async fn test_create_category_returns_201_with_location() {
    let app = app();

    let response = send(
        &app,
        "POST",
        "/categorias",
        Some(json!({ "nome": "Eletrônicos", "descricao": "Aparelhos" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();

    let category: Value = json_body(response.into_body()).await;
    assert_eq!(category["nome"], "Eletrônicos");
    assert_eq!(location, format!("/api/categorias/{}", category["id"].as_str().unwrap()));
}

#[tokio::test]
async fn test_duplicate_category_ignoring_case_returns_409() {
    let app = app();
    create_category(&app, "Eletrônicos").await;

    let response = send(&app, "POST", "/categorias", Some(json!({ "nome": "eletrônicos" }))).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Já existe esta categoria");
}

#[tokio::test]
async fn test_category_validation_returns_400() {
    let app = app();

    let response = send(&app, "POST", "/categorias", Some(json!({ "nome": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/categorias", Some(json!({ "descricao": "sem nome" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_categories_ordered_by_name() {
    let app = app();
    create_category(&app, "Livros").await;
    create_category(&app, "Eletrônicos").await;

    let response = send(&app, "GET", "/categorias", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let categories: Vec<Category> = json_body(response.into_body()).await;
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Eletrônicos", "Livros"]);
}

#[tokio::test]
async fn test_update_category_in_use_returns_409() {
    let app = app();
    let category = create_category(&app, "Eletrônicos").await;
    create_product(&app, "Teclado", 150.0, "Eletrônicos").await;

    let response = send(
        &app,
        "PUT",
        &format!("/categorias/{}", category.id),
        Some(json!({ "nome": "Eletro" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Existe um produto com essa categoria");
}

#[tokio::test]
async fn test_unknown_category_returns_400() {
    let app = app();

    let response = send(
        &app,
        "GET",
        &format!("/categorias/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Categoria não existe");
}

#[tokio::test]
async fn test_invalid_uuid_returns_400() {
    let app = app();

    let response = send(&app, "GET", "/produtos/not-a-uuid", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_UUID");
}

#[tokio::test]
async fn test_create_product_uses_wire_names() {
    let app = app();
    create_category(&app, "Eletrônicos").await;

    let response = send(
        &app,
        "POST",
        "/produtos",
        Some(json!({
            "nome": "Teclado",
            "preco": 150.5,
            "estoqueMinimo": 2,
            "categoriaNome": "ELETRÔNICOS"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(header::LOCATION));

    let product: Value = json_body(response.into_body()).await;
    assert_eq!(product["nome"], "Teclado");
    assert_eq!(product["preco"], 150.5);
    assert_eq!(product["quantidade"], 0);
    assert_eq!(product["ativo"], true);
    assert_eq!(product["categoria"]["nome"], "Eletrônicos");
}

#[tokio::test]
async fn test_create_product_with_unknown_category_returns_400() {
    let app = app();

    let response = send(
        &app,
        "POST",
        "/produtos",
        Some(json!({ "nome": "Teclado", "preco": 10, "categoriaNome": "Nada" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Categoria não existe");
}

#[tokio::test]
async fn test_create_product_with_negative_price_returns_400() {
    let app = app();
    create_category(&app, "Eletrônicos").await;

    let response = send(
        &app,
        "POST",
        "/produtos",
        Some(json!({ "nome": "Teclado", "preco": -1, "categoriaNome": "Eletrônicos" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_with_price_beyond_storage_returns_400() {
    let app = app();
    create_category(&app, "Eletrônicos").await;

    let response = send(
        &app,
        "POST",
        "/produtos",
        Some(json!({ "nome": "Iate", "preco": 10000000000u64, "categoriaNome": "Eletrônicos" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let listed: Vec<Product> = json_body(send(&app, "GET", "/produtos", None).await.into_body()).await;
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_malformed_query_returns_json_error() {
    let app = app();

    for uri in [
        "/produtos?minValor=abc",
        "/estoques/movimentacao?minQuantidade=muitos",
    ] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json",
            "{}",
            uri
        );

        let body: Value = json_body(response.into_body()).await;
        assert_eq!(body["error"], "BAD_REQUEST");
        assert_eq!(body["code"], 1012);
    }
}

#[tokio::test]
async fn test_list_products_price_range_is_strict() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    create_product(&app, "Cabo", 100.0, "Eletrônicos").await;
    create_product(&app, "Monitor", 300.0, "Eletrônicos").await;
    create_product(&app, "Notebook", 500.0, "Eletrônicos").await;

    let response = send(&app, "GET", "/produtos?minValor=100&maxValor=500", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let products: Vec<Product> = json_body(response.into_body()).await;
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Monitor"]);
}

#[tokio::test]
async fn test_list_products_by_category_name_ignores_case() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    create_category(&app, "Livros").await;
    create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    create_product(&app, "Romance", 40.0, "Livros").await;

    let response = send(&app, "GET", "/produtos?categoriaNome=livros", None).await;

    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Romance");
}

#[tokio::test]
async fn test_update_product_keeps_stock() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    create_category(&app, "Periféricos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    move_stock(&app, &product, "Entrada", 7).await;

    let response = send(
        &app,
        "PUT",
        &format!("/produtos/{}", product.id),
        Some(json!({
            "nome": "Teclado mecânico",
            "preco": 250,
            "estoqueMinimo": 1,
            "categoriaNome": "Periféricos"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Product = json_body(response.into_body()).await;
    assert_eq!(updated.id, product.id);
    assert_eq!(updated.name, "Teclado mecânico");
    assert_eq!(updated.quantity, 7);
    assert_eq!(updated.registered_at, product.registered_at);
    assert_eq!(updated.category.name, "Periféricos");
}

#[tokio::test]
async fn test_delete_product_with_movements_conflicts_but_soft_delete_succeeds() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    move_stock(&app, &product, "Entrada", 3).await;

    let response = send(&app, "DELETE", &format!("/produtos/{}", product.id), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(
        body["message"],
        "Não é possível excluir produto que possui movimentação"
    );

    let response = send(
        &app,
        "DELETE",
        &format!("/produtos/{}?soft=true", product.id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/produtos/{}", product.id), None).await;
    let fetched: Product = json_body(response.into_body()).await;
    assert!(!fetched.active);
    assert_eq!(fetched.quantity, 3);
}

#[tokio::test]
async fn test_hard_delete_product_without_movements() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;

    let response = send(&app, "DELETE", &format!("/produtos/{}", product.id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/produtos/{}", product.id), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(
        body["message"],
        format!("Produto com Id {} não encontrado", product.id)
    );
}

#[tokio::test]
async fn test_movement_round_trip_restores_quantity() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;

    let response = move_stock(&app, &product, "Entrada", 5).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    let receipt: MovementReceipt = json_body(response.into_body()).await;
    assert_eq!(receipt.stock.quantity, 5);
    assert_eq!(
        location,
        format!("/api/estoques/movimentacao/{}", receipt.movement_id)
    );

    let response = send(
        &app,
        "DELETE",
        &format!("/estoques/movimentacao/{}", receipt.movement_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: MovementReceipt = json_body(response.into_body()).await;
    assert_eq!(receipt.stock.quantity, 0);
}

#[tokio::test]
async fn test_exit_beyond_stock_returns_400() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    move_stock(&app, &product, "Entrada", 3).await;

    let response = move_stock(&app, &product, "Saida", 5).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Estoque 3 não contém a quantidade solicitada 5");
}

#[tokio::test]
async fn test_unknown_movement_kind_returns_400() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;

    let response = move_stock(&app, &product, "Transferencia", 1).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_quantity_movement_returns_400() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;

    let response = move_stock(&app, &product, "Entrada", 0).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Quantidade deve ser > 0");
}

#[tokio::test]
async fn test_low_stock_after_exit() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    move_stock(&app, &product, "Entrada", 10).await;

    let response = send(&app, "GET", "/estoques/minimo", None).await;
    let low: Vec<StockSnapshot> = json_body(response.into_body()).await;
    assert!(low.is_empty());

    move_stock(&app, &product, "Saida", 6).await;

    let response = send(&app, "GET", "/estoques/minimo", None).await;
    let low: Vec<StockSnapshot> = json_body(response.into_body()).await;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].product_id, product.id);
    assert_eq!(low[0].quantity, 4);
}

#[tokio::test]
async fn test_stock_detail_lists_movements() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let product = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    move_stock(&app, &product, "Entrada", 10).await;
    move_stock(&app, &product, "Saida", 4).await;

    let response = send(&app, "GET", &format!("/estoques/{}", product.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail: Value = json_body(response.into_body()).await;
    assert_eq!(detail["estoque"]["quantidade"], 6);
    assert_eq!(detail["movimentacoes"].as_array().unwrap().len(), 2);
    assert_eq!(detail["movimentacoes"][0]["tipoMovimentacao"], "Entrada");

    let response = send(&app, "GET", "/estoques", None).await;
    let stocks: Vec<StockSnapshot> = json_body(response.into_body()).await;
    assert_eq!(stocks.len(), 1);
}

#[tokio::test]
async fn test_list_movements_requires_filter() {
    let app = app();

    let response = send(&app, "GET", "/estoques/movimentacao", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Filtro não setado");
}

#[tokio::test]
async fn test_list_movements_by_product() {
    let app = app();
    create_category(&app, "Eletrônicos").await;
    let teclado = create_product(&app, "Teclado", 150.0, "Eletrônicos").await;
    let mouse = create_product(&app, "Mouse", 50.0, "Eletrônicos").await;
    move_stock(&app, &teclado, "Entrada", 2).await;
    move_stock(&app, &mouse, "Entrada", 2).await;

    let response = send(
        &app,
        "GET",
        &format!("/estoques/movimentacao?produtoId={}", mouse.id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let movements: Vec<Movement> = json_body(response.into_body()).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].product_id, mouse.id);

    let response = send(
        &app,
        "GET",
        &format!("/estoques/movimentacao/{}", movements[0].id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_movement_returns_400() {
    let app = app();

    let response = send(
        &app,
        "GET",
        &format!("/estoques/movimentacao/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Movimentação não encontrada");
}
