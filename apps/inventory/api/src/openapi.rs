use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Categories, products and stock movements"
    ),
    servers(
        (url = "/api", description = "API base path")
    )
)]
struct ServiceDoc;

/// Service document with the inventory paths merged in.
///
/// The domain already documents full paths (`/categorias/{id}`), so they are
/// merged as-is rather than nested under a prefix.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = ServiceDoc::openapi();
        doc.merge(domain_inventory::handlers::ApiDoc::openapi());
        doc
    }
}
