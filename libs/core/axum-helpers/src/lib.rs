//! # Axum Helpers
//!
//! Shared HTTP plumbing for the inventory service.
//!
//! - **[`server`]**: router assembly with OpenAPI UIs, `/health`, graceful shutdown
//! - **[`http`]**: CORS allow-list and security headers
//! - **[`errors`]**: [`AppError`] and the uniform [`ErrorResponse`] body
//! - **[`extractors`]**: [`QueryParams`], [`UuidPath`] and [`ValidatedJson`]
//! - **[`audit`]**: audit events for mutations

pub mod audit;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    create_router_with_origins, health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, parse_allowed_origins, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{QueryParams, UuidPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
