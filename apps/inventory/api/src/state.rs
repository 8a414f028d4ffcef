//! Application state management.
//!
//! Shared state passed to the readiness handler and used to build the
//! domain repositories.

/// Shared application state.
///
/// Cloning is cheap: the connection is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
}
