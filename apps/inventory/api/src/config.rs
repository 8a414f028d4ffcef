use core_config::{AppInfo, FromEnv, app_info, env_parse_or, server::ServerConfig};

// Import database configs from the database library
use database::common::RetryConfig;
use database::postgres::PostgresConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    /// Backoff for the initial database connection
    pub retry: RetryConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // Required - will fail if not set
        let retry = RetryConfig::from_env()?;
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let run_migrations = env_parse_or("RUN_MIGRATIONS", "true")?;

        Ok(Self {
            app: app_info!(),
            database,
            retry,
            server,
            environment,
            run_migrations,
        })
    }
}
