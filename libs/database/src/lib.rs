//! Database connectivity for the inventory service.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL through SeaORM: connection pool, retry,
//!   health check, migration runner and a generic [`BaseRepository`]
//! - `config` - `core_config::FromEnv` impls for [`postgres::PostgresConfig`]
//!   and [`common::RetryConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "inventory_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod repository;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use repository::{BaseRepository, UuidEntity};
