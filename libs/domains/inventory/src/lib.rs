//! Inventory Domain
//!
//! Categories, products and the stock movements that change product
//! quantities.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /categorias, /produtos, /estoques
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← Business rules, validation, stock arithmetic
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Traits + PostgreSQL and in-memory implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, MovementKind
//! └─────────────┘
//! ```
//!
//! # Stock rule
//!
//! An entry adds to the product quantity; an exit subtracts and is rejected
//! when it would leave the quantity negative. Deleting a movement applies
//! the reversed kind under the same rule. Quantity writes are
//! compare-and-swap, so two concurrent exits cannot both pass the check.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_inventory::{
//!     handlers,
//!     repository::InMemoryInventoryStore,
//!     service::{CategoryService, ProductService, StockService},
//! };
//!
//! let store = InMemoryInventoryStore::new();
//!
//! let router = handlers::router(
//!     CategoryService::new(store.clone()),
//!     ProductService::new(store.clone()),
//!     StockService::new(store),
//! );
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{InventoryError, InventoryResult};
pub use models::{
    Category, CategoryInput, CreateMovement, Movement, MovementFilter, MovementKind,
    MovementReceipt, Product, ProductFilter, ProductInput, StockDetail, StockSnapshot,
    next_quantity,
};
pub use postgres::{PgCategoryRepository, PgProductRepository, PgStockRepository};
pub use repository::{
    CategoryRepository, InMemoryInventoryStore, NameMatch, ProductRepository, QuantityChange,
    StockRepository,
};
pub use service::{CategoryService, ProductService, StockService};
