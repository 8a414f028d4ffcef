//! SeaORM entities for the inventory tables.
//!
//! `categories` 1-n `products` 1-n `stock_movements`.

pub mod category;
pub mod movement;
pub mod product;
