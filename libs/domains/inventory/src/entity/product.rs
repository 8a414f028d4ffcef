use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};

use crate::models::{Category, Product};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub quantity: i32,
    pub min_stock: i32,
    pub active: bool,
    pub registered_at: DateTimeUtc,
    pub category_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "super::movement::Entity")]
    Movement,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Domain product with its already loaded category
    pub fn into_product(self, category: Category) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            min_stock: self.min_stock,
            active: self.active,
            registered_at: self.registered_at,
            category,
        }
    }
}

impl From<Product> for ActiveModel {
    fn from(product: Product) -> Self {
        Self {
            id: Set(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            quantity: Set(product.quantity),
            min_stock: Set(product.min_stock),
            active: Set(product.active),
            registered_at: Set(product.registered_at),
            category_id: Set(product.category.id),
        }
    }
}

/// Active model touching only the fields a product update may change.
///
/// Quantity is owned by the stock movements and registration date is fixed.
pub fn editable_fields(product: &Product) -> ActiveModel {
    ActiveModel {
        id: Set(product.id),
        name: Set(product.name.clone()),
        description: Set(product.description.clone()),
        price: Set(product.price),
        quantity: NotSet,
        min_stock: Set(product.min_stock),
        active: NotSet,
        registered_at: NotSet,
        category_id: Set(product.category.id),
    }
}
