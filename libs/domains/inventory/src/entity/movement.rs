use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::models::{Movement, MovementKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i32,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Movement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            kind: model.kind,
            quantity: model.quantity,
            occurred_at: model.occurred_at,
        }
    }
}

impl From<Movement> for ActiveModel {
    fn from(movement: Movement) -> Self {
        Self {
            id: Set(movement.id),
            product_id: Set(movement.product_id),
            kind: Set(movement.kind),
            quantity: Set(movement.quantity),
            occurred_at: Set(movement.occurred_at),
        }
    }
}
