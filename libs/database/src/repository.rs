//! Generic CRUD over SeaORM entities keyed by a single UUID column.
//!
//! Domain repositories embed a `BaseRepository<entity::Entity>` for the plain
//! single-row operations and drop down to `db()` for anything with joins,
//! filters or transactions.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait,
};
use std::marker::PhantomData;
use uuid::Uuid;

/// Entities whose primary key is a single UUID column.
pub trait UuidEntity: EntityTrait {}

impl<E> UuidEntity for E
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
}

pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: UuidEntity,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Connection for queries the helpers below don't cover
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E::Model>, DbErr> {
        E::find_by_id(id).one(&self.db).await
    }

    pub async fn insert(&self, model: E::ActiveModel) -> Result<E::Model, DbErr> {
        model.insert(&self.db).await
    }

    pub async fn update(&self, model: E::ActiveModel) -> Result<E::Model, DbErr> {
        model.update(&self.db).await
    }

    /// Returns the number of deleted rows (0 or 1)
    pub async fn delete_by_id(&self, id: Uuid) -> Result<u64, DbErr> {
        let result = E::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
