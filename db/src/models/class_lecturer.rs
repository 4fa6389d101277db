use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// Lecturer ↔ class assignment. A lecturer may start, end and inspect
/// sessions only for classes they are assigned to.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "class_lecturers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub lecturer_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LecturerId",
        to = "super::user::Column::Id"
    )]
    Lecturer,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assigns a lecturer to a class. Assigning twice is a no-op.
    pub async fn assign(
        db: &DatabaseConnection,
        class_id: i64,
        lecturer_id: i64,
    ) -> Result<Self, DbErr> {
        if let Some(existing) = Entity::find_by_id((class_id, lecturer_id)).one(db).await? {
            return Ok(existing);
        }

        ActiveModel {
            class_id: Set(class_id),
            lecturer_id: Set(lecturer_id),
        }
        .insert(db)
        .await
    }

    pub async fn is_assigned<C: ConnectionTrait>(
        db: &C,
        class_id: i64,
        lecturer_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((class_id, lecturer_id))
            .one(db)
            .await?
            .is_some())
    }
}
