use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's tracked binding to a canonical repository.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repository_instances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub repository_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id",
        on_delete = "Cascade"
    )]
    Repository,
    #[sea_orm(has_many = "super::repository_tag::Entity")]
    RepositoryTags,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::repository_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepositoryTags.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::repository_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::repository_tag::Relation::RepositoryInstance.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
