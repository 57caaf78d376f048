use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user-scoped label. `title` is stored trimmed and lowercased and is
/// unique per user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub color: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::repository_tag::Entity")]
    RepositoryTags,
}

impl Related<super::repository_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RepositoryTags.def()
    }
}

impl Related<super::repository_instance::Entity> for Entity {
    fn to() -> RelationDef {
        super::repository_tag::Relation::RepositoryInstance.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::repository_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
