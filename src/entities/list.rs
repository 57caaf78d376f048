use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a rule's tag set is matched against a repository's tags.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchQuorum {
    /// At least one rule tag must be present.
    #[default]
    #[sea_orm(string_value = "ANY")]
    Any,
    /// Every rule tag must be present.
    #[sea_orm(string_value = "ALL")]
    All,
}

/// A named, user-owned rule set. The rule ids themselves live in the four
/// `list_*` join tables.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub include_match_quorum: MatchQuorum,
    pub exclude_match_quorum: MatchQuorum,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::list_include_tag::Entity")]
    IncludeTags,
    #[sea_orm(has_many = "super::list_exclude_tag::Entity")]
    ExcludeTags,
    #[sea_orm(has_many = "super::list_include_repository::Entity")]
    IncludeRepositories,
    #[sea_orm(has_many = "super::list_exclude_repository::Entity")]
    ExcludeRepositories,
}

impl Related<super::list_include_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncludeTags.def()
    }
}

impl Related<super::list_exclude_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExcludeTags.def()
    }
}

impl Related<super::list_include_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncludeRepositories.def()
    }
}

impl Related<super::list_exclude_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExcludeRepositories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
