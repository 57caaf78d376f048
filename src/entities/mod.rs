pub mod list;
pub mod list_exclude_repository;
pub mod list_exclude_tag;
pub mod list_include_repository;
pub mod list_include_tag;
pub mod repository;
pub mod repository_instance;
pub mod repository_tag;
pub mod tag;

pub use list::Entity as List;
pub use list::MatchQuorum;
pub use repository::Entity as Repository;
pub use repository_instance::Entity as RepositoryInstance;
pub use repository_tag::Entity as RepositoryTag;
pub use tag::Entity as Tag;
