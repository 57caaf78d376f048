//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods. Every method is generic over `ConnectionTrait`
//! so it runs equally on the pool or inside a transaction.

pub mod association;
pub mod list;
pub mod repository;
pub mod tag;

pub use association::AssociationRepository;
pub use list::{ListRepository, RuleRelation};
pub use repository::{RepositoryInstanceRepository, RepositoryRepository};
pub use tag::TagRepository;
