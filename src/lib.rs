//! repolists - Tag-driven smart lists over tracked repositories
//!
//! Users track repositories, label them with tags and define lists whose
//! members are computed from include/exclude rules. This library provides
//! the transactional rule store and the membership resolver behind it.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`catalog`] - Service exposing every tag, repository, list and membership operation
//! * [`resolver`] - Pure membership evaluation
//! * [`storage`] - Database connection and schema bootstrap
//! * [`config`] - Application configuration management
//! * [`logger`] - Logging setup and in-memory log buffer

/// Tag, repository, list and membership operations
pub mod catalog;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Error types returned by store operations
pub mod error;

/// Logging setup and in-memory log buffer
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Membership evaluation over a user's tag graph
pub mod resolver;

/// Database connection and schema management
pub mod storage;

/// Text and id normalization helpers
pub mod utils;

pub use catalog::CatalogService;
pub use entities::{list, repository, repository_instance, tag, MatchQuorum};
pub use error::{StoreError, StoreResult, ValidationError};
pub use resolver::{Decision, RuleSet};
