//! Local storage module for repolists data persistence
//!
//! This module owns the SeaORM connection and the schema for:
//! - Tags
//! - Repositories and repository instances
//! - Tag-repository associations
//! - Lists and their four rule relations

pub mod db;

pub use db::LocalStorage;
