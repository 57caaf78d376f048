//! Constants used throughout the application
//!
//! This module centralizes names, defaults and messages shared by the stores,
//! configuration and the command-line front end.

// Application identity
pub const APP_NAME: &str = "repolists";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOCAL_CONFIG_FILE_NAME: &str = "repolists.toml";
pub const DATABASE_FILE_NAME: &str = "repolists.db";

// Storage defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const MAX_CONNECTIONS_LIMIT: u32 = 64;
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;
pub const MAX_OPERATION_TIMEOUT_SECS: u64 = 3600;

// Catalog defaults
pub const DEFAULT_TAG_COLOR: &str = "#6b7280";
pub const DEFAULT_PROVIDER: &str = "github";

// In-memory log sink
pub const LOG_BUFFER_CAPACITY: usize = 500;

// Entity names used in not-found errors
pub const ENTITY_LIST: &str = "list";
pub const ENTITY_TAG: &str = "tag";
pub const ENTITY_REPOSITORY: &str = "repository instance";

// Messages
pub const CONFIG_GENERATED: &str = "Generated default configuration file";
pub const ERROR_NAME_REQUIRED: &str = "list name must not be empty";
pub const ERROR_TITLE_REQUIRED: &str = "tag title must not be empty";
pub const ERROR_FULL_NAME_REQUIRED: &str = "repository full name must not be empty";
