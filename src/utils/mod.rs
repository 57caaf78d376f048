//! Utility helpers shared by the stores.
//!
//! - [`text`] - Title, name and description normalization plus id deduplication

pub mod text;
