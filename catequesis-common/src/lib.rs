//! # Catequesis Common Library
//!
//! Shared code for the catequesis binaries:
//! - Store configuration loading
//! - Document store over SQLite (collections, validation levels, unique indexes)
//! - Typed record models for the five collections
//! - Embedded-date normalizer used by the maintenance binary

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod records;
pub mod time;

pub use error::{Error, FieldErrors, Result};
