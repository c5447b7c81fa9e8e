//! # Leafguard Common Library
//!
//! Shared code for the Leafguard backend:
//! - Database models and schema initialization
//! - Classifier catalog metadata (label tables, display names)
//! - Authentication primitives (password hashing, opaque tokens)
//! - Configuration loading
//! - Common error types

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
