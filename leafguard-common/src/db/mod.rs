//! Database access layer
//!
//! Schema initialization and shared row models. Query functions that are
//! specific to the HTTP service live in the server crate.

pub mod init;
pub mod models;

pub use init::init_database;
