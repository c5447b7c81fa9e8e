//! Service-specific database queries
//!
//! Free functions over the shared pool, grouped by area. Row models live
//! in leafguard-common.

pub mod chat;
pub mod prediction;
pub mod sessions;
pub mod settings;
pub mod users;
