//! REST API handlers

pub mod auth;
pub mod chat;
pub mod prediction;
