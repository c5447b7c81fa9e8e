//! # Leafguard Server Library
//!
//! HTTP/websocket backend for the Leafguard plant-disease-identification
//! application.
//!
//! **Purpose:** Serve user registration/login, the community chat rooms
//! (REST history + realtime websocket fan-out), and the image-based
//! disease-prediction workflow backed by a pre-trained ONNX classifier.

pub mod api;
pub mod catalog_info;
pub mod db;
pub mod error;
pub mod fanout;
pub mod ml;
pub mod server;
pub mod storage;
pub mod ws;

pub use error::{Error, Result};
pub use server::AppContext;
