//! # Setu Common Library
//!
//! Shared code for all Setu services including:
//! - Database initialization and shared models (users, notifications, activity log)
//! - Configuration loading and root folder resolution
//! - Bearer token identity helpers
//! - Error types

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod time;

pub use error::{Error, Result};
