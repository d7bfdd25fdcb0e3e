//! Database models and queries

pub mod activity;
pub mod init;
pub mod models;
pub mod notifications;
pub mod users;

pub use init::*;
pub use models::*;
