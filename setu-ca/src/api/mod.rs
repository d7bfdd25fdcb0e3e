//! HTTP API handlers for setu-ca

pub mod activity;
pub mod auth;
pub mod contracts;
pub mod health;
pub mod notifications;

pub use activity::activity_routes;
pub use auth::CurrentUser;
pub use contracts::contract_routes;
pub use health::health_routes;
pub use notifications::notification_routes;
