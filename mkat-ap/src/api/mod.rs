//! HTTP API handlers for mkat-ap

pub mod auth;
pub mod autopilot;
pub mod health;

pub use auth::auth_middleware;
pub use autopilot::autopilot_routes;
pub use health::health_routes;
