//! HTTP API for the rostersync service.
//!
//! - [`server`] - axum routes and server startup
//! - [`types`] - wire types (camelCase JSON)
//! - [`logs`] - real-time log streaming via SSE

pub mod logs;
pub mod server;
pub mod types;
