//! HTTP API: routing, request context and error mapping.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
