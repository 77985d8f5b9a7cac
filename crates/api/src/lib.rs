//! HTTP API: routing, access control, and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
pub mod policy;
