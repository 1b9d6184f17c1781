//! Estate Client
//!
//! Client library for the property-management backend used by the
//! property manager, owner, developer and guest dashboards.
//!
//! This library provides:
//! - A request helper that normalizes auth, timeouts, envelopes and errors
//! - Role-based signin with optional OTP, signup and logout
//! - A persisted session (`auth_token`, `user_role`, `remember_me`)
//! - Typed records for leads, projects, properties and developers
//! - An event bus carrying notifications and navigation requests to the UI

pub mod api;
pub mod auth;
pub mod bus;
pub mod config;
pub mod models;
pub mod resources;
pub mod routes;
pub mod session;
