//! Mock servers for client integration testing
//!
//! Simulates the property-management REST backend so request handling, auth
//! flows and session side effects can be tested without a real server.

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]

pub mod backend;

pub use backend::{MockBackend, RecordedRequest};
