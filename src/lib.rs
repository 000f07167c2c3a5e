//! Client library for the election backend: typed API access plus the
//! state machines the interactive client is built from.
//!
//! The pieces layer cleanly: [`model`] holds the pure domain types and
//! classification rules, [`api`] talks to the backend over blocking HTTP,
//! and [`auth`]/[`voting`] drive the multi-step flows on top of both.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod voting;

pub use config::Config;
pub use error::{Error, Result};
