//! Axum handlers, grouped by who may call them.

pub mod admin;
pub mod public;
pub mod session;
