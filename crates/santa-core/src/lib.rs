//! Core types and trait definitions for the Secret Santa exchange.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The assignment engine in [`draw`] is pure; persistence goes through the
//! [`store::ExchangeStore`] trait and orchestration through
//! [`exchange::Exchange`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod draw;
pub mod error;
pub mod exchange;
pub mod game;
pub mod participant;
pub mod session;
pub mod store;

pub use error::{Error, Result};
