//! Shared building blocks for the database probe service.
//!
//! - `config`: environment-sourced settings
//! - `errors`: the crate-wide error type
//! - `models`: backend kinds and connection targets
//! - `middleware`: request id propagation

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
