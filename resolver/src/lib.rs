//! Group chat resolver service

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Operations served by the resolver
pub mod operation;

/// HTTP routes
pub mod routes;

/// Server setup
pub mod server;

/// Storage clients shared across handlers
pub mod state;

/// Environment, errors and extractors
pub mod types;
