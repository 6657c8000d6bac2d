//! Storage for the group chat backend
//!
//! Users, groups, memberships, messages and typing indicators live in one
//! `DynamoDB` table. This crate owns the key layout of that table, the typed
//! records stored in it, the atomic user registration and the fixed set of
//! access patterns served from its two secondary indexes.

#![warn(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Table configuration
pub mod config;

/// Storage records and their API projections
pub mod entity;

/// Group and membership writes
pub mod groups;

/// Key codec
pub mod keys;

/// Message and typing indicator writes
pub mod messages;

/// Read-side access patterns
pub mod queries;

/// Transactional user registration
pub mod registration;

/// Single-table store and its backends
pub mod store;
