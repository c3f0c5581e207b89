//! # Taskboard Shared Library
//!
//! Domain types, persistence and business logic for the Taskboard API.
//!
//! ## Module Organization
//!
//! - `models`: Users, boards, lists, tasks and their resolved views
//! - `store`: The `BoardStore` persistence port with in-memory and PostgreSQL adapters
//! - `db`: PostgreSQL pool and embedded migrations
//! - `auth`: Tokens, password hashing, identity middleware and ownership checks
//! - `relocation`: Ordered-sequence arithmetic for moving tasks
//! - `service`: The operations served by the query endpoint

pub mod auth;
pub mod db;
pub mod models;
pub mod relocation;
pub mod service;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
