//! # Taskboard API Server Library
//!
//! HTTP surface of Taskboard: configuration, the router and the query
//! endpoint that serves every board operation.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
