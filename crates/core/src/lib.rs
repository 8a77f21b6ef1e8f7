//! Karthik Store Core - Shared types library.
//!
//! This crate provides the domain types used across all Karthik Store components:
//! - `client` - Cart engine and the server-with-local-fallback sync managers
//! - `api` - REST API server for products, users, admins and demo requests
//! - `cli` - Command-line tools for migrations, seeding and driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Keys, products, carts, sessions, profiles, demo requests and money
//! - [`password`] - Argon2 hashing with legacy plain-text detection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod password;
pub mod types;

pub use types::*;
