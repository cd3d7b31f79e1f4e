//! Cartstorm Core - Shared types library.
//!
//! This crate provides the types shared by the Cartstorm components:
//! - `loadtest` - Load generation engine and user profiles
//! - `cli` - Command-line front end
//! - `integration-tests` - In-process mock of the shop API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! randomness. Both the load generator and the mock shop API depend on it, so
//! the wire format is defined exactly once.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, JSON payloads, endpoint paths and status allow-lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
