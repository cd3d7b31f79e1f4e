//! Core types for Cartstorm.
//!
//! This module provides type-safe wrappers for the shop API's domain concepts.

pub mod endpoint;
pub mod id;
pub mod payload;
pub mod status;

pub use id::*;
pub use payload::*;
pub use status::StatusAllowList;
