//! # Federation Registry Core
//!
//! Core types and error handling for the Federation Registry.
//!
//! This crate provides the foundational abstractions used by every other crate:
//! - Persisted node types (providers, projects, regions, services, ...)
//! - Shared enumerations (provider types, service types and names)
//! - Error types with their HTTP status mapping

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod node;
pub mod types;

pub use error::{Error, Result};
pub use node::*;
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::node::*;
    pub use crate::types::*;
}
