//! # Federation Registry
//!
//! Operations on the federation graph:
//! - Provider aggregate reconciliation (create, full replace, cascading delete)
//! - Shared entity reuse by natural key (identity providers, locations,
//!   flavors, images) with reference counting before delete
//! - Generic read / partial update / delete of every node kind
//!
//! ## Example
//!
//! ```rust
//! use fedreg_registry::Registry;
//!
//! #[tokio::main]
//! async fn main() -> fedreg_core::Result<()> {
//!     let registry = Registry::in_memory();
//!     let input = serde_json::from_value(serde_json::json!({
//!         "name": "cloud",
//!         "type": "openstack",
//!         "projects": [{"name": "tenant", "uuid": "1234"}],
//!     }))?;
//!     let provider = registry.create_provider(input).await?;
//!     assert_eq!(provider["projects"][0]["uuid"], "1234");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod checks;
mod flavor;
mod identity_provider;
mod image;
mod location;
mod network;
mod project;
mod provider;
mod quota;
mod read;
mod region;
mod scope;
mod service;
mod sla;
mod user_group;

pub mod query;
pub mod registry;
pub mod resource;

pub use query::ListParams;
pub use read::View;
pub use registry::Registry;
pub use resource::Resource;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::query::ListParams;
    pub use crate::read::View;
    pub use crate::registry::Registry;
    pub use crate::resource::Resource;
}
