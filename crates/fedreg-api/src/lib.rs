//! # Federation Registry API
//!
//! REST interface over the registry built on axum:
//! - `/providers` with nested create (POST) and full replace (PUT)
//! - Generic list / read / partial update / delete for every node kind
//! - Bearer JWT authentication (HS256), public vs private projections
//! - `/status` with store counters
//!
//! ## Example
//!
//! ```rust,no_run
//! use fedreg_api::{serve, ShutdownSignal};
//! use fedreg_config::Config;
//! use fedreg_registry::Registry;
//!
//! #[tokio::main]
//! async fn main() -> fedreg_core::Result<()> {
//!     let config = Config::default();
//!     serve(&config, Registry::in_memory(), ShutdownSignal::new()).await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod state;

pub use auth::{Admin, Authenticator, Caller, Claims};
pub use error::ApiError;
pub use router::{api_routes, build_router};
pub use server::serve;
pub use shutdown::{listen_for_signals, ShutdownSignal};
pub use state::AppState;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::router::build_router;
    pub use crate::server::serve;
    pub use crate::shutdown::ShutdownSignal;
    pub use crate::state::AppState;
}
