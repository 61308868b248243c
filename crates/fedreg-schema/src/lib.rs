//! # Federation Registry Schema
//!
//! Input types of the registry API:
//! - Nested creation trees (`*CreateExtended`)
//! - Partial attribute updates (`*Update`) and the [`MergePolicy`] used to apply them
//! - Validation performed before anything is written

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod create;
pub mod merge;
pub mod update;
pub mod validation;

pub use create::*;
pub use merge::{Merge, MergePolicy};
pub use update::*;
pub use validation::{find_duplicates, Validate};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::create::*;
    pub use crate::merge::{Merge, MergePolicy};
    pub use crate::update::*;
    pub use crate::validation::Validate;
}
