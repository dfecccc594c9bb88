//! Data models for the link directory.
//!
//! Field names match the persisted JSON documents exactly.

mod outcome;
mod site_index;
mod submission;

pub use outcome::*;
pub use site_index::*;
pub use submission::*;
