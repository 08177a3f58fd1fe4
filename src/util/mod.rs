//! Utility types shared by the other modules.
//!
//! - [`Error`] / [`Result`] - Error handling

mod error;

pub use error::*;
