//! Core types shared across srcgen.
//!
//! - [`error`] - The [`SrcgenError`] taxonomy and user-facing [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, SrcgenError, user_friendly_error};
