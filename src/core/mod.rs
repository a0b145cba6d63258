//! Core types shared by every stage of the pipeline
//!
//! At the moment this is the error system: [`SlnError`] enumerates every
//! failure the engine reports, [`ErrorContext`] wraps it with suggestions for
//! terminal display, and [`user_friendly_error`] converts any
//! [`anyhow::Error`] into that form.

pub mod error;

pub use error::{ErrorContext, SlnError, user_friendly_error};
