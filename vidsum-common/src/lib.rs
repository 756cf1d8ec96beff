//! # vidsum Common Library
//!
//! Shared code for the vidsum client and anything that speaks to the
//! video summary service:
//! - Error type
//! - Configuration loading and base URL resolution
//! - Wire types for the summary service endpoints

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
