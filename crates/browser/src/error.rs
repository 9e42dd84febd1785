//! Driver-level errors
//!
//! Wire failures stay `CDPError`; this wraps them with what the driver was
//! trying to do.

use std::time::Duration;
use thiserror::Error;

use crate::cdp::CDPError;

pub type Result<T> = std::result::Result<T, PageError>;

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Cdp(#[from] CDPError),

    #[error("Invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page did not finish loading within {0:?}")]
    LoadTimeout(Duration),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
