//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
