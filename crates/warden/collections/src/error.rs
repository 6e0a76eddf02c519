//! Error types for collection helpers

use thiserror::Error;
use warden_core::AuthorizationError;

/// Collection errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectionError {
    /// Pages are numbered from 1
    #[error("page numbers start at 1")]
    InvalidPage,

    /// A page must hold at least one item
    #[error("per_page must be greater than zero")]
    InvalidPerPage,

    /// The underlying check failed
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, CollectionError>;
