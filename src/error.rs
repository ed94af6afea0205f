//! Error types for s3stat
//!
//! This module defines the error types used throughout the s3stat library.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Most failures do not propagate up the call chain: session errors are
//! scoped to one account, region-lookup and listing errors are attached to
//! their `Bucket`, and per-object metadata failures become `ErrObject`
//! records. Only invalid CLI input aborts before any work starts.

use thiserror::Error;

/// Main error type for s3stat operations
#[derive(Error, Debug)]
pub enum S3statError {
    /// Session/credential acquisition failed for one account
    #[error("failed to create session for account {account}: {message}")]
    Session {
        /// The account (profile) that failed
        account: String,
        /// The underlying error message
        message: String,
    },

    /// A storage-service call (list, location, head) failed
    #[error("storage service error: {0}")]
    Storage(String),

    /// A pricing-service query failed
    #[error("pricing service error: {0}")]
    Pricing(String),

    /// The pricing catalog returned no price row for a filter set
    #[error("no price found for usage type {0}")]
    PriceUnavailable(String),

    /// Region with no short code in the pricing table
    #[error("unsupported region: {0}")]
    UnsupportedRegion(String),

    /// Storage class with no pricing metadata
    #[error("unsupported storage class: {0}")]
    UnsupportedStorageClass(String),

    /// JSON parsing error (price-list documents)
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in s3stat
pub type Result<T> = std::result::Result<T, S3statError>;
