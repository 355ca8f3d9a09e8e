//! Error types for the table, the sizer and the credential layer.
//!
//! Absent keys and empty tables are not errors; those are reported through
//! `bool`/`Option` returns. Everything here aborts the enclosing operation.

use thiserror::Error;

/// The prime sizer was asked for a capacity outside its supported domain.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingError {
    #[error("capacity request {requested} exceeds the maximum supported bound {max}")]
    TooLarge { requested: usize, max: usize },

    #[error("capacity request {requested} is too small; at least 2 buckets are required")]
    TooSmall { requested: usize },
}

/// File load or write failed.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The one-way credential transform could not produce output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("encryption rejected input: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("table error: {0}")]
    Table(#[from] TableError),

    #[error("sizing error: {0}")]
    Sizing(#[from] SizingError),

    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
