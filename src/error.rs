//! Error types shared by every part of the crate
//!
//! Errors are split the same way the file format is used:
//! - [SerafinError::Validation] for malformed or inconsistent files, raised
//! while the header is parsed so that no frame is ever read from a bad file
//! - [SerafinError::Request] for invalid calls on an otherwise valid stream,
//! such as an unknown variable id or reading before the header
//! - [SerafinError::OutputExists] when a writer would clobber an existing file

// standard library
use std::path::PathBuf;

/// Errors raised by the Serafin readers, writers and flux tools
#[derive(Debug, thiserror::Error)]
pub enum SerafinError {
    /// The file content is malformed or inconsistent
    #[error("validation error: {0}")]
    Validation(String),

    /// A request could not be served by the current stream
    #[error("request error: {0}")]
    Request(String),

    /// The output path already exists and will not be overwritten
    #[error("file {} already exists (remove the file or change the output path)", .0.display())]
    OutputExists(PathBuf),

    /// A polyline can not be used as a cross-section
    #[error("invalid section: {0}")]
    Section(String),

    /// Fixed-layout record could not be encoded or decoded
    #[error("record codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// An I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerafinError {
    /// True for errors raised while checking file consistency
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for errors raised by invalid calls on a stream
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

pub type Result<T> = std::result::Result<T, SerafinError>;
