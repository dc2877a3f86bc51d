//! Error taxonomy for the bundling engine
//!
//! Configuration problems (bad pattern, bad identifiers) are detected before any
//! filesystem access. Filesystem and serialization failures abort the current
//! invocation immediately; nothing here is retried.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = BundleError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BundleError {
    /// The inclusion pattern is not a valid regular expression
    #[error("invalid matcher pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A generated module or table name is not a usable Rust identifier
    #[error("invalid {kind} identifier {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// The root to bundle exists but is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Reading a single file or resolving a path failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Two entries ended up with the same key after remapping or prefixing
    #[error("key collision: {key:?} is produced by more than one entry")]
    KeyCollision { key: String },

    /// A value cannot be represented as text in the requested output style
    #[error("value for key {key:?} is not valid UTF-8")]
    NonUtf8Value { key: String },

    /// A key cannot be expressed as a `config` crate path
    #[error("key {key:?} cannot be bound as a config default: {reason}")]
    UnbindableKey { key: String, reason: &'static str },

    /// Gzip compression of a file failed
    #[error("failed to compress data: {0}")]
    Compress(#[source] io::Error),

    /// An encoded value could not be decoded back into file bytes
    #[error("failed to decode value: {0}")]
    Decode(String),

    /// Writing generated output failed
    #[error("failed to write generated output: {0}")]
    Write(#[source] io::Error),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error comes from invalid invocation parameters alone.
    ///
    /// These are detected before touching the filesystem. Errors about the
    /// bundle's contents, such as [`BundleError::NonUtf8Value`], are not
    /// included.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Pattern(_) | Self::InvalidIdentifier { .. })
    }
}
