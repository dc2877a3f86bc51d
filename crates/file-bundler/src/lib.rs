//! Bundle a directory of static files into generated Rust source.
//!
//! [`bundle`] walks a directory, keeps the files whose relative path matches a
//! pattern, encodes their contents and shapes the keys. [`write_bundle`] turns
//! the result into a module with a sorted static table, ready to be
//! `include!`d from a build script's output.

pub mod bundle;
pub mod config;
pub mod encoder;
pub mod error;
pub mod key;
pub mod options;
pub mod reader;
pub mod remap;
pub mod serializer;
pub mod walker;

pub use bundle::Bundle;
pub use encoder::Encoding;
pub use error::{BundleError, Result};
pub use key::Separator;
pub use options::{BundleOptions, bundle};
pub use serializer::{OutputStyle, Target, render, write_bundle};
