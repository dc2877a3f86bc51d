//! Key derivation: relative paths, separators and prefix joins

use std::{
    io,
    path::{self, Component, Path},
};

use serde::Deserialize;

use crate::error::{BundleError, Result};

/// Separator used between path segments inside a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Separator {
    /// The separator of the platform running the bundler
    #[default]
    Platform,
    /// Always `/`, so keys can double as URL paths
    Slash,
}

impl Separator {
    pub const fn as_char(self) -> char {
        match self {
            Self::Platform => path::MAIN_SEPARATOR,
            Self::Slash => '/',
        }
    }

    fn is_separator(self, c: char) -> bool {
        match self {
            Self::Platform => path::is_separator(c),
            Self::Slash => c == '/',
        }
    }
}

/// Compute the key for `path`, which must live under `root`.
///
/// Only normal components survive, joined with `separator`, so the key never
/// starts with a separator.
pub fn relative_key(root: &Path, path: &Path, separator: Separator) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        BundleError::io(
            path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path is not under {}", root.display()),
            ),
        )
    })?;

    let mut key = String::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        let segment = segment.to_str().ok_or_else(|| {
            BundleError::io(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            )
        })?;
        if !key.is_empty() {
            key.push(separator.as_char());
        }
        key.push_str(segment);
    }
    Ok(key)
}

/// Join `prefix` in front of `key` with path-join semantics.
///
/// The prefix is cleaned lexically: empty and `.` segments are dropped and `..`
/// removes the segment before it, or nothing at the start. Separators at the
/// seam are collapsed. The key itself is only stripped of leading separators,
/// so an empty prefix yields the key unchanged.
pub fn join(prefix: &str, key: &str, separator: Separator) -> String {
    let is_separator = |c| separator.is_separator(c);
    let prefix = clean(prefix, separator);
    let key = key.trim_start_matches(is_separator);

    if prefix.is_empty() {
        key.to_owned()
    } else if key.is_empty() {
        prefix.to_owned()
    } else {
        format!("{prefix}{}{key}", separator.as_char())
    }
}

fn clean(path: &str, separator: Separator) -> String {
    let mut segments = Vec::new();
    for segment in path.split(|c| separator.is_separator(c)) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments.join(&separator.as_char().to_string())
}
