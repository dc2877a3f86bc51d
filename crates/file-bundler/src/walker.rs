//! Directory traversal and inclusion filtering

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::{
    bundle::Bundle,
    encoder::Encoding,
    error::{BundleError, Result},
    key::{Separator, relative_key},
    reader::read_file,
};

/// Compile an inclusion pattern. The empty pattern matches every path.
pub fn compile_matcher(pattern: &str) -> Result<Regex> {
    let pattern = if pattern.is_empty() { ".*" } else { pattern };
    Ok(Regex::new(pattern)?)
}

/// Walks one root directory and collects every matching file into a [`Bundle`].
///
/// The matcher is searched (not anchored) in the key derived from the path
/// relative to the root, never in the absolute path.
#[derive(Debug)]
pub struct TreeWalker<'a> {
    root: PathBuf,
    matcher: &'a Regex,
    encoding: Encoding,
    separator: Separator,
}

impl<'a> TreeWalker<'a> {
    pub fn new(
        root: &Path,
        matcher: &'a Regex,
        encoding: Encoding,
        separator: Separator,
    ) -> Result<Self> {
        let root = std::path::absolute(root).map_err(|e| BundleError::io(root, e))?;
        Ok(Self {
            root,
            matcher,
            encoding,
            separator,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Traverse the tree, failing on the first filesystem error
    pub fn walk(&self) -> Result<Bundle> {
        let metadata = fs::metadata(&self.root).map_err(|e| BundleError::io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(BundleError::NotADirectory(self.root.clone()));
        }

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .try_fold(Bundle::new(), |bundle, entry| self.visit(bundle, &entry?))
    }

    fn visit(&self, mut bundle: Bundle, entry: &DirEntry) -> Result<Bundle> {
        let path = entry.path();
        if !is_bundleable(entry)? {
            return Ok(bundle);
        }

        let key = relative_key(&self.root, path, self.separator)?;
        if !self.matcher.is_match(&key) {
            debug!("Skipping {key}: does not match {}", self.matcher.as_str());
            return Ok(bundle);
        }

        let raw = read_file(path)?;
        let raw_len = raw.len();
        let value = self.encoding.encode(raw)?;
        debug!("Bundled {key} ({raw_len} bytes -> {} bytes)", value.len());
        bundle.insert(key, value);
        Ok(bundle)
    }
}

/// Regular files and symlinks to regular files are bundled. Directories are
/// only traversed, everything else is skipped.
fn is_bundleable(entry: &DirEntry) -> Result<bool> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Ok(true);
    }
    if file_type.is_dir() {
        return Ok(false);
    }
    if file_type.is_symlink() {
        return match fs::metadata(entry.path()) {
            Ok(target) if target.is_file() => Ok(true),
            Ok(_) => {
                debug!("Skipping {}: symlink to a non-file", entry.path().display());
                Ok(false)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Skipping dangling symlink {}", entry.path().display());
                Ok(false)
            }
            Err(e) => Err(BundleError::io(entry.path(), e)),
        };
    }
    debug!("Skipping special file {}", entry.path().display());
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const PLAIN: Encoding = Encoding {
        compress: false,
        plain_text: true,
    };

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("bacon.json"), "{\"meat\": true}\n").unwrap();
        fs::write(root.join("usage.txt"), "usage: bacon\n").unwrap();
        fs::create_dir_all(root.join("nested").join("deeper")).unwrap();
        fs::write(root.join("nested").join("a.json"), "[]").unwrap();
        fs::write(root.join("nested").join("deeper").join("b.txt"), "b").unwrap();
        temp_dir
    }

    fn walk(root: &Path, pattern: &str) -> Result<Bundle> {
        let matcher = compile_matcher(pattern)?;
        TreeWalker::new(root, &matcher, PLAIN, Separator::Slash)?.walk()
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let temp_dir = fixture();
        let bundle = walk(temp_dir.path(), "").unwrap();

        let keys: Vec<&str> = bundle.keys().collect();
        assert_eq!(
            keys,
            vec!["bacon.json", "nested/a.json", "nested/deeper/b.txt", "usage.txt"]
        );
    }

    #[test]
    fn test_pattern_is_matched_against_relative_path() {
        let temp_dir = fixture();

        let bundle = walk(temp_dir.path(), r"^nested/").unwrap();
        let keys: Vec<&str> = bundle.keys().collect();
        assert_eq!(keys, vec!["nested/a.json", "nested/deeper/b.txt"]);

        // The temp directory name is part of the absolute path only
        let dir_name = temp_dir.path().file_name().unwrap().to_str().unwrap();
        let bundle = walk(temp_dir.path(), &regex::escape(dir_name)).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_unanchored_pattern_search() {
        let temp_dir = fixture();
        let bundle = walk(temp_dir.path(), "json").unwrap();
        let keys: Vec<&str> = bundle.keys().collect();
        assert_eq!(keys, vec!["bacon.json", "nested/a.json"]);
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        let err = compile_matcher("(unclosed").unwrap_err();
        assert!(matches!(err, BundleError::Pattern(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = walk(&temp_dir.path().join("nope"), "").unwrap_err();
        assert!(matches!(err, BundleError::Io { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp_dir = fixture();
        let err = walk(&temp_dir.path().join("usage.txt"), "").unwrap_err();
        assert!(matches!(err, BundleError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_to_files_are_bundled() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        std::os::unix::fs::symlink(root.join("usage.txt"), root.join("alias.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("nested"), root.join("loop")).unwrap();

        std::os::unix::fs::symlink(root.join("gone.txt"), root.join("dangling.txt")).unwrap();

        let bundle = walk(root, "").unwrap();
        assert_eq!(bundle.get_str("alias.txt"), Some("usage: bacon\n"));
        assert!(!bundle.keys().any(|key| key.starts_with("loop")));
        assert!(!bundle.contains_key("dangling.txt"));
    }
}
