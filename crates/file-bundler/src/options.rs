use std::{collections::BTreeMap, path::PathBuf};

use log::info;

use crate::{
    bundle::Bundle,
    encoder::Encoding,
    error::Result,
    key::Separator,
    remap::{prefix, remap},
    walker::{TreeWalker, compile_matcher},
};

/// Parameters of one bundling run, already validated by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOptions {
    /// Root directory whose files are bundled
    pub directory: PathBuf,
    /// Regular expression searched in each relative path; empty matches all
    pub matcher: String,
    /// Segment joined in front of every key after remapping
    pub prefix: String,
    /// Store contents as-is instead of base64
    pub plain_text: bool,
    /// Gzip contents at the best compression level
    pub compress: bool,
    /// Separator used inside keys
    pub separator: Separator,
    /// Explicit key overrides, old key to new key
    pub remap: BTreeMap<String, String>,
}

impl BundleOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub const fn encoding(&self) -> Encoding {
        Encoding {
            compress: self.compress,
            plain_text: self.plain_text,
        }
    }
}

/// Walk, filter, encode, remap and prefix in that order.
///
/// The matcher is compiled before the filesystem is touched, and override keys
/// also receive the prefix.
pub fn bundle(options: &BundleOptions) -> Result<Bundle> {
    let matcher = compile_matcher(&options.matcher)?;
    let walker = TreeWalker::new(
        &options.directory,
        &matcher,
        options.encoding(),
        options.separator,
    )?;

    let bundle = walker.walk()?;
    let bundle = remap(bundle, &options.remap)?;
    let bundle = prefix(bundle, &options.prefix, options.separator)?;

    info!(
        "Bundled {} files from {} ({} bytes encoded)",
        bundle.len(),
        walker.root().display(),
        bundle.encoded_size()
    );
    Ok(bundle)
}
