//! Layered configuration: defaults, a TOML file, then command-line overrides
//!
//! Environment variables reach this module through the command-line layer, so
//! precedence is defaults < file < environment < flags.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use etcetera::BaseStrategy;
use log::debug;
use serde::Deserialize;

use crate::{
    key::Separator,
    options::BundleOptions,
    serializer::{OutputStyle, Target},
};

pub const CONFIG_FILE_NAME: &str = "file-bundler.toml";
pub const DEFAULT_OUTPUT: &str = "bundle.rs";
pub const DEFAULT_TABLE_NAME: &str = "BUNDLE";

/// One configuration layer. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigLayer {
    pub directory: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub matcher: Option<String>,
    pub prefix: Option<String>,
    pub module: Option<String>,
    pub name: Option<String>,
    pub plain_text: Option<bool>,
    pub gzip: Option<bool>,
    pub style: Option<OutputStyle>,
    pub separator: Option<Separator>,
    pub suppress_errors: Option<bool>,
    pub remap: BTreeMap<String, String>,
}

impl ConfigLayer {
    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let layer: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        // Relative directories in a config file are relative to the file itself
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            directory: layer.directory.map(|dir| base.join(dir)),
            output: layer.output.map(|out| base.join(out)),
            ..layer
        })
    }

    /// Locate and load the file layer.
    ///
    /// An explicit path must exist. Otherwise `file-bundler.toml` in `cwd` is
    /// tried, then the user configuration directory. No file yields an empty
    /// layer.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let user_file = etcetera::choose_base_strategy()
            .ok()
            .map(|strategy| strategy.config_dir().join("file-bundler").join(CONFIG_FILE_NAME));
        Self::discover_in(explicit, cwd, user_file.as_deref())
    }

    fn discover_in(explicit: Option<&Path>, cwd: &Path, user_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [Some(cwd.join(CONFIG_FILE_NAME)), user_file.map(Path::to_path_buf)];
        for candidate in candidates.into_iter().flatten() {
            if candidate.is_file() {
                debug!("Using config file {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        debug!("No config file found");
        Ok(Self::default())
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    ///
    /// Remap tables are merged entry by entry.
    pub fn merge(self, other: Self) -> Self {
        let mut remap = self.remap;
        remap.extend(other.remap);

        Self {
            directory: other.directory.or(self.directory),
            output: other.output.or(self.output),
            matcher: other.matcher.or(self.matcher),
            prefix: other.prefix.or(self.prefix),
            module: other.module.or(self.module),
            name: other.name.or(self.name),
            plain_text: other.plain_text.or(self.plain_text),
            gzip: other.gzip.or(self.gzip),
            style: other.style.or(self.style),
            separator: other.separator.or(self.separator),
            suppress_errors: other.suppress_errors.or(self.suppress_errors),
            remap,
        }
    }

    /// Fill in defaults and check required values
    pub fn resolve(self) -> Result<Config> {
        let module = self
            .module
            .ok_or_else(|| anyhow!("a target module name is required (--module)"))?;
        let target = Target::new(module, self.name.unwrap_or_else(|| DEFAULT_TABLE_NAME.to_owned()));
        target.validate()?;

        Ok(Config {
            options: BundleOptions {
                directory: self.directory.unwrap_or_else(|| PathBuf::from(".")),
                matcher: self.matcher.unwrap_or_default(),
                prefix: self.prefix.unwrap_or_default(),
                plain_text: self.plain_text.unwrap_or(false),
                compress: self.gzip.unwrap_or(false),
                separator: self.separator.unwrap_or_default(),
                remap: self.remap,
            },
            output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            target,
            style: self.style.unwrap_or_default(),
            suppress_errors: self.suppress_errors.unwrap_or(false),
        })
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub options: BundleOptions,
    pub output: PathBuf,
    pub target: Target,
    pub style: OutputStyle,
    pub suppress_errors: bool,
}
