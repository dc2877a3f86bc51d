use std::{env, fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use file_bundler::{
    Bundle, OutputStyle, Separator,
    config::{Config, ConfigLayer},
    write_bundle,
};
use log::{error, info, warn};

/// Bundle a directory of files into generated Rust source
#[derive(Parser, Debug)]
#[command(name = "file-bundler", version, about, long_about = None)]
struct Cli {
    /// Source directory
    #[arg(short = 'd', long, env = "FILE_BUNDLER_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Output file
    #[arg(short = 'o', long, env = "FILE_BUNDLER_OUTPUT")]
    output: Option<PathBuf>,

    /// Regular expression selecting files by their relative path
    #[arg(short = 'm', long, env = "FILE_BUNDLER_MATCHER")]
    matcher: Option<String>,

    /// Prefix joined in front of every key
    #[arg(short = 'x', long, env = "FILE_BUNDLER_PREFIX")]
    prefix: Option<String>,

    /// Name of the generated module
    #[arg(short = 'p', long, env = "FILE_BUNDLER_MODULE")]
    module: Option<String>,

    /// Name of the generated table [default: BUNDLE]
    #[arg(short = 'n', long, env = "FILE_BUNDLER_NAME")]
    name: Option<String>,

    /// Store file contents as-is instead of base64
    #[arg(short = 't', long, overrides_with = "no_plain_text")]
    plain_text: bool,

    /// Base64-encode file contents, overriding a config file
    #[arg(long, overrides_with = "plain_text")]
    no_plain_text: bool,

    /// Gzip file contents at the best compression level
    #[arg(short = 'g', long, overrides_with = "no_gzip")]
    gzip: bool,

    /// Store file contents uncompressed, overriding a config file
    #[arg(long, overrides_with = "gzip")]
    no_gzip: bool,

    /// Also generate a hook registering entries as `config` crate defaults
    #[arg(long, overrides_with = "standalone")]
    config_defaults: bool,

    /// Generate only the lookup table, overriding a config file
    #[arg(long, overrides_with = "config_defaults")]
    standalone: bool,

    /// Join key segments with `/` regardless of platform
    #[arg(long, overrides_with = "platform_paths")]
    http_paths: bool,

    /// Join key segments with the platform separator, overriding a config file
    #[arg(long, overrides_with = "http_paths")]
    platform_paths: bool,

    /// Rename a key, applied before the prefix (repeatable)
    #[arg(long = "remap", value_name = "OLD=NEW", value_parser = parse_remap)]
    remaps: Vec<(String, String)>,

    /// On bundling failure, log a warning and write an empty bundle
    #[arg(long, overrides_with = "no_suppress_errors")]
    suppress_errors: bool,

    /// Fail on bundling errors, overriding a config file
    #[arg(long, overrides_with = "suppress_errors")]
    no_suppress_errors: bool,

    /// Configuration file [default: ./file-bundler.toml]
    #[arg(long, value_name = "PATH", env = "FILE_BUNDLER_CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// The command-line layer; unset flags leave lower layers alone
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            directory: self.directory.clone(),
            output: self.output.clone(),
            matcher: self.matcher.clone(),
            prefix: self.prefix.clone(),
            module: self.module.clone(),
            name: self.name.clone(),
            plain_text: switch(self.plain_text, self.no_plain_text, true, false),
            gzip: switch(self.gzip, self.no_gzip, true, false),
            style: switch(
                self.config_defaults,
                self.standalone,
                OutputStyle::ConfigDefaults,
                OutputStyle::Standalone,
            ),
            separator: switch(
                self.http_paths,
                self.platform_paths,
                Separator::Slash,
                Separator::Platform,
            ),
            suppress_errors: switch(self.suppress_errors, self.no_suppress_errors, true, false),
            remap: self.remaps.iter().cloned().collect(),
        }
    }
}

/// A flag pair where the last one given wins; neither leaves the setting unset
fn switch<T>(on: bool, off: bool, on_value: T, off_value: T) -> Option<T> {
    if on {
        Some(on_value)
    } else if off {
        Some(off_value)
    } else {
        None
    }
}

fn parse_remap(value: &str) -> Result<(String, String)> {
    let (old, new) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected OLD=NEW, got {value:?}"))?;
    if old.is_empty() || new.is_empty() {
        return Err(anyhow!("remap keys must not be empty: {value:?}"));
    }
    Ok((old.to_owned(), new.to_owned()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = env::current_dir().context("failed to determine current directory")?;
    let config = ConfigLayer::discover(cli.config.as_deref(), &cwd)?
        .merge(cli.overrides())
        .resolve()?;

    let bundle = bundle_or_empty(&config)?;

    let mut source = Vec::new();
    write_bundle(&mut source, &config.target, &bundle, config.style)?;
    fs::write(&config.output, source)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    info!(
        "Wrote {} entries to {}",
        bundle.len(),
        config.output.display()
    );
    Ok(())
}

/// Configuration errors are never suppressed
fn bundle_or_empty(config: &Config) -> Result<Bundle> {
    match file_bundler::bundle(&config.options) {
        Ok(bundle) => Ok(bundle),
        Err(err) if config.suppress_errors && !err.is_configuration() => {
            warn!("{err}; writing an empty bundle");
            Ok(Bundle::new())
        }
        Err(err) => Err(err).with_context(|| {
            format!(
                "failed to bundle {}",
                config.options.directory.display()
            )
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
