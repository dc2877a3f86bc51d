//! Rendering a [`Bundle`] as generated Rust source
//!
//! The output declares a module holding a static table of `(key, value)` pairs
//! sorted by key, plus a binary-search lookup. Values are string literals when
//! every value is UTF-8 and byte-string literals otherwise.
//!
//! The config-defaults style also emits the `config` crate path of every entry:
//! key segments split on `/`, `\` and `.` and rejoined with `.`, so
//! `static/bacon.json` is bound as `static.bacon.json`, nested the way
//! `config` nests tables.

use std::{
    collections::BTreeSet,
    fmt::{self, Write as _},
    io,
};

use serde::Deserialize;

use crate::{
    bundle::Bundle,
    error::{BundleError, Result},
};

pub const GENERATED_MARKER: &str = "// Code generated by file-bundler. DO NOT EDIT.";

const INDENT: &str = "    ";

/// Surrounding boilerplate for the generated table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStyle {
    /// The table and a lookup function, usable on their own
    #[default]
    Standalone,
    /// Additionally a `bind_defaults` hook registering every entry as a
    /// default on a `config` crate builder
    ConfigDefaults,
}

/// Where the generated table lives: `pub mod <module> { pub static <name> }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub module: String,
    pub name: String,
}

impl Target {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("module", &self.module)?;
        validate_identifier("table", &self.name)
    }
}

/// Render `bundle` and write it to `writer`.
///
/// Rendering happens in memory first, so a configuration error never leaves a
/// partially written output behind.
pub fn write_bundle<W: io::Write + ?Sized>(
    writer: &mut W,
    target: &Target,
    bundle: &Bundle,
    style: OutputStyle,
) -> Result<()> {
    let source = render(target, bundle, style)?;
    writer
        .write_all(source.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(BundleError::Write)
}

/// Render `bundle` as Rust source text
pub fn render(target: &Target, bundle: &Bundle, style: OutputStyle) -> Result<String> {
    target.validate()?;

    let value_kind = if bundle.is_text() {
        ValueKind::Str
    } else {
        ValueKind::Bytes
    };
    if style == OutputStyle::ConfigDefaults && value_kind == ValueKind::Bytes {
        let key = bundle
            .iter()
            .find(|(_, value)| std::str::from_utf8(value).is_err())
            .map(|(key, _)| key.to_owned())
            .unwrap_or_default();
        return Err(BundleError::NonUtf8Value { key });
    }

    let config_keys = match style {
        OutputStyle::Standalone => None,
        OutputStyle::ConfigDefaults => Some(config_keys(bundle)?),
    };

    let mut out = String::new();
    write_source(&mut out, target, bundle, config_keys.as_deref(), value_kind)
        .map_err(|e| BundleError::Write(io::Error::other(e)))?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Str,
    Bytes,
}

impl ValueKind {
    const fn pointee(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Bytes => "[u8]",
        }
    }
}

fn write_source(
    out: &mut String,
    target: &Target,
    bundle: &Bundle,
    config_keys: Option<&[String]>,
    value_kind: ValueKind,
) -> fmt::Result {
    let Target { module, name } = target;
    let pointee = value_kind.pointee();

    writeln!(out, "{GENERATED_MARKER}")?;
    writeln!(out)?;
    writeln!(out, "#[allow(dead_code, non_upper_case_globals, clippy::all)]")?;
    writeln!(out, "pub mod {module} {{")?;
    writeln!(out, "{INDENT}/// Bundled entries, sorted by key.")?;
    writeln!(out, "{INDENT}pub static {name}: &[(&str, &{pointee})] = &[")?;
    for (key, value) in bundle.iter() {
        write!(out, "{INDENT}{INDENT}(")?;
        write_str_literal(out, key)?;
        out.push_str(", ");
        match value_kind {
            ValueKind::Str => write_str_literal(out, &String::from_utf8_lossy(value))?,
            ValueKind::Bytes => write_byte_literal(out, value)?,
        }
        writeln!(out, "),")?;
    }
    writeln!(out, "{INDENT}];")?;
    writeln!(out)?;
    writeln!(out, "{INDENT}/// Look up a bundled entry by key.")?;
    writeln!(out, "{INDENT}pub fn get(key: &str) -> Option<&'static {pointee}> {{")?;
    writeln!(out, "{INDENT}{INDENT}{name}")?;
    writeln!(
        out,
        "{INDENT}{INDENT}{INDENT}.binary_search_by(|(k, _)| (*k).cmp(key))"
    )?;
    writeln!(out, "{INDENT}{INDENT}{INDENT}.ok()")?;
    writeln!(out, "{INDENT}{INDENT}{INDENT}.map(|index| {name}[index].1)")?;
    writeln!(out, "{INDENT}}}")?;

    if let Some(config_keys) = config_keys {
        write_config_binding(out, name, config_keys)?;
    }

    writeln!(out, "}}")
}

fn write_config_binding(out: &mut String, name: &str, config_keys: &[String]) -> fmt::Result {
    const BUILDER: &str = "::config::ConfigBuilder<::config::builder::DefaultState>";

    writeln!(out)?;
    writeln!(out, "{INDENT}const {name}_CONFIG_KEYS: &[&str] = &[")?;
    for config_key in config_keys {
        write!(out, "{INDENT}{INDENT}")?;
        write_str_literal(out, config_key)?;
        writeln!(out, ",")?;
    }
    writeln!(out, "{INDENT}];")?;
    writeln!(out)?;
    writeln!(
        out,
        "{INDENT}/// Register every bundled entry as a default on a `config` builder."
    )?;
    writeln!(out, "{INDENT}pub fn bind_defaults(")?;
    writeln!(out, "{INDENT}{INDENT}builder: {BUILDER},")?;
    writeln!(
        out,
        "{INDENT}) -> Result<{BUILDER}, ::config::ConfigError> {{"
    )?;
    writeln!(out, "{INDENT}{INDENT}{name}_CONFIG_KEYS")?;
    writeln!(out, "{INDENT}{INDENT}{INDENT}.iter()")?;
    writeln!(out, "{INDENT}{INDENT}{INDENT}.zip({name})")?;
    writeln!(
        out,
        "{INDENT}{INDENT}{INDENT}.try_fold(builder, |builder, (key, (_, value))| builder.set_default(*key, *value))"
    )?;
    writeln!(out, "{INDENT}}}")
}

fn write_str_literal(out: &mut String, text: &str) -> fmt::Result {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() || is_bidi_control(c) => {
                write!(out, "\\u{{{:x}}}", u32::from(c))?;
            }
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}

/// Direction overrides that rustc rejects when they appear raw in a literal
const fn is_bidi_control(c: char) -> bool {
    matches!(c, '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}')
}

fn write_byte_literal(out: &mut String, bytes: &[u8]) -> fmt::Result {
    out.push_str("b\"");
    for &byte in bytes {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'\0' => out.push_str("\\0"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => write!(out, "\\x{byte:02x}")?,
        }
    }
    out.push('"');
    Ok(())
}

/// Translate every bundle key into a `config` path, in table order.
///
/// Segments must be non-empty ASCII alphanumerics, `_` or `-`. Two keys that
/// translate to the same path, or a path that would need to be both a value
/// and a table, are rejected.
fn config_keys(bundle: &Bundle) -> Result<Vec<String>> {
    let config_keys = bundle
        .keys()
        .map(config_key)
        .collect::<Result<Vec<_>>>()?;

    let mut seen = BTreeSet::new();
    for (key, config_key) in bundle.keys().zip(&config_keys) {
        if !seen.insert(config_key.as_str()) {
            return Err(BundleError::UnbindableKey {
                key: key.to_owned(),
                reason: "maps to the same config path as another entry",
            });
        }
    }
    for config_key in &seen {
        let nested = format!("{config_key}.");
        if let Some(child) = seen.range(nested.as_str()..).next() {
            if child.starts_with(&nested) {
                return Err(BundleError::UnbindableKey {
                    key: (*child).to_owned(),
                    reason: "nests under the config path of another entry",
                });
            }
        }
    }

    Ok(config_keys)
}

fn config_key(key: &str) -> Result<String> {
    let segments: Vec<&str> = key.split(['/', '\\', '.']).collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });
    if !valid {
        return Err(BundleError::UnbindableKey {
            key: key.to_owned(),
            reason: "config path segments must be non-empty and use only [A-Za-z0-9_-]",
        });
    }
    Ok(segments.join("."))
}

const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn validate_identifier(kind: &'static str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid = valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && value != "_"
        && !KEYWORDS.contains(&value);

    if valid {
        Ok(())
    } else {
        Err(BundleError::InvalidIdentifier {
            kind,
            value: value.to_owned(),
        })
    }
}
