//! Compiles and runs the generated source against rustc and the `config` crate.

use std::{fmt::Write as _, fs, path::PathBuf};

use file_bundler::{Bundle, BundleOptions, OutputStyle, Separator, Target, bundle, render};
use tempfile::TempDir;

/// Emit assertions checking every entry of `bundle` through `<module>::get`.
fn lookup_assertions(out: &mut String, module: &str, bundle: &Bundle, text: bool) {
    for (key, value) in bundle.iter() {
        let actual = if text {
            format!("{module}::get(key).map(str::as_bytes)")
        } else {
            format!("{module}::get(key)")
        };
        writeln!(
            out,
            "    {{\n        let key = ::std::str::from_utf8(&{:?})?;\n        assert_eq!({actual}, Some::<&[u8]>(&{:?}), \"{{key:?}}\");\n    }}",
            key.as_bytes(),
            value,
        )
        .unwrap();
    }
    writeln!(out, "    assert_eq!({module}::get(\"missing\"), None);").unwrap();
}

fn text_bundle() -> Bundle {
    [
        ("quotes.txt", "He said \"hi\" \\o/"),
        ("control.txt", "\u{1}\u{7}\u{1b}[0m\r\n\t\0 end\u{7f}\u{85}"),
        ("bidi.txt", "abc\u{202e}def\u{2066}x\u{2069}\u{202a}"),
        ("unicode/snow.txt", "\u{2603} caf\u{e9} \u{65e5}\u{672c}"),
        ("dir\\file.txt", "backslash key"),
        ("empty.txt", ""),
    ]
    .into_iter()
    .map(|(key, value)| (key, value.as_bytes().to_vec()))
    .collect()
}

fn byte_bundle() -> Bundle {
    [
        ("logo.bin", vec![0, 0xff, b'"', b'\\', 0x7f, b'a', 0x80, b'\n']),
        ("plain.txt", b"plain".to_vec()),
    ]
    .into_iter()
    .collect()
}

fn config_bundle(root: &std::path::Path) -> Bundle {
    fs::create_dir_all(root.join("css")).unwrap();
    fs::write(root.join("bacon.json"), "{\"meat\": \"bacon\"}").unwrap();
    fs::write(root.join("css").join("site-v2.css"), "body { color: \"red\" }\n").unwrap();

    let options = BundleOptions {
        prefix: "./static".to_owned(),
        plain_text: true,
        separator: Separator::Slash,
        ..BundleOptions::new(root)
    };
    bundle(&options).unwrap()
}

#[test]
fn test_generated_source_compiles_and_runs() {
    let temp_dir = TempDir::new().unwrap();
    let text = text_bundle();
    let binary = byte_bundle();
    let defaults = config_bundle(temp_dir.path());
    assert_eq!(
        defaults.keys().collect::<Vec<_>>(),
        vec!["static/bacon.json", "static/css/site-v2.css"]
    );

    let mut source = String::new();
    for (module, name, bundle, style) in [
        ("text", "TEXT", &text, OutputStyle::Standalone),
        ("binary", "BINARY", &binary, OutputStyle::Standalone),
        ("defaults", "DEFAULTS", &defaults, OutputStyle::ConfigDefaults),
    ] {
        source.push_str(&render(&Target::new(module, name), bundle, style).unwrap());
        source.push('\n');
    }

    source.push_str("fn main() -> Result<(), Box<dyn ::std::error::Error>> {\n");
    writeln!(source, "    assert_eq!(text::TEXT.len(), {});", text.len()).unwrap();
    writeln!(source, "    assert!(text::TEXT.windows(2).all(|pair| pair[0].0 < pair[1].0));").unwrap();
    lookup_assertions(&mut source, "text", &text, true);
    lookup_assertions(&mut source, "binary", &binary, false);
    lookup_assertions(&mut source, "defaults", &defaults, true);
    source.push_str(concat!(
        "    let config = defaults::bind_defaults(::config::Config::builder())?.build()?;\n",
        "    assert_eq!(config.get_string(\"static.bacon.json\")?, \"{\\\"meat\\\": \\\"bacon\\\"}\");\n",
        "    assert_eq!(\n",
        "        config.get_string(\"static.css.site-v2.css\")?,\n",
        "        \"body { color: \\\"red\\\" }\\n\"\n",
        "    );\n",
        "    Ok(())\n",
        "}\n",
    ));

    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("generated_source");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("generated_source.rs");
    fs::write(&path, source).unwrap();

    let cases = trybuild::TestCases::new();
    cases.pass(&path);
}
