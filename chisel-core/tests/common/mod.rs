//! Test helper functions for integration tests
//!
//! Shared across the test binaries using the tests/common/ pattern.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Once;

/// Root document used when a test does not bring its own
pub const DEFAULT_CHISEL_YAML: &str = r#"
    format: chisel-v1
    archives:
        ubuntu:
            version: 22.04
            components: [main, universe]
"#;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Strip the indentation shared by all non-blank lines
///
/// Fixtures are written indented to line up with the test code.
#[allow(dead_code)]
pub fn reindent(data: &str) -> String {
    let indent = data
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for line in data.lines().skip_while(|line| line.trim().is_empty()) {
        out.push_str(line.get(indent..).unwrap_or("").trim_end());
        out.push('\n');
    }
    out
}

/// Write a release tree, adding the default root document when missing
#[allow(dead_code)]
pub fn write_release(dir: &Path, files: &[(&str, &str)]) -> Result<()> {
    let has_root = files.iter().any(|(path, _)| *path == "chisel.yaml");
    let root = [("chisel.yaml", DEFAULT_CHISEL_YAML)];
    let extra: &[(&str, &str)] = if has_root { &[] } else { &root };

    for (path, data) in files.iter().chain(extra) {
        let path = dir.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, reindent(data))?;
    }
    Ok(())
}
