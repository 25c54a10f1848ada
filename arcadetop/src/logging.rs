//! Tracing setup. The TUI owns the terminal, so logs go to a file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::profiles::config_dir;

pub const DEFAULT_DIRECTIVES: &str = "info";

pub fn default_log_path() -> PathBuf {
    config_dir().join("arcadetop.log")
}

/// `ARCADETOP_LOG` wins over `RUST_LOG`; empty values are skipped.
pub fn filter_directives(app_var: Option<String>, rust_log: Option<String>) -> String {
    app_var
        .filter(|v| !v.trim().is_empty())
        .or(rust_log.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}

pub fn init(log_file: Option<&Path>) -> Result<PathBuf> {
    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let directives = filter_directives(
        std::env::var("ARCADETOP_LOG").ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("logging init failed: {e}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_precedence() {
        assert_eq!(
            filter_directives(Some("debug".into()), Some("warn".into())),
            "debug"
        );
        assert_eq!(filter_directives(Some(" ".into()), Some("warn".into())), "warn");
        assert_eq!(filter_directives(None, None), "info");
    }
}
