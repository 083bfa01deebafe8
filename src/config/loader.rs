// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{RawRunConfig, RunConfig};
use crate::errors::{PipeError, Result};

/// Environment variable naming a defaults file when `--config` is absent.
pub const CONFIG_ENV: &str = "PIPE_WHILE_READ_CONFIG";

/// Load a defaults file and return the raw settings.
///
/// This only performs TOML deserialization (unknown keys are rejected);
/// value validation happens when converting into a [`RunConfig`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRunConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| PipeError::Config(format!("reading {}: {e}", path.display())))?;

    let config: RawRunConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Pick the defaults file: `--config` first, then `PIPE_WHILE_READ_CONFIG`.
pub fn config_path(cli: Option<&Path>) -> Option<PathBuf> {
    cli.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Build the validated run configuration for an invocation.
///
/// Layering: built-in defaults < defaults file < command-line flags.
pub fn resolve_run_config(args: &CliArgs) -> Result<RunConfig> {
    let raw = match config_path(args.config.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading defaults file");
            load_from_path(&path)?
        }
        None => RawRunConfig::default(),
    };

    RunConfig::try_from(raw.overlay_cli(args))
}
