//! Configuration loading and static validation.
//!
//! The config file is read once at startup and never reloaded: webhook
//! definitions are immutable for the process lifetime. Submodules provide
//! the serde data model and the validation logic.

pub mod model;
pub mod validation;

use std::path::Path;

use crate::error::HookfanError;
use model::Config;

/// Parse a YAML config string without validating it.
pub fn parse_str(content: &str, path_display: &str) -> Result<Config, HookfanError> {
    serde_yml::from_str(content).map_err(|e| HookfanError::ConfigParse {
        path: path_display.to_string(),
        source: Box::new(e),
    })
}

/// Read, parse, and validate a config file.
pub fn load(path: &Path) -> Result<Config, HookfanError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HookfanError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            HookfanError::Io(e)
        }
    })?;

    let config = parse_str(&content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&config) {
        return Err(HookfanError::ConfigValidation { errors });
    }

    Ok(config)
}
