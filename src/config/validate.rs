// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{CieloError, Result};
use crate::types::SourceKind;
use crate::watch::patterns::build_globset;

impl TryFrom<RawSettings> for Settings {
    type Error = crate::errors::CieloError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;
        Ok(Settings::new_unchecked(raw))
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_converters(raw)?;
    validate_ignore_globs(raw)?;
    validate_registry_name(raw)?;
    Ok(())
}

fn validate_converters(raw: &RawSettings) -> Result<()> {
    let entries = [
        (SourceKind::Cielo, &raw.converters.cielo),
        (SourceKind::Coffee, &raw.converters.coffee),
        (SourceKind::Starbucks, &raw.converters.starbucks),
    ];
    for (kind, cmd) in entries {
        if let Some(cmd) = cmd {
            if cmd.trim().is_empty() {
                return Err(CieloError::ConfigError(format!(
                    "[converters].{kind} must not be empty"
                )));
            }
        }
    }
    Ok(())
}

fn validate_ignore_globs(raw: &RawSettings) -> Result<()> {
    build_globset(&raw.watch.ignore).map_err(|e| {
        CieloError::ConfigError(format!("[watch].ignore: {e:#}"))
    })?;
    Ok(())
}

fn validate_registry_name(raw: &RawSettings) -> Result<()> {
    let name = raw.stores.registry.as_str();
    if name.contains('/') || name.contains('\\') {
        return Err(CieloError::ConfigError(format!(
            "[stores].registry must be a plain file name (got '{name}')"
        )));
    }
    if !name.ends_with(".js") || name.len() <= ".js".len() {
        return Err(CieloError::ConfigError(format!(
            "[stores].registry must name a .js file (got '{name}')"
        )));
    }
    Ok(())
}
