//! Configuration defaults loaded from TOML.
//!
//! Every field is optional; resolution order is command line, then config
//! file, then the builtin defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration schema for `defaults.toml`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AppConfig {
    pub search: Option<SearchConfig>,
    pub check: Option<CheckConfig>,
    pub list: Option<ListConfig>,
    pub repair: Option<RepairConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Directory containing the artist directories.
    pub top_dir: Option<PathBuf>,
    /// File extension of the tracks to search for.
    pub extension: Option<String>,
    /// Regular expression selecting artist names.
    pub artists: Option<String>,
    /// Regular expression selecting album names.
    pub albums: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CheckConfig {
    pub empty: Option<bool>,
    pub files: Option<bool>,
    pub numbering: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListConfig {
    pub artists: Option<bool>,
    pub albums: Option<bool>,
    pub tracks: Option<bool>,
    pub sort: Option<TrackSort>,
    pub details: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RepairConfig {
    pub dry_run: Option<bool>,
}

/// Track ordering for the list command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrackSort {
    #[default]
    Number,
    Title,
}

impl AppConfig {
    /// Load configuration from `explicit` when given (missing file is an
    /// error), otherwise from the standard location (missing file means
    /// builtin defaults).
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(AppConfig::default()),
            },
        };
        let raw =
            std::fs::read_to_string(&path).with_context(|| format!("read config {path:?}"))?;
        let config = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("parse config {path:?}"))?;
        Ok(config)
    }

    /// Standard location of `defaults.toml` for this platform.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tagward").join("defaults.toml"))
    }
}

/// The builtin defaults, fully spelled out; this is what `export
/// --defaults` writes.
pub fn builtin_defaults() -> AppConfig {
    AppConfig {
        search: Some(SearchConfig {
            top_dir: Some(default_top_dir()),
            extension: Some(tagward_core::search::DEFAULT_FILE_EXTENSION.to_string()),
            artists: None,
            albums: None,
        }),
        check: Some(CheckConfig {
            empty: Some(false),
            files: Some(false),
            numbering: Some(false),
        }),
        list: Some(ListConfig {
            artists: Some(true),
            albums: Some(true),
            tracks: Some(false),
            sort: Some(TrackSort::Number),
            details: Some(false),
        }),
        repair: Some(RepairConfig {
            dry_run: Some(false),
        }),
    }
}

/// The user's music directory, falling back to `~/Music`.
pub fn default_top_dir() -> PathBuf {
    dirs::audio_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join("Music"))
}

/// Resolve one boolean setting: command line beats the config file beats
/// the builtin default.
pub fn resolve_flag(cli: Option<bool>, file: Option<bool>, builtin: bool) -> bool {
    cli.or(file).unwrap_or(builtin)
}
