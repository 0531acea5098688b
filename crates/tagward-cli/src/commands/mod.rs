//! Command implementations and the plumbing they share.

pub mod check;
pub mod export;
pub mod list;
pub mod post_repair;
pub mod repair;

use regex::Regex;
use thiserror::Error;

use tagward_core::search::{DEFAULT_FILE_EXTENSION, Search, SearchError};

use crate::cli::SearchArgs;
use crate::config::{AppConfig, SearchConfig, default_top_dir};

/// A command failure, split by whose fault it is; main maps the variants
/// to distinct exit codes.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    User(String),
    #[error(transparent)]
    System(#[from] anyhow::Error),
}

pub type CommandResult = Result<(), CommandError>;

/// Combine command-line search flags with config-file defaults into a
/// ready-to-run `Search`.
pub fn build_search(args: &SearchArgs, config: &AppConfig) -> Result<Search, CommandError> {
    let defaults = config.search.clone().unwrap_or_else(SearchConfig::default);
    let top_dir = args
        .top_dir
        .clone()
        .or(defaults.top_dir)
        .unwrap_or_else(default_top_dir);
    let extension = args
        .ext
        .clone()
        .or(defaults.extension)
        .unwrap_or_else(|| DEFAULT_FILE_EXTENSION.to_string());
    let artist_filter = compile_filter("artists", args.artists.clone().or(defaults.artists))?;
    let album_filter = compile_filter("albums", args.albums.clone().or(defaults.albums))?;
    Ok(Search::new(top_dir, extension)
        .with_artist_filter(artist_filter)
        .with_album_filter(album_filter))
}

fn compile_filter(
    flag: &str,
    pattern: Option<String>,
) -> Result<Option<Regex>, CommandError> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    Regex::new(&pattern).map(Some).map_err(|e| {
        CommandError::User(format!(
            "the {flag} filter {pattern:?} is not a valid regular expression: {e}"
        ))
    })
}

/// An unreadable top directory is the user's to fix.
pub fn search_failed(error: SearchError) -> CommandError {
    match error {
        SearchError::TopDirUnreadable { .. } => CommandError::User(error.to_string()),
    }
}
