//! The post-repair command: delete the per-album backup directories once
//! the user has verified the repaired files.

use std::fs;
use std::io::Write;

use anyhow::{Context as _, anyhow};

use tagward_core::repair::existing_backup_directories;
use tagward_core::search::Search;

use crate::commands::{CommandError, CommandResult, search_failed};

pub fn run(search: &Search, out: &mut dyn Write) -> CommandResult {
    tracing::info!(command = "post-repair", "executing command");
    let artists = search.load().map_err(search_failed)?;
    let dirs = existing_backup_directories(&artists);
    writeln!(out, "Backup directories to delete: {}", dirs.len())
        .context("write console output")?;
    if dirs.is_empty() {
        return Ok(());
    }

    let mut deleted = 0usize;
    let mut failures = 0usize;
    for dir in &dirs {
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                tracing::info!(dir = %dir.display(), "deleted backup directory");
                deleted += 1;
            }
            Err(error) => {
                failures += 1;
                eprintln!("Error: cannot delete backup directory {dir:?}: {error}");
            }
        }
    }
    writeln!(out, "Backup directories deleted: {deleted}").context("write console output")?;
    if failures > 0 {
        return Err(CommandError::System(anyhow!(
            "{failures} backup director(ies) could not be deleted"
        )));
    }
    Ok(())
}
