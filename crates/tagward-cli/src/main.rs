//! `tagward` checks and repairs mp3 metadata that disagrees with the
//! artist/album/track names encoded in a music directory tree.
//!
//! Exit codes: 0 on success, 1 when the user asked for something
//! unworkable, 2 when the system failed to deliver.

mod cli;
mod commands;
mod concerns;
mod config;
mod progress;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::{CommandError, CommandResult, build_search};
use crate::config::{AppConfig, resolve_flag};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error:#}");
            return ExitCode::from(2);
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match dispatch(cli.command, &config, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::User(message)) => {
            eprintln!("Error: {message}");
            ExitCode::from(1)
        }
        Err(CommandError::System(error)) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn dispatch(command: Command, config: &AppConfig, out: &mut dyn Write) -> CommandResult {
    match command {
        Command::Check {
            empty,
            files,
            numbering,
            search,
        } => {
            let defaults = config.check.clone().unwrap_or_default();
            let settings = commands::check::CheckSettings {
                empty: resolve_flag(empty, defaults.empty, false),
                files: resolve_flag(files, defaults.files, false),
                numbering: resolve_flag(numbering, defaults.numbering, false),
            };
            let search = build_search(&search, config)?;
            commands::check::run(&settings, &search, out)
        }
        Command::List {
            artists,
            albums,
            tracks,
            sort,
            details,
            search,
        } => {
            let defaults = config.list.clone().unwrap_or_default();
            let settings = commands::list::ListSettings {
                artists: resolve_flag(artists, defaults.artists, true),
                albums: resolve_flag(albums, defaults.albums, true),
                tracks: resolve_flag(tracks, defaults.tracks, false),
                sort: sort.or(defaults.sort).unwrap_or_default(),
                details: resolve_flag(details, defaults.details, false),
            };
            let search = build_search(&search, config)?;
            commands::list::run(&settings, &search, out)
        }
        Command::Repair { dry_run, search } => {
            let defaults = config.repair.clone().unwrap_or_default();
            let dry_run = resolve_flag(dry_run, defaults.dry_run, false);
            let search = build_search(&search, config)?;
            commands::repair::run(dry_run, &search, out)
        }
        Command::PostRepair { search } => {
            let search = build_search(&search, config)?;
            commands::post_repair::run(&search, out)
        }
        Command::Export {
            defaults,
            overwrite,
        } => commands::export::run(defaults, overwrite, out),
    }
}
