//! Command-line surface area: subcommands, their flags, and the shared
//! search flags. No command logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::TrackSort;

#[derive(Parser, Debug)]
#[command(
    name = "tagward",
    version,
    about = "Checks and repairs mp3 metadata that disagrees with file and directory names"
)]
pub struct Cli {
    /// Path to a defaults.toml, overriding the standard config location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Search flags shared by every command that reads the music tree.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Directory containing the artist directories
    #[arg(long)]
    pub top_dir: Option<PathBuf>,

    /// File extension of the tracks to search for
    #[arg(long)]
    pub ext: Option<String>,

    /// Regular expression selecting artist names
    #[arg(long)]
    pub artists: Option<String>,

    /// Regular expression selecting album names
    #[arg(long)]
    pub albums: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check for problems in the music library
    Check {
        /// Check for empty artist and album directories
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        empty: Option<bool>,

        /// Check for disagreement between file names and metadata
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        files: Option<bool>,

        /// Check for gaps and duplicates in track numbering
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        numbering: Option<bool>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// List artists, albums, and tracks
    List {
        /// Include artists in the listing
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        artists: Option<bool>,

        /// Include albums in the listing
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        albums: Option<bool>,

        /// Include tracks in the listing
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        tracks: Option<bool>,

        /// Track ordering
        #[arg(long, value_enum)]
        sort: Option<TrackSort>,

        /// Read each listed track's metadata and show extra tag details
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        details: Option<bool>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Rewrite track metadata that disagrees with the canonical values
    Repair {
        /// Report what would change without touching any file
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        dry_run: Option<bool>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Delete the backup directories created by repair
    PostRepair {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Export default program configuration
    Export {
        /// Write the builtin default configuration
        #[arg(long)]
        defaults: bool,

        /// Overwrite an existing defaults.toml
        #[arg(long)]
        overwrite: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_parse_with_and_without_values() {
        let cli = Cli::parse_from(["tagward", "check", "--files", "--empty=false"]);
        match cli.command {
            Command::Check {
                empty,
                files,
                numbering,
                ..
            } => {
                assert_eq!(files, Some(true));
                assert_eq!(empty, Some(false));
                assert_eq!(numbering, None);
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn search_flags_are_available_on_subcommands() {
        let cli = Cli::parse_from([
            "tagward",
            "repair",
            "--top-dir",
            "/srv/music",
            "--artists",
            "^The",
        ]);
        match cli.command {
            Command::Repair { search, dry_run } => {
                assert_eq!(search.top_dir, Some(PathBuf::from("/srv/music")));
                assert_eq!(search.artists.as_deref(), Some("^The"));
                assert_eq!(dry_run, None);
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn list_sort_accepts_value_enum() {
        let cli = Cli::parse_from(["tagward", "list", "--tracks", "--sort", "title"]);
        match cli.command {
            Command::List { sort, tracks, .. } => {
                assert_eq!(sort, Some(TrackSort::Title));
                assert_eq!(tracks, Some(true));
            }
            other => panic!("parsed {other:?}"),
        }
    }
}
