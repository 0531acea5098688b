//! The list command: print artists, albums, and tracks in a stable order,
//! optionally with per-track tag details.

use std::io::Write;

use anyhow::Context as _;

use tagward_core::metadata::track_details;
use tagward_core::model::{Album, Artist, Track};
use tagward_core::search::Search;

use crate::commands::{CommandError, CommandResult, search_failed};
use crate::config::TrackSort;

#[derive(Clone, Copy, Debug)]
pub struct ListSettings {
    pub artists: bool,
    pub albums: bool,
    pub tracks: bool,
    pub sort: TrackSort,
    pub details: bool,
}

pub fn run(settings: &ListSettings, search: &Search, out: &mut dyn Write) -> CommandResult {
    if !settings.artists && !settings.albums && !settings.tracks {
        return Err(CommandError::User(
            "nothing to list; enable at least one of --artists, --albums, or --tracks"
                .to_string(),
        ));
    }
    tracing::info!(
        command = "list",
        artists = settings.artists,
        albums = settings.albums,
        tracks = settings.tracks,
        "executing command"
    );

    let mut tree = search.load().map_err(search_failed)?;
    tree.sort_by(|a, b| a.name().cmp(b.name()));
    for artist in &tree {
        list_artist(settings, artist, out).context("write listing")?;
    }
    Ok(())
}

fn list_artist(
    settings: &ListSettings,
    artist: &Artist,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let mut album_indent = 0;
    if settings.artists {
        writeln!(out, "Artist: {}", artist.name())?;
        album_indent = 2;
    }
    let mut albums: Vec<&Album> = artist.albums().iter().collect();
    albums.sort_by(|a, b| a.name().cmp(b.name()));
    for album in albums {
        let mut track_indent = album_indent;
        if settings.albums {
            writeln!(out, "{:album_indent$}Album: {}", "", album.name())?;
            track_indent = album_indent + 2;
        }
        if settings.tracks {
            list_tracks(settings, album, track_indent, out)?;
        }
    }
    Ok(())
}

fn list_tracks(
    settings: &ListSettings,
    album: &Album,
    indent: usize,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let mut tracks: Vec<&Track> = album.tracks().iter().collect();
    match settings.sort {
        TrackSort::Number => tracks.sort_by_key(|t| t.number()),
        TrackSort::Title => tracks.sort_by(|a, b| a.common_name().cmp(b.common_name())),
    }
    for track in tracks {
        match settings.sort {
            TrackSort::Number => {
                writeln!(out, "{:indent$}{:2}. {}", "", track.number(), track.common_name())?;
            }
            TrackSort::Title => {
                writeln!(out, "{:indent$}{}", "", track.common_name())?;
            }
        }
        if settings.details {
            write_details(track, indent + 2, out)?;
        }
    }
    Ok(())
}

fn write_details(track: &Track, indent: usize, out: &mut dyn Write) -> std::io::Result<()> {
    match track_details(track.path()) {
        Ok(details) => {
            for (label, value) in details {
                writeln!(out, "{:indent$}{label}: {value}", "")?;
            }
        }
        Err(cause) => {
            eprintln!(
                "The details are not available for track {:?}: {cause}",
                track.path()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tagward_core::search::DEFAULT_FILE_EXTENSION;

    fn make_tree(root: &std::path::Path) {
        let revolver = root.join("The Beatles").join("Revolver");
        fs::create_dir_all(&revolver).unwrap();
        fs::write(revolver.join("02 Eleanor Rigby.mp3"), b"").unwrap();
        fs::write(revolver.join("01 Taxman.mp3"), b"").unwrap();
        let pink_flag = root.join("Wire").join("Pink Flag");
        fs::create_dir_all(&pink_flag).unwrap();
        fs::write(pink_flag.join("03 Three Girl Rhumba.mp3"), b"").unwrap();
    }

    fn run_to_string(settings: &ListSettings, search: &Search) -> String {
        let mut out = Vec::new();
        run(settings, search, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nothing_enabled_is_a_user_error() {
        let search = Search::new("/nowhere", DEFAULT_FILE_EXTENSION);
        let settings = ListSettings {
            artists: false,
            albums: false,
            tracks: false,
            sort: TrackSort::Number,
            details: false,
        };
        let mut out = Vec::new();
        match run(&settings, &search, &mut out) {
            Err(CommandError::User(_)) => {}
            other => panic!("expected user error, got {other:?}"),
        }
    }

    #[test]
    fn full_listing_nests_and_sorts_by_number() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path());
        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let settings = ListSettings {
            artists: true,
            albums: true,
            tracks: true,
            sort: TrackSort::Number,
            details: false,
        };
        assert_eq!(
            run_to_string(&settings, &search),
            concat!(
                "Artist: The Beatles\n",
                "  Album: Revolver\n",
                "     1. Taxman\n",
                "     2. Eleanor Rigby\n",
                "Artist: Wire\n",
                "  Album: Pink Flag\n",
                "     3. Three Girl Rhumba\n",
            )
        );
    }

    #[test]
    fn track_only_listing_sorts_by_title() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path());
        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let settings = ListSettings {
            artists: false,
            albums: false,
            tracks: true,
            sort: TrackSort::Title,
            details: false,
        };
        assert_eq!(
            run_to_string(&settings, &search),
            concat!(
                "Eleanor Rigby\n",
                "Taxman\n",
                "Three Girl Rhumba\n",
            )
        );
    }
}
