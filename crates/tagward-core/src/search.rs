//! Loading the artist/album/track tree from a music directory.
//!
//! The layout is fixed: artist directories under the top directory, album
//! directories under each artist, track files under each album. Track
//! files must carry a numeric prefix (`03 Yesterday.mp3`, `1-Intro.mp3`);
//! anything else in an album directory is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::model::{Album, Artist, Track};

/// File extension searched for when none is configured.
pub const DEFAULT_FILE_EXTENSION: &str = "mp3";

#[derive(Debug, Error)]
pub enum SearchError {
    /// The top directory itself could not be read; nothing can be loaded.
    #[error("cannot read directory {dir:?}: {source}")]
    TopDirUnreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where and what to search, plus optional name filters.
#[derive(Debug)]
pub struct Search {
    top_directory: PathBuf,
    target_extension: String,
    artist_filter: Option<Regex>,
    album_filter: Option<Regex>,
    track_pattern: Regex,
}

impl Search {
    pub fn new(top_directory: impl Into<PathBuf>, target_extension: impl Into<String>) -> Self {
        let target_extension = target_extension.into();
        let track_pattern = Regex::new(&format!(
            r"^\d+[\s-].+\.{}$",
            regex::escape(&target_extension)
        ))
        .expect("escaped extension always forms a valid pattern");
        Self {
            top_directory: top_directory.into(),
            target_extension,
            artist_filter: None,
            album_filter: None,
            track_pattern,
        }
    }

    /// Restrict loading and filtering to artists whose directory name
    /// matches `filter`.
    pub fn with_artist_filter(mut self, filter: Option<Regex>) -> Self {
        self.artist_filter = filter;
        self
    }

    /// Restrict loading and filtering to albums whose directory name
    /// matches `filter`.
    pub fn with_album_filter(mut self, filter: Option<Regex>) -> Self {
        self.album_filter = filter;
        self
    }

    pub fn top_directory(&self) -> &Path {
        &self.top_directory
    }

    pub fn target_extension(&self) -> &str {
        &self.target_extension
    }

    /// Load the whole tree, ignoring the name filters and keeping empty
    /// artists and albums (the empty-folder check needs them).
    pub fn load_unfiltered(&self) -> Result<Vec<Artist>, SearchError> {
        tracing::info!(
            dir = %self.top_directory.display(),
            ext = %self.target_extension,
            "reading unfiltered music files"
        );
        self.walk(false)
    }

    /// Load the tree with the name filters applied, dropping albums
    /// without tracks and artists without albums.
    pub fn load(&self) -> Result<Vec<Artist>, SearchError> {
        tracing::info!(
            dir = %self.top_directory.display(),
            ext = %self.target_extension,
            "reading filtered music files"
        );
        self.walk(true)
    }

    fn walk(&self, filtered: bool) -> Result<Vec<Artist>, SearchError> {
        let top_entries =
            read_directory(&self.top_directory).map_err(|source| SearchError::TopDirUnreadable {
                dir: self.top_directory.clone(),
                source,
            })?;
        let mut artists = Vec::new();
        for artist_dir in directories(top_entries) {
            let artist_name = file_name(&artist_dir);
            if filtered && !matches(&self.artist_filter, &artist_name) {
                continue;
            }
            let mut artist = Artist::new(artist_name, &artist_dir);
            if let Ok(entries) = logged_read(&artist_dir) {
                for album_dir in directories(entries) {
                    let album_name = file_name(&album_dir);
                    if filtered && !matches(&self.album_filter, &album_name) {
                        continue;
                    }
                    let mut album = Album::new(album_name, &album_dir);
                    if let Ok(entries) = logged_read(&album_dir) {
                        for track_file in files(entries) {
                            let name = file_name(&track_file);
                            if !self.track_pattern.is_match(&name) {
                                continue;
                            }
                            match parse_track_name(&name, &self.target_extension) {
                                Some((number, common_name)) => {
                                    album.push_track(Track::new(
                                        &track_file,
                                        common_name,
                                        number,
                                    ));
                                }
                                None => {
                                    tracing::error!(
                                        track = %name,
                                        album = album.name(),
                                        artist = artist.name(),
                                        "the track name cannot be parsed"
                                    );
                                }
                            }
                        }
                    }
                    if !filtered || album.has_tracks() {
                        artist.push_album(album);
                    }
                }
            }
            if !filtered || artist.has_albums() {
                artists.push(artist);
            }
        }
        Ok(artists)
    }

    /// Apply the name filters to an already-loaded tree, copying what
    /// survives. The source tree is left untouched; loaded metadata is
    /// carried over.
    pub fn filter(&self, artists: &[Artist]) -> Vec<Artist> {
        let mut filtered = Vec::new();
        for artist in artists {
            if !matches(&self.artist_filter, artist.name()) {
                continue;
            }
            let mut kept_artist = Artist::new(artist.name(), artist.path());
            for album in artist.albums() {
                if !matches(&self.album_filter, album.name()) || !album.has_tracks() {
                    continue;
                }
                kept_artist.push_album(album.clone());
            }
            if kept_artist.has_albums() {
                filtered.push(kept_artist);
            }
        }
        filtered
    }
}

/// Split a track file name into its number prefix and common name.
///
/// `"03 Yesterday.mp3"` parses to `(3, "Yesterday")`; the single
/// separator after the digits may be whitespace or a dash.
pub fn parse_track_name(file_name: &str, extension: &str) -> Option<(u32, String)> {
    let mut number: u32 = 0;
    let mut digits = 0usize;
    let mut rest_start = None;
    for (i, c) in file_name.char_indices() {
        if let Some(d) = c.to_digit(10) {
            number = number.checked_mul(10)?.checked_add(d)?;
            digits += 1;
        } else {
            if digits == 0 || (!c.is_whitespace() && c != '-') {
                return None;
            }
            rest_start = Some(i + c.len_utf8());
            break;
        }
    }
    let rest = &file_name[rest_start?..];
    let stem = rest.strip_suffix(&format!(".{extension}"))?;
    if stem.is_empty() {
        return None;
    }
    Some((number, stem.to_string()))
}

fn read_directory(dir: &Path) -> std::io::Result<Vec<fs::DirEntry>> {
    fs::read_dir(dir)?.collect()
}

/// Directory read that logs and yields an error for the caller to skip.
fn logged_read(dir: &Path) -> Result<Vec<fs::DirEntry>, ()> {
    read_directory(dir).map_err(|e| {
        tracing::error!(dir = %dir.display(), error = %e, "cannot read directory");
    })
}

fn directories(entries: Vec<fs::DirEntry>) -> Vec<PathBuf> {
    entries
        .into_iter()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect()
}

fn files(entries: Vec<fs::DirEntry>) -> Vec<PathBuf> {
    entries
        .into_iter()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn matches(filter: &Option<Regex>, name: &str) -> bool {
    filter.as_ref().is_none_or(|r| r.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tree(root: &Path) {
        let beatles = root.join("The Beatles");
        let revolver = beatles.join("Revolver");
        fs::create_dir_all(&revolver).unwrap();
        fs::write(revolver.join("01 Taxman.mp3"), b"").unwrap();
        fs::write(revolver.join("02 Eleanor Rigby.mp3"), b"").unwrap();
        fs::write(revolver.join("cover.jpg"), b"").unwrap();
        fs::write(revolver.join("Taxman.mp3"), b"").unwrap(); // no number prefix
        fs::create_dir_all(beatles.join("Empty Album")).unwrap();

        let wire = root.join("Wire");
        let pink_flag = wire.join("Pink Flag");
        fs::create_dir_all(&pink_flag).unwrap();
        fs::write(pink_flag.join("1-Reuters.mp3"), b"").unwrap();

        fs::create_dir_all(root.join("No Albums Here")).unwrap();
        fs::write(root.join("stray.txt"), b"").unwrap();
    }

    #[test]
    fn parse_track_name_strips_prefix_and_extension() {
        assert_eq!(
            parse_track_name("03 Yesterday.mp3", "mp3"),
            Some((3, "Yesterday".to_string()))
        );
        assert_eq!(
            parse_track_name("1-Intro.mp3", "mp3"),
            Some((1, "Intro".to_string()))
        );
        assert_eq!(parse_track_name("Yesterday.mp3", "mp3"), None);
        assert_eq!(parse_track_name("03.mp3", "mp3"), None);
        assert_eq!(parse_track_name("03 Yesterday.flac", "mp3"), None);
    }

    #[test]
    fn unfiltered_load_keeps_empty_folders_and_skips_odd_files() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path());
        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let mut artists = search.load_unfiltered().unwrap();
        artists.sort_by(|a, b| a.name().cmp(b.name()));

        assert_eq!(artists.len(), 3);
        assert_eq!(artists[0].name(), "No Albums Here");
        assert!(!artists[0].has_albums());

        let beatles = &artists[1];
        assert_eq!(beatles.name(), "The Beatles");
        assert_eq!(beatles.albums().len(), 2);
        let revolver = beatles
            .albums()
            .iter()
            .find(|a| a.name() == "Revolver")
            .unwrap();
        assert_eq!(revolver.tracks().len(), 2);
        let empty = beatles
            .albums()
            .iter()
            .find(|a| a.name() == "Empty Album")
            .unwrap();
        assert!(!empty.has_tracks());
    }

    #[test]
    fn filtered_load_applies_filters_and_drops_empties() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path());
        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION)
            .with_artist_filter(Some(Regex::new("Beatles").unwrap()));
        let artists = search.load().unwrap();

        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name(), "The Beatles");
        // the empty album and the empty artist are gone
        assert_eq!(artists[0].albums().len(), 1);
        assert_eq!(artists[0].albums()[0].name(), "Revolver");
    }

    #[test]
    fn filter_copies_without_mutating_the_source() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path());
        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let unfiltered = search.load_unfiltered().unwrap();
        let before = unfiltered.len();

        let filtering = Search::new(dir.path(), DEFAULT_FILE_EXTENSION)
            .with_album_filter(Some(Regex::new("^Pink").unwrap()));
        let filtered = filtering.filter(&unfiltered);

        assert_eq!(unfiltered.len(), before);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "Wire");
        assert_eq!(filtered[0].albums().len(), 1);
        assert_eq!(filtered[0].albums()[0].tracks().len(), 1);
    }

    #[test]
    fn unreadable_top_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-there");
        let search = Search::new(&missing, DEFAULT_FILE_EXTENSION);
        assert!(search.load_unfiltered().is_err());
    }
}
