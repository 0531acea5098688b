//! The in-memory music tree: artists own albums, albums own tracks.
//!
//! Ownership runs strictly parent to child. Code that needs an album's or
//! artist's canonical values alongside a track receives them as explicit
//! borrowed context instead of back-pointers.

use std::path::{Path, PathBuf};

use crate::metadata::TrackMetadata;

/// Name of the per-album directory that `repair` copies originals into.
pub const BACKUP_DIR_NAME: &str = "pre-repair-backup";

/// A recording artist directory and the albums found under it.
#[derive(Clone, Debug)]
pub struct Artist {
    name: String,
    path: PathBuf,
    canonical_name: String,
    albums: Vec<Album>,
}

impl Artist {
    /// Create an artist rooted at `path`; the canonical name starts as the
    /// directory-derived name until a majority vote replaces it.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            canonical_name: name.clone(),
            name,
            path: path.into(),
            albums: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub(crate) fn set_canonical_name(&mut self, name: String) {
        self.canonical_name = name;
    }

    pub fn push_album(&mut self, album: Album) {
        self.albums.push(album);
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn albums_mut(&mut self) -> &mut [Album] {
        &mut self.albums
    }

    pub fn has_albums(&self) -> bool {
        !self.albums.is_empty()
    }
}

/// An album directory within an artist, plus the canonical metadata values
/// resolved from its tracks by the loader's voting passes.
#[derive(Clone, Debug)]
pub struct Album {
    name: String,
    path: PathBuf,
    canonical_title: String,
    canonical_genre: String,
    canonical_year: String,
    cd_identifier: Vec<u8>,
    tracks: Vec<Track>,
}

impl Album {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            canonical_title: name.clone(),
            name,
            path: path.into(),
            canonical_genre: String::new(),
            canonical_year: String::new(),
            cd_identifier: Vec::new(),
            tracks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn canonical_title(&self) -> &str {
        &self.canonical_title
    }

    pub fn canonical_genre(&self) -> &str {
        &self.canonical_genre
    }

    pub fn canonical_year(&self) -> &str {
        &self.canonical_year
    }

    /// Canonical MCDI frame bytes; empty means "no identifier".
    pub fn cd_identifier(&self) -> &[u8] {
        &self.cd_identifier
    }

    pub(crate) fn set_canonical_title(&mut self, title: String) {
        self.canonical_title = title;
    }

    pub(crate) fn set_canonical_genre(&mut self, genre: String) {
        self.canonical_genre = genre;
    }

    pub(crate) fn set_canonical_year(&mut self, year: String) {
        self.canonical_year = year;
    }

    pub(crate) fn set_cd_identifier(&mut self, bytes: Vec<u8>) {
        self.cd_identifier = bytes;
    }

    pub fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Directory the repair command copies pre-edit originals into.
    pub fn backup_directory(&self) -> PathBuf {
        self.path.join(BACKUP_DIR_NAME)
    }
}

/// A single track file. The path is its identity; metadata is absent until
/// the loader has read the file's tags.
#[derive(Clone, Debug)]
pub struct Track {
    path: PathBuf,
    common_name: String,
    number: u32,
    metadata: Option<TrackMetadata>,
}

impl Track {
    pub fn new(path: impl Into<PathBuf>, common_name: impl Into<String>, number: u32) -> Self {
        Self {
            path: path.into(),
            common_name: common_name.into(),
            number,
            metadata: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// The track name with the number prefix and extension stripped off.
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// The track number parsed from the file name prefix.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: TrackMetadata) {
        self.metadata = Some(metadata);
    }

    pub fn needs_metadata(&self) -> bool {
        self.metadata.is_none()
    }
}
