//! Per-track reconciliation of file-derived names against tag metadata.
//!
//! A track is reconciled against its own file name plus the canonical
//! values its album and artist settled on. The result is a set of
//! independent conflict flags, or an "undetermined" state when the tags
//! were never read or could not be read.

use crate::model::{Album, Artist, Track};

/// Characters Windows file systems refuse in file names. Taggers keep them
/// in tag text, so a file/tag mismatch at such a position is presumed to be
/// a substitution, not a real discrepancy.
fn illegal_in_file_names(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || (c as u32) < 32
}

/// Position-aligned fuzzy comparison of a file-derived name against a tag
/// value. Case-insensitive; trailing spaces on the tag value are ignored;
/// a per-position mismatch is tolerated only where the tag holds a
/// character that could never appear in a file name.
pub fn names_comparable(file_name: &str, tag_name: &str) -> bool {
    let file = file_name.to_lowercase();
    let tag = tag_name.trim_end_matches(' ').to_lowercase();
    if file == tag {
        return true;
    }
    let file_chars: Vec<char> = file.chars().collect();
    let tag_chars: Vec<char> = tag.chars().collect();
    if file_chars.len() != tag_chars.len() {
        return false;
    }
    file_chars
        .iter()
        .zip(&tag_chars)
        .all(|(f, t)| f == t || illegal_in_file_names(*t))
}

/// Outcome of reconciling one track, checked in priority order: metadata
/// never read, metadata unreadable, then the individual conflict flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetadataState {
    not_read: bool,
    read_error: bool,
    numbering_conflict: bool,
    track_name_conflict: bool,
    album_name_conflict: bool,
    artist_name_conflict: bool,
    genre_conflict: bool,
    year_conflict: bool,
    mcdi_conflict: bool,
}

impl MetadataState {
    /// True when the tags were never read for this track.
    pub fn not_read(&self) -> bool {
        self.not_read
    }

    /// True when reading the tags failed on every source.
    pub fn has_read_error(&self) -> bool {
        self.read_error
    }

    /// Undetermined states carry no conflict flags.
    pub fn undetermined(&self) -> bool {
        self.not_read || self.read_error
    }

    pub fn has_numbering_conflict(&self) -> bool {
        self.numbering_conflict
    }

    pub fn has_track_name_conflict(&self) -> bool {
        self.track_name_conflict
    }

    pub fn has_album_name_conflict(&self) -> bool {
        self.album_name_conflict
    }

    pub fn has_artist_name_conflict(&self) -> bool {
        self.artist_name_conflict
    }

    pub fn has_genre_conflict(&self) -> bool {
        self.genre_conflict
    }

    pub fn has_year_conflict(&self) -> bool {
        self.year_conflict
    }

    pub fn has_mcdi_conflict(&self) -> bool {
        self.mcdi_conflict
    }

    pub fn has_conflicts(&self) -> bool {
        self.numbering_conflict
            || self.track_name_conflict
            || self.album_name_conflict
            || self.artist_name_conflict
            || self.genre_conflict
            || self.year_conflict
            || self.mcdi_conflict
    }
}

/// Compare a track's tag values against its file-derived identity and the
/// canonical values of the `album` and `artist` that own it.
pub fn reconcile(track: &Track, album: &Album, artist: &Artist) -> MetadataState {
    let Some(metadata) = track.metadata() else {
        return MetadataState {
            not_read: true,
            ..MetadataState::default()
        };
    };
    if !metadata.is_valid() {
        return MetadataState {
            read_error: true,
            ..MetadataState::default()
        };
    }
    MetadataState {
        not_read: false,
        read_error: false,
        numbering_conflict: metadata.number() != Some(track.number()),
        track_name_conflict: !names_comparable(track.common_name(), metadata.title()),
        album_name_conflict: album.canonical_title() != metadata.album(),
        artist_name_conflict: artist.canonical_name() != metadata.artist(),
        genre_conflict: album.canonical_genre() != metadata.genre(),
        year_conflict: album.canonical_year() != metadata.year(),
        mcdi_conflict: album.cd_identifier() != metadata.cd_identifier(),
    }
}

/// Human-readable differences for one track, alphabetically sorted.
///
/// Undetermined states produce a single explanatory line; a clean track
/// produces an empty list.
pub fn metadata_problems(track: &Track, album: &Album, artist: &Artist) -> Vec<String> {
    let state = reconcile(track, album, artist);
    if state.not_read() {
        return vec![
            "differences cannot be determined: metadata has not been read".to_string(),
        ];
    }
    if state.has_read_error() {
        return vec![
            "differences cannot be determined: there was an error reading metadata".to_string(),
        ];
    }
    if !state.has_conflicts() {
        return Vec::new();
    }
    let metadata = track
        .metadata()
        .expect("conflict flags imply loaded metadata");
    let mut diffs = Vec::new();
    if state.has_numbering_conflict() {
        let tagged = metadata
            .number()
            .map_or_else(|| "none".to_string(), |n| n.to_string());
        diffs.push(format!(
            "metadata track number {tagged} does not agree with track number {}",
            track.number()
        ));
    }
    if state.has_track_name_conflict() {
        diffs.push(format!(
            "metadata track name {:?} does not agree with track name {:?}",
            metadata.title(),
            track.common_name()
        ));
    }
    if state.has_album_name_conflict() {
        diffs.push(format!(
            "metadata album name {:?} does not agree with album name {:?}",
            metadata.album(),
            album.canonical_title()
        ));
    }
    if state.has_artist_name_conflict() {
        diffs.push(format!(
            "metadata artist name {:?} does not agree with artist name {:?}",
            metadata.artist(),
            artist.canonical_name()
        ));
    }
    if state.has_genre_conflict() {
        diffs.push(format!(
            "metadata genre {:?} does not agree with album genre {:?}",
            metadata.genre(),
            album.canonical_genre()
        ));
    }
    if state.has_year_conflict() {
        diffs.push(format!(
            "metadata year {:?} does not agree with album year {:?}",
            metadata.year(),
            album.canonical_year()
        ));
    }
    if state.has_mcdi_conflict() {
        diffs.push(format!(
            "metadata MCDI frame {:?} does not agree with the album MCDI frame {:?}",
            String::from_utf8_lossy(metadata.cd_identifier()),
            String::from_utf8_lossy(album.cd_identifier())
        ));
    }
    diffs.sort();
    diffs
}
