//! Backing up and rewriting tracks whose tags disagree with canon.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::{TagPatch, write_tag_patch};
use crate::model::{Album, Artist, Track};
use crate::reconcile;

#[derive(Debug, Error)]
pub enum RepairError {
    /// The track's tags already agree with the canonical values.
    #[error("no edit required")]
    NoEditNeeded,
    #[error("cannot create backup directory {dir:?}: {source}")]
    BackupDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot back up {path:?} to {backup:?}: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot rewrite tags for {path:?}: {source}")]
    TagRewrite {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },
}

/// The tag values a repair writes for `track`: file-derived identity plus
/// the album's and artist's canonical fields.
pub fn canonical_patch(track: &Track, album: &Album, artist: &Artist) -> TagPatch {
    TagPatch {
        album: album.canonical_title().to_string(),
        artist: artist.canonical_name().to_string(),
        title: track.common_name().to_string(),
        genre: album.canonical_genre().to_string(),
        year: album.canonical_year().to_string(),
        number: track.number(),
        cd_identifier: album.cd_identifier().to_vec(),
    }
}

/// Copy the track file into the album's backup directory as
/// `<number>.<ext>`. An existing backup is kept as-is so the first
/// pre-repair original survives repeated runs.
pub fn backup_track(track: &Track, album: &Album) -> Result<PathBuf, RepairError> {
    let dir = album.backup_directory();
    fs::create_dir_all(&dir).map_err(|source| RepairError::BackupDir {
        dir: dir.clone(),
        source,
    })?;
    let extension = track
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3");
    let backup = dir.join(format!("{}.{extension}", track.number()));
    if backup.exists() {
        tracing::info!(
            track = %track.path().display(),
            backup = %backup.display(),
            "backup already exists, keeping the original copy"
        );
        return Ok(backup);
    }
    fs::copy(track.path(), &backup).map_err(|source| RepairError::Backup {
        path: track.path().to_path_buf(),
        backup: backup.clone(),
        source,
    })?;
    Ok(backup)
}

/// Verify the track needs edits, back it up, then rewrite its tags from
/// the canonical values. Returns the backup path on success.
pub fn repair_track(track: &Track, album: &Album, artist: &Artist) -> Result<PathBuf, RepairError> {
    if !reconcile::reconcile(track, album, artist).has_conflicts() {
        return Err(RepairError::NoEditNeeded);
    }
    let backup = backup_track(track, album)?;
    let patch = canonical_patch(track, album, artist);
    write_tag_patch(track.path(), &patch).map_err(|source| RepairError::TagRewrite {
        path: track.path().to_path_buf(),
        source,
    })?;
    Ok(backup)
}

/// Backup directories that exist on disk for the given tree, sorted.
pub fn existing_backup_directories(artists: &[Artist]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = artists
        .iter()
        .flat_map(Artist::albums)
        .map(Album::backup_directory)
        .filter(|d| d.is_dir())
        .collect();
    dirs.sort();
    dirs
}
