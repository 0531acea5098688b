//! The repair command: load and reconcile the tree, then back up and
//! rewrite every track whose tags disagree with the canonical values.

use std::io::Write;

use anyhow::{Context as _, anyhow};

use tagward_core::loader::{Id3TagReader, MetadataLoader, pending_track_count};
use tagward_core::model::{Album, Artist, Track};
use tagward_core::reconcile::reconcile;
use tagward_core::repair::repair_track;
use tagward_core::search::Search;

use crate::commands::{CommandError, CommandResult, search_failed};
use crate::progress::ConsoleProgress;

pub fn run(dry_run: bool, search: &Search, out: &mut dyn Write) -> CommandResult {
    tracing::info!(command = "repair", dry_run, "executing command");
    let mut artists = search.load().map_err(search_failed)?;
    let progress = ConsoleProgress::start(pending_track_count(&artists));
    MetadataLoader::default().load(&mut artists, &Id3TagReader, &progress);

    let needing = tracks_needing_repair(&artists);
    if needing.is_empty() {
        writeln!(out, "No repairable track defects were found")
            .context("write console output")?;
        return Ok(());
    }

    if dry_run {
        writeln!(out, "The following tracks need repair:").context("write console output")?;
        for (track, _, _) in &needing {
            writeln!(out, "  {}", track.path().display()).context("write console output")?;
        }
        return Ok(());
    }

    let mut repaired = 0usize;
    let mut failed = 0usize;
    for (track, album, artist) in needing {
        match repair_track(track, album, artist) {
            Ok(backup) => {
                repaired += 1;
                writeln!(
                    out,
                    "repaired {:?}; original backed up to {backup:?}",
                    track.path()
                )
                .context("write console output")?;
            }
            Err(error) => {
                failed += 1;
                eprintln!("Error: {error}");
            }
        }
    }
    writeln!(out, "Repaired tracks: {repaired}").context("write console output")?;
    if failed > 0 {
        return Err(CommandError::System(anyhow!(
            "{failed} track(s) could not be repaired"
        )));
    }
    Ok(())
}

/// Conflicted tracks in report order: artists and albums by name, tracks
/// by number.
fn tracks_needing_repair(artists: &[Artist]) -> Vec<(&Track, &Album, &Artist)> {
    let mut artist_refs: Vec<&Artist> = artists.iter().collect();
    artist_refs.sort_by(|a, b| a.name().cmp(b.name()));
    let mut needing = Vec::new();
    for artist in artist_refs {
        let mut album_refs: Vec<&Album> = artist.albums().iter().collect();
        album_refs.sort_by(|a, b| a.name().cmp(b.name()));
        for album in album_refs {
            let mut track_refs: Vec<&Track> = album.tracks().iter().collect();
            track_refs.sort_by_key(|t| t.number());
            for track in track_refs {
                if reconcile(track, album, artist).has_conflicts() {
                    needing.push((track, album, artist));
                }
            }
        }
    }
    needing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tagward_core::metadata::{TagPatch, TrackMetadata, write_tag_patch};
    use tagward_core::model::BACKUP_DIR_NAME;
    use tagward_core::search::DEFAULT_FILE_EXTENSION;

    fn make_album(root: &std::path::Path) -> std::path::PathBuf {
        let album_dir = root.join("The Beatles").join("Help!");
        fs::create_dir_all(&album_dir).unwrap();
        for (file, title, number) in [
            ("01 Help!.mp3", "Help!", 1u32),
            ("03 Yesterday.mp3", "Yesterdy", 9),
        ] {
            let path = album_dir.join(file);
            fs::write(&path, [0u8; 256]).unwrap();
            write_tag_patch(
                &path,
                &TagPatch {
                    album: "Help!".to_string(),
                    artist: "The Beatles".to_string(),
                    title: title.to_string(),
                    genre: "Rock".to_string(),
                    year: "1965".to_string(),
                    number,
                    cd_identifier: Vec::new(),
                },
            )
            .unwrap();
        }
        album_dir
    }

    #[test]
    fn dry_run_reports_without_touching_files() {
        let dir = tempfile::tempdir().unwrap();
        let album_dir = make_album(dir.path());
        let broken = album_dir.join("03 Yesterday.mp3");
        let before = fs::read(&broken).unwrap();

        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let mut out = Vec::new();
        run(true, &search, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.starts_with("The following tracks need repair:\n"));
        assert!(output.contains("03 Yesterday.mp3"));
        assert!(!output.contains("01 Help!.mp3"));
        assert_eq!(fs::read(&broken).unwrap(), before);
        assert!(!album_dir.join(BACKUP_DIR_NAME).exists());
    }

    #[test]
    fn repair_rewrites_and_backs_up_only_conflicted_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let album_dir = make_album(dir.path());
        let broken = album_dir.join("03 Yesterday.mp3");
        let original = fs::read(&broken).unwrap();

        let search = Search::new(dir.path(), DEFAULT_FILE_EXTENSION);
        let mut out = Vec::new();
        run(false, &search, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.contains("Repaired tracks: 1\n"));
        let backup = album_dir.join(BACKUP_DIR_NAME).join("3.mp3");
        assert_eq!(fs::read(&backup).unwrap(), original);

        let repaired = TrackMetadata::read(&broken);
        assert_eq!(repaired.title(), "Yesterday");
        assert_eq!(repaired.number(), Some(3));

        // a second run finds nothing left to repair
        let mut out = Vec::new();
        run(false, &search, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "No repairable track defects were found\n"
        );
    }
}
