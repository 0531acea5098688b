//! The check command: empty-folder, numbering, and file/metadata
//! integrity analyses over the music tree, reported as one concern tree.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Context as _;

use tagward_core::loader::{Id3TagReader, MetadataLoader, pending_track_count};
use tagward_core::model::Artist;
use tagward_core::reconcile::metadata_problems;
use tagward_core::search::Search;
use tagward_core::vote::format_tally;

use crate::commands::{CommandError, CommandResult, search_failed};
use crate::concerns::{ConcernType, ConcernedArtist, merge_forests, wrap, write_report};
use crate::progress::ConsoleProgress;

/// Which analyses to run; selecting none is a user error.
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckSettings {
    pub empty: bool,
    pub files: bool,
    pub numbering: bool,
}

impl CheckSettings {
    pub fn has_work(&self) -> bool {
        self.empty || self.files || self.numbering
    }
}

pub fn run(settings: &CheckSettings, search: &Search, out: &mut dyn Write) -> CommandResult {
    if !settings.has_work() {
        return Err(CommandError::User(
            "none of the check analyses are enabled; enable at least one of --empty, --files, or --numbering"
                .to_string(),
        ));
    }
    tracing::info!(
        command = "check",
        empty = settings.empty,
        files = settings.files,
        numbering = settings.numbering,
        "executing command"
    );

    let mut forests: Vec<Vec<ConcernedArtist>> = Vec::new();

    // The empty-folder analysis needs the unfiltered tree; the other
    // analyses work on the filtered one.
    let mut artists: Vec<Artist>;
    if settings.empty {
        let unfiltered = search.load_unfiltered().map_err(search_failed)?;
        forests.push(empty_analysis(&unfiltered, out)?);
        artists = search.filter(&unfiltered);
    } else {
        artists = search.load().map_err(search_failed)?;
    }

    if settings.numbering {
        forests.push(numbering_analysis(&artists, out)?);
    }
    if settings.files {
        forests.push(files_analysis(&mut artists, out)?);
    }

    let merged = merge_forests(forests);
    write_report(&merged, out).context("write check report")?;
    Ok(())
}

fn empty_analysis(
    artists: &[Artist],
    out: &mut dyn Write,
) -> Result<Vec<ConcernedArtist>, CommandError> {
    let mut forest = wrap(artists);
    let mut found = false;
    for (artist, concerned) in artists.iter().zip(forest.iter_mut()) {
        if !artist.has_albums() {
            concerned.add(ConcernType::Empty, "no albums found");
            found = true;
            continue;
        }
        for (album, concerned_album) in artist.albums().iter().zip(concerned.albums_mut()) {
            if !album.has_tracks() {
                concerned_album.add(ConcernType::Empty, "no tracks found");
                found = true;
            }
        }
    }
    if !found {
        writeln!(out, "Empty Folder Analysis: no empty folders found")
            .context("write analysis status")?;
    }
    Ok(forest)
}

fn numbering_analysis(
    artists: &[Artist],
    out: &mut dyn Write,
) -> Result<Vec<ConcernedArtist>, CommandError> {
    let mut forest = wrap(artists);
    let mut found = false;
    for (artist, concerned) in artists.iter().zip(forest.iter_mut()) {
        for (album, concerned_album) in artist.albums().iter().zip(concerned.albums_mut()) {
            let mut seen: BTreeMap<u32, &str> = BTreeMap::new();
            for track in album.tracks() {
                match seen.get(&track.number()) {
                    Some(existing) => {
                        concerned_album.add(
                            ConcernType::Numbering,
                            format!(
                                "track {} used by {existing:?} and {:?}",
                                track.number(),
                                track.common_name()
                            ),
                        );
                        found = true;
                    }
                    None => {
                        seen.insert(track.number(), track.common_name());
                    }
                }
            }
            let count = album.tracks().len() as u32;
            let mut missing = 0u32;
            for number in 1..=count {
                if !seen.contains_key(&number) {
                    missing += 1;
                    concerned_album
                        .add(ConcernType::Numbering, format!("missing track {number}"));
                    found = true;
                }
            }
            let expected = count + missing;
            for (number, name) in &seen {
                if *number < 1 || *number > expected {
                    concerned_album.add(
                        ConcernType::Numbering,
                        format!(
                            "track {number} ({name:?}) is not a valid track number; valid tracks are 1..{expected}"
                        ),
                    );
                    found = true;
                }
            }
        }
    }
    if !found {
        writeln!(out, "Numbering Analysis: no numbering problems found")
            .context("write analysis status")?;
    }
    Ok(forest)
}

fn files_analysis(
    artists: &mut [Artist],
    out: &mut dyn Write,
) -> Result<Vec<ConcernedArtist>, CommandError> {
    let progress = ConsoleProgress::start(pending_track_count(artists));
    let outcome = MetadataLoader::default().load(artists, &Id3TagReader, &progress);
    for ambiguity in &outcome.ambiguities {
        eprintln!(
            "There are multiple {} fields for {:?}, and there is no unambiguously preferred choice; candidates are {}",
            ambiguity.field,
            ambiguity.context,
            format_tally(&ambiguity.tally)
        );
    }

    let mut forest = wrap(artists);
    let mut found = false;
    for (artist, concerned) in artists.iter().zip(forest.iter_mut()) {
        for (album, concerned_album) in artist.albums().iter().zip(concerned.albums_mut()) {
            for (track, concerned_track) in
                album.tracks().iter().zip(concerned_album.tracks_mut())
            {
                for problem in metadata_problems(track, album, artist) {
                    concerned_track.add(ConcernType::Files, problem);
                    found = true;
                }
                if let Some(metadata) = track.metadata() {
                    for conflict in metadata.source_conflicts() {
                        concerned_track.add(ConcernType::Conflict, conflict);
                        found = true;
                    }
                }
            }
        }
    }
    if !found {
        writeln!(out, "Integrity Analysis: no issues found").context("write analysis status")?;
    }
    Ok(forest)
}
