//! Concurrent metadata loading and canonical-value resolution.
//!
//! Reads run one worker per track, capped by a bounded channel used as a
//! counting semaphore: dispatch blocks sending a token when the channel is
//! full, and each worker receives one token back when it finishes. The
//! enclosing thread scope joins every worker before the voting passes run,
//! so canonical-value computation never observes a read still in flight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use crate::metadata::{TagSource, TrackMetadata};
use crate::model::{Album, Artist};
use crate::progress::ProgressSink;
use crate::reconcile::names_comparable;
use crate::vote::{self, Choice};

/// Default cap on in-flight tag reads.
pub const DEFAULT_CONCURRENT_READS: usize = 20;

/// Reads a track file's embedded tags. Implementations must be callable
/// from multiple read workers at once.
pub trait TagReader: Sync {
    fn read(&self, path: &Path) -> TrackMetadata;
}

/// Production reader backed by the `id3` crate.
pub struct Id3TagReader;

impl TagReader for Id3TagReader {
    fn read(&self, path: &Path) -> TrackMetadata {
        TrackMetadata::read(path)
    }
}

/// A field vote that ended without a majority. The canonical default was
/// left untouched; the tally is reported so a user can resolve it by hand.
#[derive(Clone, Debug)]
pub struct Ambiguity {
    /// Field under vote, e.g. "genre" or "artist name".
    pub field: &'static str,
    /// Entity the vote belonged to, e.g. `Revolver by The Beatles`.
    pub context: String,
    /// Value -> vote count.
    pub tally: HashMap<String, u32>,
}

/// One tag source of one track that could not be read.
#[derive(Clone, Debug)]
pub struct ReadFailure {
    pub track: PathBuf,
    pub source: TagSource,
    pub cause: String,
}

/// Aggregated results of a full load pass. Nothing in here is fatal.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub ambiguities: Vec<Ambiguity>,
    pub read_failures: Vec<ReadFailure>,
}

/// Orchestrates one reconciliation pass over a loaded tree. Constructed
/// per invocation; holds its own concurrency configuration.
pub struct MetadataLoader {
    concurrent_reads: usize,
}

impl Default for MetadataLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENT_READS)
    }
}

impl MetadataLoader {
    pub fn new(concurrent_reads: usize) -> Self {
        Self {
            concurrent_reads: concurrent_reads.max(1),
        }
    }

    /// Read metadata for every track that still needs it, then resolve
    /// canonical values per album and per artist.
    ///
    /// Individual read failures are recorded on their tracks and in the
    /// returned outcome; they never abort the pass.
    pub fn load(
        &self,
        artists: &mut [Artist],
        reader: &dyn TagReader,
        progress: &dyn ProgressSink,
    ) -> LoadOutcome {
        self.read_all(artists, reader, progress);
        let mut outcome = LoadOutcome::default();
        resolve_album_canonicals(artists, &mut outcome);
        resolve_artist_canonicals(artists, &mut outcome);
        collect_read_failures(artists, &mut outcome);
        outcome
    }

    fn read_all(
        &self,
        artists: &mut [Artist],
        reader: &dyn TagReader,
        progress: &dyn ProgressSink,
    ) {
        let (slot_tx, slot_rx) = crossbeam_channel::bounded::<()>(self.concurrent_reads);
        thread::scope(|scope| {
            for artist in artists.iter_mut() {
                for album in artist.albums_mut() {
                    for track in album.tracks_mut() {
                        if !track.needs_metadata() {
                            continue;
                        }
                        // Blocks while the cap's worth of reads are in flight.
                        slot_tx
                            .send(())
                            .expect("semaphore channel cannot disconnect while dispatching");
                        let release = slot_rx.clone();
                        scope.spawn(move || {
                            track.set_metadata(reader.read(track.path()));
                            progress.increment();
                            let _ = release.recv();
                        });
                    }
                }
            }
            // Leaving the scope joins every worker: the barrier between
            // "all reads complete" and the voting passes below.
        });
        progress.finish();
    }
}

/// Tracks that still need a metadata read; the progress total for a pass.
pub fn pending_track_count(artists: &[Artist]) -> usize {
    artists
        .iter()
        .flat_map(Artist::albums)
        .flat_map(Album::tracks)
        .filter(|t| t.needs_metadata())
        .count()
}

fn resolve_album_canonicals(artists: &mut [Artist], outcome: &mut LoadOutcome) {
    for artist in artists.iter_mut() {
        let artist_name = artist.name().to_string();
        for album in artist.albums_mut() {
            let mut genres: HashMap<String, u32> = HashMap::new();
            let mut years: HashMap<String, u32> = HashMap::new();
            let mut titles: HashMap<String, u32> = HashMap::new();
            let mut cd_identifiers: HashMap<Vec<u8>, u32> = HashMap::new();
            for track in album.tracks() {
                let Some(metadata) = track.metadata() else {
                    continue;
                };
                if !metadata.is_valid() {
                    continue;
                }
                let genre = metadata.genre();
                if !genre.is_empty() && !genre.to_lowercase().starts_with("unknown") {
                    *genres.entry(genre.to_string()).or_default() += 1;
                }
                if !metadata.year().is_empty() {
                    *years.entry(metadata.year().to_string()).or_default() += 1;
                }
                if names_comparable(album.name(), metadata.album()) {
                    *titles.entry(metadata.album().to_string()).or_default() += 1;
                }
                *cd_identifiers
                    .entry(metadata.cd_identifier().to_vec())
                    .or_default() += 1;
            }

            let context = format!("{} by {}", album.name(), artist_name);
            match vote::pick_canonical(&genres) {
                Choice::Majority(genre) => album.set_canonical_genre(genre),
                Choice::Ambiguous => {
                    report_ambiguity(outcome, "genre", &context, genres);
                }
                Choice::Empty => {}
            }
            match vote::pick_canonical(&years) {
                Choice::Majority(year) => album.set_canonical_year(year),
                Choice::Ambiguous => {
                    report_ambiguity(outcome, "year", &context, years);
                }
                Choice::Empty => {}
            }
            match vote::pick_canonical(&titles) {
                Choice::Majority(title) if !title.is_empty() => {
                    album.set_canonical_title(title);
                }
                Choice::Majority(_) | Choice::Empty => {}
                Choice::Ambiguous => {
                    report_ambiguity(outcome, "album title", &context, titles);
                }
            }
            match vote::pick_canonical(&cd_identifiers) {
                Choice::Majority(bytes) => album.set_cd_identifier(bytes),
                Choice::Ambiguous => {
                    let tally = cd_identifiers
                        .into_iter()
                        .map(|(bytes, count)| {
                            (String::from_utf8_lossy(&bytes).into_owned(), count)
                        })
                        .collect();
                    report_ambiguity(outcome, "MCDI frame", &context, tally);
                }
                Choice::Empty => {}
            }
        }
    }
}

fn resolve_artist_canonicals(artists: &mut [Artist], outcome: &mut LoadOutcome) {
    for artist in artists.iter_mut() {
        let mut names: HashMap<String, u32> = HashMap::new();
        for album in artist.albums() {
            for track in album.tracks() {
                let Some(metadata) = track.metadata() else {
                    continue;
                };
                if !metadata.is_valid() {
                    continue;
                }
                if names_comparable(artist.name(), metadata.artist()) {
                    *names.entry(metadata.artist().to_string()).or_default() += 1;
                }
            }
        }
        match vote::pick_canonical(&names) {
            Choice::Majority(name) if !name.is_empty() => {
                artist.set_canonical_name(name);
            }
            Choice::Majority(_) | Choice::Empty => {}
            Choice::Ambiguous => {
                let context = artist.name().to_string();
                report_ambiguity(outcome, "artist name", &context, names);
            }
        }
    }
}

fn report_ambiguity(
    outcome: &mut LoadOutcome,
    field: &'static str,
    context: &str,
    tally: HashMap<String, u32>,
) {
    tracing::warn!(
        field,
        context,
        tally = %vote::format_tally(&tally),
        "no value has a majority of instances"
    );
    outcome.ambiguities.push(Ambiguity {
        field,
        context: context.to_string(),
        tally,
    });
}

fn collect_read_failures(artists: &[Artist], outcome: &mut LoadOutcome) {
    for artist in artists {
        for album in artist.albums() {
            for track in album.tracks() {
                let Some(metadata) = track.metadata() else {
                    continue;
                };
                for (source, cause) in metadata.read_errors() {
                    tracing::error!(
                        metadata = source.name(),
                        track = %track.path().display(),
                        error = cause,
                        "metadata read error"
                    );
                    outcome.read_failures.push(ReadFailure {
                        track: track.path().to_path_buf(),
                        source,
                        cause: cause.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TagValues;
    use crate::model::Track;
    use crate::progress::NoopProgress;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Reader that serves canned values keyed by file name.
    struct StubReader {
        by_file: HashMap<String, TrackMetadata>,
    }

    impl StubReader {
        fn new() -> Self {
            Self {
                by_file: HashMap::new(),
            }
        }

        fn with(mut self, file: &str, values: TagValues) -> Self {
            self.by_file.insert(
                file.to_string(),
                TrackMetadata::from_sources(Err("no id3v1 tag".to_string()), Ok(values)),
            );
            self
        }
    }

    impl TagReader for StubReader {
        fn read(&self, path: &Path) -> TrackMetadata {
            let file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            self.by_file.get(file).cloned().unwrap_or_else(|| {
                TrackMetadata::from_sources(
                    Err("no id3v1 tag".to_string()),
                    Err("no id3v2 tag".to_string()),
                )
            })
        }
    }

    fn album_with_tracks(artist: &str, album: &str, count: u32) -> Artist {
        let mut a = Artist::new(artist, format!("/m/{artist}"));
        let mut al = Album::new(album, format!("/m/{artist}/{album}"));
        for n in 1..=count {
            al.push_track(Track::new(
                format!("/m/{artist}/{album}/{n:02} track {n}.mp3"),
                format!("track {n}"),
                n,
            ));
        }
        a.push_album(al);
        a
    }

    fn values(artist: &str, album: &str, title: &str, number: u32) -> TagValues {
        TagValues {
            artist: artist.to_string(),
            album: album.to_string(),
            title: title.to_string(),
            number: Some(number),
            ..TagValues::default()
        }
    }

    #[test]
    fn every_pending_track_is_read() {
        let mut artists = vec![
            album_with_tracks("a", "x", 3),
            album_with_tracks("b", "y", 2),
        ];
        assert_eq!(pending_track_count(&artists), 5);

        let loader = MetadataLoader::default();
        loader.load(&mut artists, &StubReader::new(), &NoopProgress);

        for artist in &artists {
            for album in artist.albums() {
                for track in album.tracks() {
                    assert!(track.metadata().is_some(), "{:?} left unread", track.path());
                }
            }
        }
        assert_eq!(pending_track_count(&artists), 0);
    }

    /// Reader that tracks how many reads are in flight at once.
    struct GaugeReader {
        live: AtomicUsize,
        peak: Mutex<usize>,
    }

    impl TagReader for GaugeReader {
        fn read(&self, _path: &Path) -> TrackMetadata {
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut peak = self.peak.lock().unwrap();
                if live > *peak {
                    *peak = live;
                }
            }
            thread::sleep(Duration::from_millis(5));
            self.live.fetch_sub(1, Ordering::SeqCst);
            TrackMetadata::from_sources(Err("stub".to_string()), Ok(TagValues::default()))
        }
    }

    #[test]
    fn in_flight_reads_respect_the_cap() {
        let mut artists = vec![album_with_tracks("a", "x", 24)];
        let reader = GaugeReader {
            live: AtomicUsize::new(0),
            peak: Mutex::new(0),
        };
        MetadataLoader::new(4).load(&mut artists, &reader, &NoopProgress);
        let peak = *reader.peak.lock().unwrap();
        assert!(peak >= 1);
        assert!(peak <= 4, "observed {peak} concurrent reads, cap was 4");
    }

    #[test]
    fn majority_artist_name_becomes_canonical() {
        let mut artists = vec![album_with_tracks("The Beatles", "Revolver", 5)];
        let mut reader = StubReader::new();
        for n in 1..=3u32 {
            reader = reader.with(
                &format!("{n:02} track {n}.mp3"),
                values("The Beatles", "Revolver", &format!("track {n}"), n),
            );
        }
        for n in 4..=5u32 {
            reader = reader.with(
                &format!("{n:02} track {n}.mp3"),
                values("Beatles", "Revolver", &format!("track {n}"), n),
            );
        }
        let outcome =
            MetadataLoader::default().load(&mut artists, &reader, &NoopProgress);
        assert_eq!(artists[0].canonical_name(), "The Beatles");
        assert!(outcome.ambiguities.is_empty());
    }

    #[test]
    fn split_genre_vote_is_reported_and_leaves_the_default() {
        let mut artists = vec![album_with_tracks("a", "x", 4)];
        let mut reader = StubReader::new();
        for (n, genre) in [(1u32, "Jazz"), (2, "Jazz"), (3, "Blues"), (4, "Blues")] {
            let mut v = values("a", "x", &format!("track {n}"), n);
            v.genre = genre.to_string();
            reader = reader.with(&format!("{n:02} track {n}.mp3"), v);
        }
        let outcome =
            MetadataLoader::default().load(&mut artists, &reader, &NoopProgress);

        assert_eq!(artists[0].albums()[0].canonical_genre(), "");
        let ambiguity = outcome
            .ambiguities
            .iter()
            .find(|a| a.field == "genre")
            .expect("genre ambiguity reported");
        assert_eq!(ambiguity.context, "x by a");
        assert_eq!(ambiguity.tally.get("Jazz"), Some(&2));
        assert_eq!(ambiguity.tally.get("Blues"), Some(&2));
    }

    #[test]
    fn unknown_genres_do_not_vote() {
        let mut artists = vec![album_with_tracks("a", "x", 3)];
        let mut reader = StubReader::new();
        for (n, genre) in [(1u32, "Unknown Genre"), (2, "unknown"), (3, "Rock")] {
            let mut v = values("a", "x", &format!("track {n}"), n);
            v.genre = genre.to_string();
            reader = reader.with(&format!("{n:02} track {n}.mp3"), v);
        }
        MetadataLoader::default().load(&mut artists, &reader, &NoopProgress);
        assert_eq!(artists[0].albums()[0].canonical_genre(), "Rock");
    }

    #[test]
    fn majority_cd_identifier_becomes_canonical() {
        let mut artists = vec![album_with_tracks("a", "x", 3)];
        let mut reader = StubReader::new();
        for n in 1..=3u32 {
            let mut v = values("a", "x", &format!("track {n}"), n);
            if n <= 2 {
                v.cd_identifier = vec![0xAA, 0xBB];
            }
            reader = reader.with(&format!("{n:02} track {n}.mp3"), v);
        }
        MetadataLoader::default().load(&mut artists, &reader, &NoopProgress);
        assert_eq!(artists[0].albums()[0].cd_identifier(), &[0xAA, 0xBB]);
    }

    #[test]
    fn unreadable_tracks_surface_as_read_failures() {
        let mut artists = vec![album_with_tracks("a", "x", 1)];
        // StubReader with no entries serves double read errors.
        let outcome =
            MetadataLoader::default().load(&mut artists, &StubReader::new(), &NoopProgress);
        let sources: Vec<TagSource> = outcome
            .read_failures
            .iter()
            .map(|f| f.source)
            .collect();
        assert!(sources.contains(&TagSource::Id3v1));
        assert!(sources.contains(&TagSource::Id3v2));

        let track = &artists[0].albums()[0].tracks()[0];
        assert!(track.metadata().is_some());
        assert!(!track.metadata().unwrap().is_valid());
    }

    #[test]
    fn progress_ticks_once_per_pending_track() {
        struct CountingProgress {
            ticks: AtomicUsize,
            finished: AtomicUsize,
        }
        impl ProgressSink for CountingProgress {
            fn increment(&self) {
                self.ticks.fetch_add(1, Ordering::SeqCst);
            }
            fn finish(&self) {
                self.finished.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut artists = vec![album_with_tracks("a", "x", 6)];
        let progress = CountingProgress {
            ticks: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        };
        MetadataLoader::default().load(&mut artists, &StubReader::new(), &progress);
        assert_eq!(progress.ticks.load(Ordering::SeqCst), 6);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }
}
