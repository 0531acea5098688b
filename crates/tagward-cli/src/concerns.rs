//! The concern tree: artists, albums, and tracks wrapped with bags of
//! category-tagged problem descriptions, and a deterministic renderer.
//!
//! Rendering is byte-stable: children print in name order and concern
//! lines print alphabetically, so two runs over the same content produce
//! identical reports no matter what order the file system handed us.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io::{self, Write};

use tagward_core::model::{Album, Artist, Track};

/// Closed set of concern categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConcernType {
    Empty,
    Files,
    Numbering,
    Conflict,
}

impl ConcernType {
    pub fn name(self) -> &'static str {
        match self {
            ConcernType::Empty => "empty",
            ConcernType::Files => "files",
            ConcernType::Numbering => "numbering",
            ConcernType::Conflict => "metadata conflict",
        }
    }
}

/// A bag of concerns attached to one entity.
#[derive(Clone, Debug, Default)]
pub struct Concerns {
    by_type: BTreeMap<ConcernType, Vec<String>>,
}

impl Concerns {
    pub fn add(&mut self, concern_type: ConcernType, text: impl Into<String>) {
        self.by_type.entry(concern_type).or_default().push(text.into());
    }

    pub fn is_concerned(&self) -> bool {
        self.by_type.values().any(|texts| !texts.is_empty())
    }

    fn extend(&mut self, other: Concerns) {
        for (concern_type, texts) in other.by_type {
            self.by_type.entry(concern_type).or_default().extend(texts);
        }
    }

    fn write_to(&self, w: &mut dyn Write, indent: usize) -> io::Result<()> {
        let mut lines: Vec<String> = self
            .by_type
            .iter()
            .flat_map(|(concern_type, texts)| {
                texts
                    .iter()
                    .map(|text| format!("* [{}] {}", concern_type.name(), text))
            })
            .collect();
        lines.sort();
        for line in lines {
            writeln!(w, "{:indent$}{line}", "")?;
        }
        Ok(())
    }
}

/// A track plus its concerns.
#[derive(Clone, Debug)]
pub struct ConcernedTrack {
    name: String,
    number: u32,
    concerns: Concerns,
}

impl ConcernedTrack {
    pub fn new(track: &Track) -> Self {
        Self {
            name: track.common_name().to_string(),
            number: track.number(),
            concerns: Concerns::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, concern_type: ConcernType, text: impl Into<String>) {
        self.concerns.add(concern_type, text);
    }

    pub fn is_concerned(&self) -> bool {
        self.concerns.is_concerned()
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "    Track {:?}", self.name)?;
        self.concerns.write_to(w, 4)
    }
}

/// An album, its concerns, and its wrapped tracks.
#[derive(Clone, Debug)]
pub struct ConcernedAlbum {
    name: String,
    concerns: Concerns,
    tracks: Vec<ConcernedTrack>,
}

impl ConcernedAlbum {
    pub fn new(album: &Album) -> Self {
        Self {
            name: album.name().to_string(),
            concerns: Concerns::default(),
            tracks: album.tracks().iter().map(ConcernedTrack::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, concern_type: ConcernType, text: impl Into<String>) {
        self.concerns.add(concern_type, text);
    }

    pub fn tracks_mut(&mut self) -> &mut [ConcernedTrack] {
        &mut self.tracks
    }

    pub fn is_concerned(&self) -> bool {
        self.concerns.is_concerned() || self.tracks.iter().any(ConcernedTrack::is_concerned)
    }

    fn absorb(&mut self, other: ConcernedAlbum) {
        self.concerns.extend(other.concerns);
        for track in other.tracks {
            match self
                .tracks
                .iter_mut()
                .find(|t| t.name == track.name && t.number == track.number)
            {
                Some(existing) => existing.concerns.extend(track.concerns),
                None => self.tracks.push(track),
            }
        }
    }

    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "  Album {:?}", self.name)?;
        self.concerns.write_to(w, 2)?;
        let mut tracks: Vec<&ConcernedTrack> =
            self.tracks.iter().filter(|t| t.is_concerned()).collect();
        tracks.sort_by(|a, b| a.name.cmp(&b.name).then(a.number.cmp(&b.number)));
        for track in tracks {
            track.write_to(w)?;
        }
        Ok(())
    }
}

/// An artist, its concerns, and its wrapped albums.
#[derive(Clone, Debug)]
pub struct ConcernedArtist {
    name: String,
    concerns: Concerns,
    albums: Vec<ConcernedAlbum>,
}

impl ConcernedArtist {
    pub fn new(artist: &Artist) -> Self {
        Self {
            name: artist.name().to_string(),
            concerns: Concerns::default(),
            albums: artist.albums().iter().map(ConcernedAlbum::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, concern_type: ConcernType, text: impl Into<String>) {
        self.concerns.add(concern_type, text);
    }

    pub fn albums_mut(&mut self) -> &mut [ConcernedAlbum] {
        &mut self.albums
    }

    pub fn is_concerned(&self) -> bool {
        self.concerns.is_concerned() || self.albums.iter().any(ConcernedAlbum::is_concerned)
    }

    fn absorb(&mut self, other: ConcernedArtist) {
        self.concerns.extend(other.concerns);
        for album in other.albums {
            match self.albums.iter_mut().find(|a| a.name == album.name) {
                Some(existing) => existing.absorb(album),
                None => self.albums.push(album),
            }
        }
    }

    pub fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        if !self.is_concerned() {
            return Ok(());
        }
        writeln!(w, "Artist {:?}", self.name)?;
        self.concerns.write_to(w, 0)?;
        let mut albums: Vec<&ConcernedAlbum> =
            self.albums.iter().filter(|a| a.is_concerned()).collect();
        albums.sort_by(|a, b| a.name.cmp(&b.name));
        for album in albums {
            album.write_to(w)?;
        }
        Ok(())
    }
}

/// Wrap a loaded tree in concern-free wrappers, preserving tree order so
/// analyses can walk source and wrappers in lockstep.
pub fn wrap(artists: &[Artist]) -> Vec<ConcernedArtist> {
    artists.iter().map(ConcernedArtist::new).collect()
}

/// Merge per-analysis forests into one, keyed by artist name, then album
/// name, then track name and number.
pub fn merge_forests(forests: Vec<Vec<ConcernedArtist>>) -> Vec<ConcernedArtist> {
    let mut by_name: BTreeMap<String, ConcernedArtist> = BTreeMap::new();
    for forest in forests {
        for artist in forest {
            match by_name.entry(artist.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(artist);
                }
                Entry::Occupied(mut slot) => slot.get_mut().absorb(artist),
            }
        }
    }
    by_name.into_values().collect()
}

/// Render the whole report, artists in name order, skipping concern-free
/// subtrees entirely.
pub fn write_report(artists: &[ConcernedArtist], w: &mut dyn Write) -> io::Result<()> {
    let mut sorted: Vec<&ConcernedArtist> =
        artists.iter().filter(|a| a.is_concerned()).collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for artist in sorted {
        artist.write_to(w)?;
    }
    Ok(())
}
