//! ID3 tag reading and rewriting.
//!
//! A track file may carry an ID3v1 tag, an ID3v2 tag, both, or neither.
//! Both sources are read independently; the values handed to reconciliation
//! come from ID3v2 when it parsed, otherwise from ID3v1. Read failures are
//! recorded per source as cause strings, not propagated as errors, so one
//! unreadable file never aborts a batch.

use std::path::Path;

use id3::TagLike;

/// Which embedded tag a value or error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagSource {
    Id3v1,
    Id3v2,
}

impl TagSource {
    pub fn name(self) -> &'static str {
        match self {
            TagSource::Id3v1 => "ID3V1",
            TagSource::Id3v2 => "ID3V2",
        }
    }
}

/// Field values parsed from a single tag source.
///
/// Absent string fields are empty; ID3v1 never supplies an MCDI frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagValues {
    pub album: String,
    pub artist: String,
    pub title: String,
    pub genre: String,
    pub year: String,
    pub number: Option<u32>,
    pub cd_identifier: Vec<u8>,
}

/// Everything read from one track file: both tag sources, each either
/// parsed values or the cause of the read failure.
#[derive(Clone, Debug)]
pub struct TrackMetadata {
    v1: Result<TagValues, String>,
    v2: Result<TagValues, String>,
}

impl TrackMetadata {
    /// Read both tag sources from `path`.
    pub fn read(path: &Path) -> TrackMetadata {
        TrackMetadata {
            v1: read_id3v1(path),
            v2: read_id3v2(path),
        }
    }

    /// Assemble metadata from already-parsed sources (used by tests and by
    /// loaders that substitute their own reader).
    pub fn from_sources(
        v1: Result<TagValues, String>,
        v2: Result<TagValues, String>,
    ) -> TrackMetadata {
        TrackMetadata { v1, v2 }
    }

    /// The source whose values are used for reconciliation, ID3v2 first.
    fn preferred(&self) -> Option<&TagValues> {
        self.v2.as_ref().or(self.v1.as_ref()).ok()
    }

    /// True when at least one tag source parsed.
    pub fn is_valid(&self) -> bool {
        self.preferred().is_some()
    }

    pub fn source(&self) -> Option<TagSource> {
        match (&self.v2, &self.v1) {
            (Ok(_), _) => Some(TagSource::Id3v2),
            (_, Ok(_)) => Some(TagSource::Id3v1),
            _ => None,
        }
    }

    pub fn album(&self) -> &str {
        self.preferred().map(|v| v.album.as_str()).unwrap_or_default()
    }

    pub fn artist(&self) -> &str {
        self.preferred().map(|v| v.artist.as_str()).unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.preferred().map(|v| v.title.as_str()).unwrap_or_default()
    }

    pub fn genre(&self) -> &str {
        self.preferred().map(|v| v.genre.as_str()).unwrap_or_default()
    }

    pub fn year(&self) -> &str {
        self.preferred().map(|v| v.year.as_str()).unwrap_or_default()
    }

    pub fn number(&self) -> Option<u32> {
        self.preferred().and_then(|v| v.number)
    }

    pub fn cd_identifier(&self) -> &[u8] {
        self.preferred()
            .map(|v| v.cd_identifier.as_slice())
            .unwrap_or_default()
    }

    /// Read-error causes, one per source that failed to parse.
    pub fn read_errors(&self) -> Vec<(TagSource, &str)> {
        let mut errors = Vec::new();
        if let Err(cause) = &self.v1 {
            errors.push((TagSource::Id3v1, cause.as_str()));
        }
        if let Err(cause) = &self.v2 {
            errors.push((TagSource::Id3v2, cause.as_str()));
        }
        errors
    }

    /// Fields on which the two tag sources disagree, as report-ready
    /// sentences. Only meaningful when both sources parsed.
    pub fn source_conflicts(&self) -> Vec<String> {
        let (Ok(v1), Ok(v2)) = (&self.v1, &self.v2) else {
            return Vec::new();
        };
        let mut conflicts = Vec::new();
        let mut check = |field: &str, a: &str, b: &str| {
            if a != b {
                conflicts.push(format!(
                    "id3v1 and id3v2 metadata disagree on the {field}"
                ));
            }
        };
        check("album name", &v1.album, &v2.album);
        check("artist name", &v1.artist, &v2.artist);
        check("genre", &v1.genre, &v2.genre);
        check("track name", &v1.title, &v2.title);
        check("year", &v1.year, &v2.year);
        if v1.number != v2.number {
            conflicts.push("id3v1 and id3v2 metadata disagree on the track number".to_string());
        }
        conflicts.sort();
        conflicts
    }
}

fn read_id3v2(path: &Path) -> Result<TagValues, String> {
    let tag = id3::Tag::read_from_path(path).map_err(|e| e.to_string())?;
    Ok(TagValues {
        album: tag.album().unwrap_or_default().to_string(),
        artist: tag.artist().unwrap_or_default().to_string(),
        title: tag.title().unwrap_or_default().to_string(),
        genre: tag.genre().unwrap_or_default().to_string(),
        year: year_string(&tag),
        number: tag.track(),
        cd_identifier: mcdi_bytes(&tag),
    })
}

fn read_id3v1(path: &Path) -> Result<TagValues, String> {
    let tag = id3::v1::Tag::read_from_path(path).map_err(|e| e.to_string())?;
    let genre = tag.genre().unwrap_or_default();
    Ok(TagValues {
        album: tag.album.trim().to_string(),
        artist: tag.artist.trim().to_string(),
        title: tag.title.trim().to_string(),
        genre: genre.to_string(),
        year: tag.year.trim().to_string(),
        number: tag.track.map(u32::from),
        cd_identifier: Vec::new(),
    })
}

/// Year as recorded in the tag text; TYER is the classic frame, TDRC its
/// v2.4 replacement.
fn year_string(tag: &id3::Tag) -> String {
    text_frame(tag, "TYER")
        .or_else(|| text_frame(tag, "TDRC"))
        .or_else(|| tag.year().map(|y| y.to_string()))
        .unwrap_or_default()
}

fn text_frame(tag: &id3::Tag, id: &str) -> Option<String> {
    let frame = tag.get(id)?;
    match frame.content() {
        id3::Content::Text(s) => Some(s.clone()),
        _ => None,
    }
}

/// Raw bytes of the MCDI (music CD identifier) frame, if present.
fn mcdi_bytes(tag: &id3::Tag) -> Vec<u8> {
    for frame in tag.frames() {
        if frame.id() != "MCDI" {
            continue;
        }
        if let id3::Content::Unknown(unknown) = frame.content() {
            return unknown.data.clone();
        }
    }
    Vec::new()
}

/// Secondary text frames surfaced by `list --details`, with their
/// human-readable labels.
const DETAIL_FRAMES: [(&str, &str); 6] = [
    ("TCOM", "Composer"),
    ("TEXT", "Lyricist"),
    ("TIT3", "Subtitle"),
    ("TKEY", "Key"),
    ("TPE2", "Orchestra/Band"),
    ("TPE3", "Conductor"),
];

/// Labeled values of the secondary ID3v2 text frames present on a track,
/// in label order.
pub fn track_details(path: &Path) -> Result<Vec<(String, String)>, String> {
    let tag = id3::Tag::read_from_path(path).map_err(|e| e.to_string())?;
    let mut details: Vec<(String, String)> = DETAIL_FRAMES
        .iter()
        .filter_map(|(id, label)| {
            text_frame(&tag, id).map(|value| (label.to_string(), value))
        })
        .collect();
    details.sort();
    Ok(details)
}

/// The values a repair writes back into a track file.
#[derive(Clone, Debug)]
pub struct TagPatch {
    pub album: String,
    pub artist: String,
    pub title: String,
    pub genre: String,
    pub year: String,
    pub number: u32,
    pub cd_identifier: Vec<u8>,
}

/// Rewrite the file's ID3v2 tag with `patch`, preserving unrelated frames.
///
/// Repaired files standardize on ID3v2.4, the same choice Sonora-style
/// writers make when a file's tag version is mixed or missing.
pub fn write_tag_patch(path: &Path, patch: &TagPatch) -> Result<(), id3::Error> {
    let mut tag = id3::Tag::read_from_path(path).unwrap_or_else(|_| id3::Tag::new());
    tag.set_album(patch.album.as_str());
    tag.set_artist(patch.artist.as_str());
    tag.set_title(patch.title.as_str());
    tag.set_track(patch.number);
    if patch.genre.is_empty() {
        tag.remove("TCON");
    } else {
        tag.set_genre(patch.genre.as_str());
    }
    if let Ok(year) = patch.year.parse::<i32>() {
        tag.set_year(year);
    } else if !patch.year.is_empty() {
        tag.set_text("TYER", patch.year.as_str());
    }
    tag.remove("MCDI");
    if !patch.cd_identifier.is_empty() {
        tag.add_frame(id3::Frame::with_content(
            "MCDI",
            id3::Content::Unknown(id3::frame::Unknown {
                version: id3::Version::Id3v24,
                data: patch.cd_identifier.clone(),
            }),
        ));
    }
    tag.write_to_path(path, id3::Version::Id3v24)
}
