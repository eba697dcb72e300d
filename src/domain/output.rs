//! Per-video output file names.
//!
//! Segment patterns and rendition playlist names both come from
//! [`rendition_file`], so the files the encoder writes and the names the
//! playlists reference cannot disagree.

use super::ladder::RenditionLadder;

pub const SEGMENT_NUMBERING: &str = "_%03d";
pub const SEGMENT_EXTENSION: &str = "ts";
pub const PLAYLIST_EXTENSION: &str = "m3u8";

/// The two files a rendition owns, named relative to the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionFile {
    /// `<label>_%03d.ts`
    Segments,
    /// `<label>.m3u8`
    Playlist,
}

pub fn rendition_file(label: &str, kind: RenditionFile) -> String {
    match kind {
        RenditionFile::Segments => format!("{}{}.{}", label, SEGMENT_NUMBERING, SEGMENT_EXTENSION),
        RenditionFile::Playlist => format!("{}.{}", label, PLAYLIST_EXTENSION),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionOutput {
    pub label: String,
    pub segment_pattern: String,
    pub playlist_path: String,
}

/// Output locations for every rendition of one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSet {
    pub root: String,
    pub renditions: Vec<RenditionOutput>,
}

impl OutputSet {
    pub fn new(root: &str, ladder: &RenditionLadder) -> Self {
        let renditions = ladder
            .iter()
            .map(|r| RenditionOutput {
                label: r.label.clone(),
                segment_pattern: format!(
                    "{}/{}",
                    root,
                    rendition_file(&r.label, RenditionFile::Segments)
                ),
                playlist_path: format!(
                    "{}/{}",
                    root,
                    rendition_file(&r.label, RenditionFile::Playlist)
                ),
            })
            .collect();

        Self {
            root: root.to_string(),
            renditions,
        }
    }
}
