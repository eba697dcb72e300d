//! Master playlist composition.

use super::ladder::{RenditionLadder, Track};
use super::output::{rendition_file, RenditionFile};
use std::fmt;

pub const AUDIO_GROUP: &str = "audio";

/// How rendition playlist URIs are written relative to the master playlist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UriStyle {
    /// Master sits next to the rendition playlists: `720p.m3u8`.
    #[default]
    Sibling,
    /// Master sits one directory up: `<dir>/720p.m3u8`.
    Subdirectory(String),
}

impl UriStyle {
    fn uri(&self, label: &str) -> String {
        let file = rendition_file(label, RenditionFile::Playlist);
        match self {
            UriStyle::Sibling => file,
            UriStyle::Subdirectory(dir) => format!("{}/{}", dir, file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStream {
    pub bandwidth: u64,
    pub attributes: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPlaylist {
    pub variants: Vec<VariantStream>,
}

impl MasterPlaylist {
    pub fn new(ladder: &RenditionLadder, style: &UriStyle) -> Self {
        let variants = ladder
            .iter()
            .map(|rendition| {
                let attributes = match rendition.track {
                    Track::Video { resolution, .. } => format!("RESOLUTION={}", resolution),
                    Track::AudioOnly => format!("AUDIO=\"{}\"", AUDIO_GROUP),
                };
                VariantStream {
                    bandwidth: rendition.bandwidth,
                    attributes,
                    uri: style.uri(&rendition.label),
                }
            })
            .collect();
        Self { variants }
    }
}

impl fmt::Display for MasterPlaylist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#EXTM3U")?;
        for variant in &self.variants {
            write!(
                f,
                "\n#EXT-X-STREAM-INF:BANDWIDTH={},{}\n{}",
                variant.bandwidth, variant.attributes, variant.uri
            )?;
        }
        Ok(())
    }
}

/// Master playlist text: no leading or trailing blank lines, byte-stable
/// for identical input.
pub fn compose_master(ladder: &RenditionLadder, style: &UriStyle) -> String {
    MasterPlaylist::new(ladder, style).to_string()
}
