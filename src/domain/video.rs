//! Video descriptors and the path rules derived from them.

use super::hls::UriStyle;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::str::FromStr;

pub const DEFAULT_FILE_TYPE: &str = "mkv";

/// Playlist names that say nothing about which video they belong to.
const GENERIC_STEMS: [&str; 3] = ["index", "master", "playlist"];

/// Which configured source directory a local resource lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    #[default]
    Vods,
    Mixes,
}

/// Base directories used when a descriptor leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDefaults {
    pub source_dir: String,
    pub mixes_dir: String,
    pub output_dir: String,
}

/// A descriptor as written in the job file, before defaults are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawDescriptor {
    pub resource: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source_directory: Option<String>,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub collection: Option<Collection>,
}

/// One video to process. Defaults are resolved once in [`VideoDescriptor::from_raw`]
/// and the value is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    id: String,
    resource: String,
    source_directory: String,
    output_directory: String,
    remote: bool,
    file_type: String,
}

impl VideoDescriptor {
    pub fn from_raw(raw: RawDescriptor, defaults: &DirectoryDefaults) -> Result<Self, String> {
        let trimmed = raw.resource.trim();
        if trimmed.is_empty() {
            return Err("`resource` must not be empty".to_string());
        }
        // Remote URLs go to the encoder exactly as written.
        let resource = if raw.remote {
            raw.resource.clone()
        } else {
            trimmed.to_string()
        };
        if !raw.remote && !is_plain_name(&resource) {
            return Err(format!(
                "local resource '{}' must be a file name stem, not a path",
                resource
            ));
        }

        let file_type = raw
            .file_type
            .as_deref()
            .map(|t| t.trim().trim_start_matches('.'))
            .unwrap_or(DEFAULT_FILE_TYPE)
            .to_string();
        if file_type.is_empty() || !is_plain_name(&file_type) {
            return Err(format!("invalid `fileType` '{}'", file_type));
        }

        let id = match raw.name {
            Some(name) => {
                let name = name.trim().to_string();
                if !is_plain_name(&name) {
                    return Err(format!("`name` '{}' must be a plain directory name", name));
                }
                name
            }
            None if raw.remote => remote_id(resource.trim())
                .ok_or_else(|| format!("cannot derive a name from '{}'; set `name`", resource))?,
            None => resource.clone(),
        };

        let source_directory = raw.source_directory.unwrap_or_else(|| {
            match raw.collection.unwrap_or_default() {
                Collection::Vods => defaults.source_dir.clone(),
                Collection::Mixes => defaults.mixes_dir.clone(),
            }
        });

        Ok(Self {
            id,
            resource,
            source_directory,
            output_directory: raw
                .output_directory
                .unwrap_or_else(|| defaults.output_dir.clone()),
            remote: raw.remote,
            file_type,
        })
    }

    /// Identifier used in logs, in nested output directories and in playlist URIs.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn source_directory(&self) -> &str {
        &self.source_directory
    }

    pub fn output_directory(&self) -> &str {
        &self.output_directory
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }
}

fn is_plain_name(value: &str) -> bool {
    if value.is_empty() || value.contains('/') || value.contains('\\') {
        return false;
    }
    Path::new(value)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// Last meaningful path segment of a URL, without its extension.
fn remote_id(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => without_query,
    };

    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let last = segments.next()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => last,
    };

    let candidate = if GENERIC_STEMS.contains(&stem.to_ascii_lowercase().as_str()) {
        segments.next()?
    } else {
        stem
    };
    is_plain_name(candidate).then(|| candidate.to_string())
}

/// Where per-video output lands under `outputDirectory`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// `outputDirectory/<id>/...`
    #[default]
    Nested,
    /// `outputDirectory/...`
    Flat,
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(Layout::Nested),
            "flat" => Ok(Layout::Flat),
            _ => Err(ConfigError::UnknownVariant {
                kind: "layout",
                value: s.to_string(),
                expected: "nested, flat",
            }),
        }
    }
}

/// Where the master playlist is written relative to the rendition playlists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MasterPlacement {
    /// `<outputRoot>/index.m3u8`, next to the rendition playlists.
    #[default]
    Root,
    /// `<outputDirectory>/<id>.m3u8`, one level above a nested output root.
    Parent,
}

impl FromStr for MasterPlacement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(MasterPlacement::Root),
            "parent" => Ok(MasterPlacement::Parent),
            _ => Err(ConfigError::UnknownVariant {
                kind: "master placement",
                value: s.to_string(),
                expected: "root, parent",
            }),
        }
    }
}

pub const MASTER_PLAYLIST: &str = "index.m3u8";

/// Pure string composition of input and output locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathResolver {
    layout: Layout,
    master: MasterPlacement,
}

impl PathResolver {
    pub fn new(layout: Layout, master: MasterPlacement) -> Result<Self, ConfigError> {
        if layout == Layout::Flat && master == MasterPlacement::Parent {
            return Err(ConfigError::Conflict(
                "master placement 'parent' requires the nested layout".to_string(),
            ));
        }
        Ok(Self { layout, master })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn input_resource(&self, video: &VideoDescriptor) -> String {
        if video.remote {
            video.resource.clone()
        } else {
            format!(
                "{}/{}.{}",
                video.source_directory, video.resource, video.file_type
            )
        }
    }

    pub fn output_root(&self, video: &VideoDescriptor) -> String {
        match self.layout {
            Layout::Nested => format!("{}/{}", video.output_directory, video.id),
            Layout::Flat => video.output_directory.clone(),
        }
    }

    pub fn master_path(&self, video: &VideoDescriptor) -> String {
        match self.master {
            MasterPlacement::Root => format!("{}/{}", self.output_root(video), MASTER_PLAYLIST),
            MasterPlacement::Parent => format!("{}/{}.m3u8", video.output_directory, video.id),
        }
    }

    /// How the master playlist at [`master_path`](Self::master_path) reaches
    /// the rendition playlists.
    pub fn uri_style(&self, video: &VideoDescriptor) -> UriStyle {
        match self.master {
            MasterPlacement::Root => UriStyle::Sibling,
            MasterPlacement::Parent => UriStyle::Subdirectory(video.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> DirectoryDefaults {
        DirectoryDefaults {
            source_dir: "/vods/to-be-processed".to_string(),
            mixes_dir: "/mixes".to_string(),
            output_dir: "/vods/processed".to_string(),
        }
    }

    fn local(resource: &str) -> VideoDescriptor {
        VideoDescriptor::from_raw(
            RawDescriptor {
                resource: resource.to_string(),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap()
    }

    fn remote(url: &str) -> VideoDescriptor {
        VideoDescriptor::from_raw(
            RawDescriptor {
                resource: url.to_string(),
                remote: true,
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap()
    }

    #[test]
    fn local_input_joins_directory_stem_and_extension() {
        let video = local("2024-09-06_11-35-17");
        let resolver = PathResolver::default();
        let first = resolver.input_resource(&video);
        assert_eq!(first, "/vods/to-be-processed/2024-09-06_11-35-17.mkv");
        assert_eq!(resolver.input_resource(&video), first);
    }

    #[test]
    fn remote_input_is_used_verbatim() {
        let url = "https://cdn.seaside.fm/seasidefm/vod/2024-08-31_16-35-05/index.m3u8";
        let video = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: url.to_string(),
                remote: true,
                source_directory: Some("/ignored".to_string()),
                file_type: Some("mp4".to_string()),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap();
        assert_eq!(PathResolver::default().input_resource(&video), url);
    }

    #[test]
    fn remote_resource_keeps_surrounding_whitespace() {
        let url = " https://cdn.seaside.fm/seasidefm/vod/2024-08-31_16-35-05/index.m3u8\n";
        let video = remote(url);
        assert_eq!(video.resource(), url);
        assert_eq!(PathResolver::default().input_resource(&video), url);
        assert_eq!(video.id(), "2024-08-31_16-35-05");

        let blank = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: "  \t".to_string(),
                remote: true,
                ..Default::default()
            },
            &defaults(),
        );
        assert!(blank.is_err());
    }

    #[test]
    fn local_resource_is_trimmed() {
        let video = local("  2024-09-06_11-35-17 ");
        assert_eq!(video.resource(), "2024-09-06_11-35-17");
        assert_eq!(video.id(), "2024-09-06_11-35-17");
    }

    #[test]
    fn defaults_apply_only_when_fields_are_missing() {
        let video = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: "set".to_string(),
                source_directory: Some("/custom".to_string()),
                output_directory: Some("/out".to_string()),
                file_type: Some(".mp4".to_string()),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap();
        assert_eq!(video.source_directory(), "/custom");
        assert_eq!(video.output_directory(), "/out");
        assert_eq!(video.file_type(), "mp4");
        assert!(!video.is_remote());
    }

    #[test]
    fn mixes_collection_uses_mixes_directory() {
        let video = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: "summer-mix".to_string(),
                collection: Some(Collection::Mixes),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap();
        assert_eq!(
            PathResolver::default().input_resource(&video),
            "/mixes/summer-mix.mkv"
        );
    }

    #[test]
    fn output_root_follows_layout() {
        let video = local("a");
        let nested = PathResolver::new(Layout::Nested, MasterPlacement::Root).unwrap();
        let flat = PathResolver::new(Layout::Flat, MasterPlacement::Root).unwrap();
        assert_eq!(nested.output_root(&video), "/vods/processed/a");
        assert_eq!(flat.output_root(&video), "/vods/processed");
        assert_eq!(nested.master_path(&video), "/vods/processed/a/index.m3u8");
        assert_eq!(flat.master_path(&video), "/vods/processed/index.m3u8");
    }

    #[test]
    fn parent_master_sits_beside_the_video_directory() {
        let video = local("a");
        let resolver = PathResolver::new(Layout::Nested, MasterPlacement::Parent).unwrap();
        assert_eq!(resolver.master_path(&video), "/vods/processed/a.m3u8");
        assert_eq!(
            resolver.uri_style(&video),
            UriStyle::Subdirectory("a".to_string())
        );
        assert!(PathResolver::new(Layout::Flat, MasterPlacement::Parent).is_err());
    }

    #[test]
    fn remote_id_skips_generic_playlist_names() {
        let video = remote("https://cdn.seaside.fm/seasidefm/vod/2024-08-31_16-35-05/index.m3u8");
        assert_eq!(video.id(), "2024-08-31_16-35-05");
        assert_eq!(remote("https://host/media/talk.mp4?token=x").id(), "talk");
    }

    #[test]
    fn remote_without_derivable_name_is_rejected() {
        let err = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: "https://host/".to_string(),
                remote: true,
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap_err();
        assert!(err.contains("set `name`"));
    }

    #[test]
    fn local_resource_cannot_escape_source_directory() {
        for bad in ["../secret", "dir/file", ".."] {
            let result = VideoDescriptor::from_raw(
                RawDescriptor {
                    resource: bad.to_string(),
                    ..Default::default()
                },
                &defaults(),
            );
            assert!(result.is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn explicit_name_overrides_derived_id() {
        let video = VideoDescriptor::from_raw(
            RawDescriptor {
                resource: "raw-upload".to_string(),
                name: Some("episode-1".to_string()),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap();
        assert_eq!(
            PathResolver::default().output_root(&video),
            "/vods/processed/episode-1"
        );
    }
}
