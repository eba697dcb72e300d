//! Configuration: environment defaults and the job file.
//!
//! Precedence for every setting is CLI flag, then job file, then
//! environment, then the literal default.

use crate::domain::ladder::{Profile, RenditionLadder};
use crate::domain::video::{
    DirectoryDefaults, Layout, MasterPlacement, PathResolver, RawDescriptor, VideoDescriptor,
};
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SOURCE_DIR: &str = "./vods/to-be-processed";
pub const DEFAULT_MIXES_DIR: &str = "./mixes";
pub const DEFAULT_OUTPUT_DIR: &str = "./vods/processed";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    pub dirs: DirectoryDefaults,
    /// Dry run: plan and log, never invoke the encoder.
    pub debug: bool,
    pub profile: Profile,
    pub layout: Layout,
    pub master: MasterPlacement,
    pub ffmpeg_path: PathBuf,
    pub encode_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            dirs: DirectoryDefaults {
                source_dir: DEFAULT_SOURCE_DIR.to_string(),
                mixes_dir: DEFAULT_MIXES_DIR.to_string(),
                output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            },
            debug: false,
            profile: Profile::default(),
            layout: Layout::default(),
            master: MasterPlacement::default(),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG),
            encode_timeout: None,
        }
    }
}

impl BatchConfig {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            dirs: DirectoryDefaults {
                source_dir: get("SOURCE_DIR").unwrap_or(defaults.dirs.source_dir),
                mixes_dir: get("MIXES_DIR").unwrap_or(defaults.dirs.mixes_dir),
                output_dir: get("OUTPUT_DIR").unwrap_or(defaults.dirs.output_dir),
            },
            debug: match get("DEBUG") {
                Some(raw) => parse_flag("DEBUG", &raw)?,
                None => false,
            },
            profile: parse_env("HLS_PROFILE", get("HLS_PROFILE"))?.unwrap_or(defaults.profile),
            layout: parse_env("HLS_LAYOUT", get("HLS_LAYOUT"))?.unwrap_or(defaults.layout),
            master: parse_env("HLS_MASTER", get("HLS_MASTER"))?.unwrap_or(defaults.master),
            ffmpeg_path: get("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            encode_timeout: match get("ENCODE_TIMEOUT_SECS") {
                Some(raw) => Some(parse_timeout("ENCODE_TIMEOUT_SECS", &raw)?),
                None => None,
            },
        })
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            var,
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

fn parse_env<T>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = ConfigError>,
{
    raw.map(|value| {
        value.parse().map_err(|e: ConfigError| ConfigError::Env {
            var,
            reason: e.to_string(),
        })
    })
    .transpose()
}

pub fn parse_timeout(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Env {
            var,
            reason: format!("'{}' is not a positive number of seconds", raw),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// Contents of a job file before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct JobFile {
    pub profile: Option<Profile>,
    pub layout: Option<Layout>,
    pub master: Option<MasterPlacement>,
    pub videos: Vec<RawDescriptor>,
}

const JOB_FILE_KEYS: [&str; 4] = ["profile", "layout", "master", "videos"];

impl JobFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Accepts either a bare array of descriptors or an object with a
    /// `videos` array plus optional `profile`, `layout` and `master`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(content)? {
            Value::Array(items) => Ok(Self {
                videos: parse_descriptors(items)?,
                ..Default::default()
            }),
            Value::Object(mut map) => {
                if let Some(key) = map.keys().find(|k| !JOB_FILE_KEYS.contains(&k.as_str())) {
                    return Err(ConfigError::Shape(format!("unknown key `{}`", key)));
                }
                let videos = match map.remove("videos") {
                    Some(Value::Array(items)) => parse_descriptors(items)?,
                    Some(_) => return Err(ConfigError::Shape("`videos` must be an array".into())),
                    None => return Err(ConfigError::Shape("missing `videos` array".into())),
                };
                Ok(Self {
                    profile: take_setting(&mut map, "profile")?,
                    layout: take_setting(&mut map, "layout")?,
                    master: take_setting(&mut map, "master")?,
                    videos,
                })
            }
            _ => Err(ConfigError::Shape(
                "expected an array of videos or an object with `videos`".into(),
            )),
        }
    }
}

fn parse_descriptors(items: Vec<Value>) -> Result<Vec<RawDescriptor>, ConfigError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| ConfigError::Invalid {
                index: i + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn take_setting<T>(map: &mut Map<String, Value>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = ConfigError>,
{
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(other) => Err(ConfigError::Shape(format!(
            "`{}` must be a string, found {}",
            key, other
        ))),
    }
}

/// Settings given on the command line; `None` defers to the job file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<Profile>,
    pub layout: Option<Layout>,
    pub master: Option<MasterPlacement>,
    pub dry_run: bool,
}

/// Everything a run needs, fully validated.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub videos: Vec<VideoDescriptor>,
    pub profile: Profile,
    pub ladder: RenditionLadder,
    pub resolver: PathResolver,
    pub dry_run: bool,
}

impl RunSettings {
    pub fn resolve(
        config: &BatchConfig,
        job: JobFile,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let profile = overrides.profile.or(job.profile).unwrap_or(config.profile);
        let layout = overrides.layout.or(job.layout).unwrap_or(config.layout);
        let master = overrides.master.or(job.master).unwrap_or(config.master);
        let resolver = PathResolver::new(layout, master)?;

        let videos = job
            .videos
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                VideoDescriptor::from_raw(raw, &config.dirs).map_err(|reason| {
                    ConfigError::Invalid {
                        index: i + 1,
                        reason,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Two videos writing to the same root would overwrite each other's segments.
        let mut roots: HashMap<PathBuf, usize> = HashMap::new();
        for (i, video) in videos.iter().enumerate() {
            if let Some(first) = roots.insert(normalize_root(&resolver.output_root(video)), i + 1) {
                return Err(ConfigError::Invalid {
                    index: i + 1,
                    reason: format!(
                        "output root {} is already used by video #{}",
                        resolver.output_root(video),
                        first
                    ),
                });
            }
        }

        Ok(Self {
            videos,
            profile,
            ladder: profile.ladder(),
            resolver,
            dry_run: overrides.dry_run || config.debug,
        })
    }
}

/// Lexical form of an output root: `.` components and repeated or
/// trailing separators do not make two roots distinct.
fn normalize_root(root: &str) -> PathBuf {
    Path::new(root)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
