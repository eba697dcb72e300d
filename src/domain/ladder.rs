//! Rendition ladders: the fixed set of outputs produced for every video.

use crate::error::ConfigError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What a rendition carries besides audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Video {
        resolution: Resolution,
        bitrate_kbps: u32,
    },
    AudioOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub label: String,
    pub track: Track,
    pub audio_bitrate_kbps: u32,
    /// Peak bits/sec advertised in the master playlist `BANDWIDTH` attribute.
    pub bandwidth: u64,
}

impl Rendition {
    pub fn video(
        label: &str,
        resolution: Resolution,
        video_kbps: u32,
        audio_kbps: u32,
        bandwidth: u64,
    ) -> Self {
        Self {
            label: label.to_string(),
            track: Track::Video {
                resolution,
                bitrate_kbps: video_kbps,
            },
            audio_bitrate_kbps: audio_kbps,
            bandwidth,
        }
    }

    pub fn audio(label: &str, audio_kbps: u32, bandwidth: u64) -> Self {
        Self {
            label: label.to_string(),
            track: Track::AudioOnly,
            audio_bitrate_kbps: audio_kbps,
            bandwidth,
        }
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self.track, Track::AudioOnly)
    }

    pub fn video_bitrate_kbps(&self) -> Option<u32> {
        match self.track {
            Track::Video { bitrate_kbps, .. } => Some(bitrate_kbps),
            Track::AudioOnly => None,
        }
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match self.track {
            Track::Video { resolution, .. } => Some(resolution),
            Track::AudioOnly => None,
        }
    }

    /// Sum of the declared bitrates in bits/sec.
    pub fn declared_bitrate(&self) -> u64 {
        let kbps = self.video_bitrate_kbps().unwrap_or(0) as u64 + self.audio_bitrate_kbps as u64;
        kbps * 1000
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LadderError {
    #[error("ladder has no renditions")]
    Empty,
    #[error("duplicate rendition label '{0}'")]
    DuplicateLabel(String),
    #[error("rendition label '{0}' is not a plain file name token")]
    BadLabel(String),
    #[error("video renditions must be ordered by descending bandwidth ('{0}' is out of order)")]
    Unordered(String),
    #[error("ladder must end with exactly one audio-only rendition")]
    AudioNotLast,
    #[error("rendition '{label}' advertises {bandwidth} b/s but declares {declared} b/s")]
    UnderEstimated {
        label: String,
        bandwidth: u64,
        declared: u64,
    },
}

/// An ordered, validated list of renditions.
///
/// Video renditions come first, highest bandwidth first; the single
/// audio-only rendition is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionLadder {
    renditions: Vec<Rendition>,
}

impl RenditionLadder {
    pub fn new(renditions: Vec<Rendition>) -> Result<Self, LadderError> {
        let ladder = Self { renditions };
        ladder.validate()?;
        Ok(ladder)
    }

    pub fn validate(&self) -> Result<(), LadderError> {
        let (audio, video) = match self.renditions.split_last() {
            Some(split) => split,
            None => return Err(LadderError::Empty),
        };
        if !audio.is_audio_only() || video.iter().any(Rendition::is_audio_only) {
            return Err(LadderError::AudioNotLast);
        }

        let mut seen = HashSet::new();
        for rendition in &self.renditions {
            if !is_label_token(&rendition.label) {
                return Err(LadderError::BadLabel(rendition.label.clone()));
            }
            if !seen.insert(rendition.label.as_str()) {
                return Err(LadderError::DuplicateLabel(rendition.label.clone()));
            }
            let declared = rendition.declared_bitrate();
            if rendition.bandwidth < declared {
                return Err(LadderError::UnderEstimated {
                    label: rendition.label.clone(),
                    bandwidth: rendition.bandwidth,
                    declared,
                });
            }
        }

        for pair in video.windows(2) {
            if pair[1].bandwidth > pair[0].bandwidth {
                return Err(LadderError::Unordered(pair[1].label.clone()));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rendition> {
        self.renditions.iter()
    }
}

fn is_label_token(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Named quality profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    /// 1080p, 720p and audio.
    #[default]
    Full,
    /// 1080p, 480p and audio.
    Lean,
}

const AUDIO_KBPS: u32 = 128;

impl Profile {
    pub const NAMES: &'static str = "full, lean";

    pub fn ladder(self) -> RenditionLadder {
        let full_hd = Rendition::video("1080p", Resolution::new(1920, 1080), 3000, AUDIO_KBPS, 4_000_000);
        let audio = Rendition::audio("audio", AUDIO_KBPS, 128_000);
        let middle = match self {
            Profile::Full => {
                Rendition::video("720p", Resolution::new(1280, 720), 1000, AUDIO_KBPS, 1_500_000)
            }
            Profile::Lean => {
                Rendition::video("480p", Resolution::new(854, 480), 600, AUDIO_KBPS, 800_000)
            }
        };
        RenditionLadder {
            renditions: vec![full_hd, middle, audio],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Full => "full",
            Profile::Lean => "lean",
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Profile::Full),
            "lean" => Ok(Profile::Lean),
            _ => Err(ConfigError::UnknownVariant {
                kind: "profile",
                value: s.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}
