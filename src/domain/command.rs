//! Encoder parameter planning.
//!
//! One plan decodes the input once and fans out to every rendition. The
//! plan stays structured until [`EncodePlan::to_args`] flattens it for the
//! process call.

use super::ladder::{RenditionLadder, Track};
use super::output::OutputSet;
use std::fmt;

pub const SEGMENT_SECONDS: u32 = 6;
pub const PLAYLIST_TYPE: &str = "vod";
pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeArg {
    pub flag: &'static str,
    pub value: Option<String>,
}

impl EncodeArg {
    fn pair(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: Some(value.into()),
        }
    }

    fn switch(flag: &'static str) -> Self {
        Self { flag, value: None }
    }
}

/// Options for one output file, followed by that output's playlist path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGroup {
    pub label: String,
    pub args: Vec<EncodeArg>,
    pub playlist_path: String,
}

impl OutputGroup {
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.flag == flag)
            .and_then(|a| a.value.as_deref())
    }

    pub fn has(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a.flag == flag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePlan {
    pub global: Vec<EncodeArg>,
    pub input: String,
    pub outputs: Vec<OutputGroup>,
}

impl EncodePlan {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_args(&mut args, &self.global);
        args.push("-i".to_string());
        args.push(self.input.clone());
        for group in &self.outputs {
            push_args(&mut args, &group.args);
            args.push(group.playlist_path.clone());
        }
        args
    }
}

fn push_args(out: &mut Vec<String>, args: &[EncodeArg]) {
    for arg in args {
        out.push(arg.flag.to_string());
        if let Some(value) = &arg.value {
            out.push(value.clone());
        }
    }
}

impl fmt::Display for EncodePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.to_args().iter().map(|a| shell_quote(a)).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:%=+,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Plan a single encoder invocation producing every rendition of `ladder`
/// under `output_root`.
pub fn build_encode_parameters(
    input: &str,
    output_root: &str,
    ladder: &RenditionLadder,
) -> EncodePlan {
    let outputs = OutputSet::new(output_root, ladder);

    let groups = ladder
        .iter()
        .zip(&outputs.renditions)
        .map(|(rendition, files)| {
            let mut args = Vec::with_capacity(16);
            match rendition.track {
                Track::Video {
                    resolution,
                    bitrate_kbps,
                } => {
                    args.push(EncodeArg::pair("-map", "0:v"));
                    args.push(EncodeArg::pair("-map", "0:a"));
                    args.push(EncodeArg::pair("-c:v", VIDEO_CODEC));
                    args.push(EncodeArg::pair("-b:v", kbps(bitrate_kbps)));
                    args.push(EncodeArg::pair("-c:a", AUDIO_CODEC));
                    args.push(EncodeArg::pair("-b:a", kbps(rendition.audio_bitrate_kbps)));
                    args.push(EncodeArg::pair("-s", resolution.to_string()));
                }
                Track::AudioOnly => {
                    args.push(EncodeArg::pair("-map", "0:a"));
                    args.push(EncodeArg::pair("-c:a", AUDIO_CODEC));
                    args.push(EncodeArg::pair("-b:a", kbps(rendition.audio_bitrate_kbps)));
                    args.push(EncodeArg::switch("-vn"));
                }
            }
            args.push(EncodeArg::pair("-f", "hls"));
            args.push(EncodeArg::pair("-hls_time", SEGMENT_SECONDS.to_string()));
            args.push(EncodeArg::pair("-hls_playlist_type", PLAYLIST_TYPE));
            args.push(EncodeArg::pair(
                "-hls_segment_filename",
                files.segment_pattern.clone(),
            ));

            OutputGroup {
                label: rendition.label.clone(),
                args,
                playlist_path: files.playlist_path.clone(),
            }
        })
        .collect();

    EncodePlan {
        // Reruns overwrite earlier segments instead of prompting.
        global: vec![EncodeArg::switch("-y")],
        input: input.to_string(),
        outputs: groups,
    }
}

fn kbps(value: u32) -> String {
    format!("{}k", value)
}
