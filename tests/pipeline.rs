use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use vodladder::adapters::local::FsAdapter;
use vodladder::domain::command::EncodePlan;
use vodladder::ports::encoder::{EncodeOutput, Encoder};
use vodladder::{
    BatchConfig, EncoderError, JobFile, JobRunner, Layout, Overrides, RunSettings,
};

/// Stands in for ffmpeg: writes one segment and one playlist per output
/// group, and fails any input whose path contains "broken".
#[derive(Default)]
struct ScriptedEncoder {
    inputs: Mutex<Vec<String>>,
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    async fn encode(
        &self,
        plan: &EncodePlan,
        _cancel: &CancellationToken,
    ) -> Result<EncodeOutput, EncoderError> {
        self.inputs.lock().unwrap().push(plan.input.clone());
        if plan.input.contains("broken") {
            return Ok(EncodeOutput {
                success: false,
                exit_code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
                ..Default::default()
            });
        }

        for group in &plan.outputs {
            let pattern = group.value_of("-hls_segment_filename").unwrap();
            let segment = pattern.replace("%03d", "000");
            tokio::fs::write(&segment, b"ts").await?;
            let name = Path::new(&segment).file_name().unwrap().to_string_lossy();
            tokio::fs::write(
                &group.playlist_path,
                format!("#EXTM3U\n#EXTINF:6.0,\n{}\n#EXT-X-ENDLIST\n", name),
            )
            .await?;
        }
        Ok(EncodeOutput {
            success: true,
            exit_code: Some(0),
            ..Default::default()
        })
    }
}

fn config_for(root: &Path) -> BatchConfig {
    let mut config = BatchConfig::default();
    config.dirs.source_dir = root.join("in").to_string_lossy().into_owned();
    config.dirs.output_dir = root.join("out").to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn failed_video_does_not_block_the_next_one() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let job = JobFile::parse(r#"[{"resource": "broken"}, {"resource": "2024-09-06_11-35-17"}]"#)
        .unwrap();
    let settings = RunSettings::resolve(&config, job, &Overrides::default()).unwrap();

    let encoder = ScriptedEncoder::default();
    let runner = JobRunner::from_settings(encoder, FsAdapter::new(), &settings);
    let summary = runner.run(&settings.videos, &CancellationToken::new()).await;

    assert_eq!(summary.failed().count(), 1);
    assert_eq!(
        summary.processed().collect::<Vec<_>>(),
        vec!["2024-09-06_11-35-17"]
    );

    let out = dir.path().join("out");
    assert!(!out.join("broken").join("index.m3u8").exists());

    let video_dir = out.join("2024-09-06_11-35-17");
    let master = std::fs::read_to_string(video_dir.join("index.m3u8")).unwrap();
    for line in master.lines().filter(|l| !l.starts_with('#')) {
        assert!(video_dir.join(line).exists(), "{} missing", line);
    }
    assert!(video_dir.join("720p_000.ts").exists());
    assert!(video_dir.join("audio_000.ts").exists());
}

#[tokio::test]
async fn rerun_overwrites_master_with_identical_bytes() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let job = || JobFile::parse(r#"{"profile": "lean", "videos": [{"resource": "a"}]}"#).unwrap();

    let settings = RunSettings::resolve(&config, job(), &Overrides::default()).unwrap();
    let runner = JobRunner::from_settings(ScriptedEncoder::default(), FsAdapter::new(), &settings);

    runner.run(&settings.videos, &CancellationToken::new()).await;
    let master_path = dir.path().join("out").join("a").join("index.m3u8");
    let first = std::fs::read(&master_path).unwrap();

    runner.run(&settings.videos, &CancellationToken::new()).await;
    let second = std::fs::read(&master_path).unwrap();

    assert_eq!(first, second);
    assert!(String::from_utf8(second).unwrap().contains("480p.m3u8"));
}

#[tokio::test]
async fn flat_layout_writes_straight_into_output_directory() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let overrides = Overrides {
        layout: Some(Layout::Flat),
        ..Default::default()
    };
    let job = JobFile::parse(r#"[{"resource": "a"}]"#).unwrap();
    let settings = RunSettings::resolve(&config, job, &overrides).unwrap();
    let runner = JobRunner::from_settings(ScriptedEncoder::default(), FsAdapter::new(), &settings);

    let summary = runner.run(&settings.videos, &CancellationToken::new()).await;
    assert!(!summary.has_failures());

    let out = dir.path().join("out");
    assert!(out.join("index.m3u8").exists());
    assert!(out.join("1080p.m3u8").exists());
}

#[tokio::test]
async fn invalid_job_file_is_rejected_before_any_encode() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let result = JobFile::parse(r#"[{"resource": "a"}, {"remote": true}]"#)
        .and_then(|job| RunSettings::resolve(&config, job, &Overrides::default()));
    assert!(result.is_err());
    assert!(!dir.path().join("out").exists());
}
