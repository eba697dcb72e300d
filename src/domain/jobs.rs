use serde::Serialize;

/// What happened to one video during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VideoOutcome {
    /// Encoded and master playlist written.
    Processed { video: String, master: String },
    /// Dry run: planned but not encoded.
    Planned { video: String, command: String },
    Failed { video: String, error: String },
    /// Not attempted because the run was cancelled first.
    Skipped { video: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<VideoOutcome>,
}

impl RunSummary {
    pub fn push(&mut self, outcome: VideoOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn processed(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            VideoOutcome::Processed { video, .. } => Some(video.as_str()),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            VideoOutcome::Failed { video, error } => Some((video.as_str(), error.as_str())),
            _ => None,
        })
    }

    pub fn count_planned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VideoOutcome::Planned { .. }))
            .count()
    }

    pub fn count_skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VideoOutcome::Skipped { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}
