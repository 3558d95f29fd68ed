use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LivenessState, RunBadge, RunRecord, RunStatus};

/// Idle time below which a running run counts as actively running.
pub const QUIET_THRESHOLD_MS: u64 = 120_000;
/// Idle time at or above which a running run counts as stalled.
pub const STALLED_THRESHOLD_MS: u64 = 600_000;

/// Idle-time boundaries used to classify running runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessThresholds {
    pub quiet_ms: u64,
    pub stalled_ms: u64,
}

impl Default for LivenessThresholds {
    fn default() -> Self {
        Self {
            quiet_ms: QUIET_THRESHOLD_MS,
            stalled_ms: STALLED_THRESHOLD_MS,
        }
    }
}

impl LivenessThresholds {
    /// The stalled boundary never sits below the quiet boundary.
    pub fn new(quiet_ms: u64, stalled_ms: u64) -> Self {
        Self {
            quiet_ms,
            stalled_ms: stalled_ms.max(quiet_ms),
        }
    }

    pub fn classify(&self, run: &RunRecord, reference: DateTime<Utc>) -> LivenessState {
        if !run.status.is_running() {
            return LivenessState::Dead;
        }
        let idle_ms = (reference - run.heartbeat_or(reference)).num_milliseconds();
        if idle_ms < as_signed(self.quiet_ms) {
            LivenessState::Running
        } else if idle_ms < as_signed(self.stalled_ms) {
            LivenessState::Quiet
        } else {
            LivenessState::Stalled
        }
    }

    pub fn badge(&self, run: &RunRecord, reference: DateTime<Utc>) -> RunBadge {
        match run.status {
            RunStatus::Running => match self.classify(run, reference) {
                LivenessState::Running => RunBadge::Running,
                LivenessState::Quiet => RunBadge::Quiet,
                LivenessState::Stalled | LivenessState::Dead => RunBadge::Stalled,
            },
            RunStatus::Completed => RunBadge::Done,
            RunStatus::Failed => RunBadge::Failed,
            RunStatus::TimedOut => RunBadge::Timeout,
            RunStatus::Unknown => RunBadge::Unknown,
        }
    }
}

fn as_signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

/// Classifies `run` against `reference` with the default thresholds.
pub fn classify(run: &RunRecord, reference: DateTime<Utc>) -> LivenessState {
    LivenessThresholds::default().classify(run, reference)
}

pub fn classify_now(run: &RunRecord) -> LivenessState {
    classify(run, Utc::now())
}

pub fn run_badge(run: &RunRecord, reference: DateTime<Utc>) -> RunBadge {
    LivenessThresholds::default().badge(run, reference)
}
