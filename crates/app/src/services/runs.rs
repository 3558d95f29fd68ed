use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{AgentFilter, StateFilter, ViewMode, ViewSnapshot};
use crate::services::SharedConfig;
use monitor_core::{LivenessState, LivenessThresholds, RunBadge, RunRecord, format_duration};

/// Run count per liveness state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub running: usize,
    pub quiet: usize,
    pub stalled: usize,
    pub dead: usize,
    pub total: usize,
}

impl StateCounts {
    pub fn get(&self, state: LivenessState) -> usize {
        match state {
            LivenessState::Running => self.running,
            LivenessState::Quiet => self.quiet,
            LivenessState::Stalled => self.stalled,
            LivenessState::Dead => self.dead,
        }
    }

    fn record(&mut self, state: LivenessState) {
        match state {
            LivenessState::Running => self.running += 1,
            LivenessState::Quiet => self.quiet += 1,
            LivenessState::Stalled => self.stalled += 1,
            LivenessState::Dead => self.dead += 1,
        }
        self.total += 1;
    }
}

/// Token totals across the runs currently on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenWindow {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub runs_with_data: usize,
    pub runs: usize,
}

impl TokenWindow {
    pub fn from_runs<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        runs.into_iter().fold(Self::default(), |mut acc, run| {
            acc.input_tokens = acc.input_tokens.saturating_add(run.input_tokens.unwrap_or(0));
            acc.output_tokens = acc
                .output_tokens
                .saturating_add(run.output_tokens.unwrap_or(0));
            acc.total_tokens = acc.total_tokens.saturating_add(run.effective_total_tokens());
            if run.reports_tokens() {
                acc.runs_with_data += 1;
            }
            acc.runs += 1;
            acc
        })
    }
}

/// Presentation row for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunView {
    pub run_id: String,
    pub agent_id: String,
    pub name: String,
    pub model: String,
    pub task: String,
    pub state: LivenessState,
    pub badge: RunBadge,
    pub runtime_ms: u64,
    pub runtime: String,
    pub tokens: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub agent_id: String,
    pub run_count: usize,
    pub badge: RunBadge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub agent_id: String,
    pub runs: Vec<RunView>,
}

/// Everything the monitor page renders for one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOverview {
    pub counts: StateCounts,
    pub tokens: TokenWindow,
    pub agents: Vec<AgentSummary>,
    pub view_mode: ViewMode,
    pub lanes: Vec<Lane>,
}

#[derive(Clone)]
pub struct RunsService {
    config: SharedConfig,
}

impl RunsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn thresholds(&self) -> LivenessThresholds {
        self.config.thresholds()
    }

    pub fn classify(&self, run: &RunRecord, now: DateTime<Utc>) -> LivenessState {
        self.thresholds().classify(run, now)
    }

    pub fn badge(&self, run: &RunRecord, now: DateTime<Utc>) -> RunBadge {
        self.thresholds().badge(run, now)
    }

    pub fn view(&self, run: &RunRecord, now: DateTime<Utc>) -> RunView {
        let runtime_ms = run.elapsed_ms(now);
        RunView {
            run_id: run.run_id.clone(),
            agent_id: run.agent_id.clone(),
            name: run.display_name().to_string(),
            model: run.model.clone(),
            task: run.task.clone(),
            state: self.classify(run, now),
            badge: self.badge(run, now),
            runtime_ms,
            runtime: format_duration(runtime_ms),
            tokens: run.token_label(),
        }
    }

    pub fn filter_runs<'a>(
        &self,
        runs: &'a [RunRecord],
        agent: &AgentFilter,
        state: StateFilter,
        now: DateTime<Utc>,
    ) -> Vec<&'a RunRecord> {
        runs.iter()
            .filter(|run| agent.matches(&run.agent_id))
            .filter(|run| state.matches(self.classify(run, now)))
            .collect()
    }

    pub fn state_counts<'a, I>(&self, runs: I, now: DateTime<Utc>) -> StateCounts
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let mut counts = StateCounts::default();
        for run in runs {
            counts.record(self.classify(run, now));
        }
        counts
    }

    /// Sorted agent ids, each with its run count and first run's badge.
    pub fn agent_summaries(&self, runs: &[RunRecord], now: DateTime<Utc>) -> Vec<AgentSummary> {
        let mut summaries: Vec<AgentSummary> = Vec::new();
        for run in runs {
            match summaries
                .iter_mut()
                .find(|summary| summary.agent_id == run.agent_id)
            {
                Some(summary) => summary.run_count += 1,
                None => summaries.push(AgentSummary {
                    agent_id: run.agent_id.clone(),
                    run_count: 1,
                    badge: self.badge(run, now),
                }),
            }
        }
        summaries.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        summaries
    }

    /// Runs grouped by agent in order of first appearance.
    pub fn lanes<'a, I>(&self, runs: I, now: DateTime<Utc>) -> Vec<Lane>
    where
        I: IntoIterator<Item = &'a RunRecord>,
    {
        let mut lanes: Vec<Lane> = Vec::new();
        for run in runs {
            let view = self.view(run, now);
            match lanes.iter_mut().find(|lane| lane.agent_id == run.agent_id) {
                Some(lane) => lane.runs.push(view),
                None => lanes.push(Lane {
                    agent_id: run.agent_id.clone(),
                    runs: vec![view],
                }),
            }
        }
        lanes
    }

    /// Metric tiles cover the agent selection; lanes also honour the state filter.
    pub fn overview(
        &self,
        runs: &[RunRecord],
        view: &ViewSnapshot,
        now: DateTime<Utc>,
    ) -> RunOverview {
        let selected = self.filter_runs(runs, &view.agent, StateFilter::All, now);
        let counts = self.state_counts(selected.iter().copied(), now);
        let tokens = TokenWindow::from_runs(selected.iter().copied());
        let shown = selected
            .into_iter()
            .filter(|run| view.state.matches(self.classify(run, now)));
        let lanes = match view.view_mode {
            ViewMode::Lanes => self.lanes(shown, now),
            ViewMode::List => vec![Lane {
                agent_id: "all".to_string(),
                runs: shown.map(|run| self.view(run, now)).collect(),
            }],
        };
        debug!(
            runs = runs.len(),
            shown = lanes.iter().map(|lane| lane.runs.len()).sum::<usize>(),
            "classified runs"
        );
        RunOverview {
            counts,
            tokens,
            agents: self.agent_summaries(runs, now),
            view_mode: view.view_mode,
            lanes,
        }
    }
}
