use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::util::time::range_from_bounds;
use monitor_core::{
    DateRange, LivenessState, LivenessThresholds, Period, QUIET_THRESHOLD_MS,
    STALLED_THRESHOLD_MS,
};

pub const DEFAULT_MAX_DAILY_RANGE_DAYS: u64 = 366;
pub const DEFAULT_WEEKLY_BUCKET_CAP: u32 = 16;
pub const DEFAULT_MONTHLY_BUCKET_CAP: u32 = 12;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15;

/// Tuning options for classification and aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub quiet_threshold_ms: u64,
    pub stalled_threshold_ms: u64,
    pub max_daily_range_days: u64,
    pub weekly_bucket_cap: u32,
    pub monthly_bucket_cap: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            quiet_threshold_ms: QUIET_THRESHOLD_MS,
            stalled_threshold_ms: STALLED_THRESHOLD_MS,
            max_daily_range_days: DEFAULT_MAX_DAILY_RANGE_DAYS,
            weekly_bucket_cap: DEFAULT_WEEKLY_BUCKET_CAP,
            monthly_bucket_cap: DEFAULT_MONTHLY_BUCKET_CAP,
        }
    }
}

impl MonitorConfig {
    pub fn thresholds(&self) -> LivenessThresholds {
        LivenessThresholds::new(self.quiet_threshold_ms, self.stalled_threshold_ms)
    }

    /// Daily densification bound; zero is treated as one day.
    pub fn max_daily_days(&self) -> u64 {
        self.max_daily_range_days.max(1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Lanes,
    List,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lanes" => Ok(Self::Lanes),
            "list" => Ok(Self::List),
            other => Err(format!("unsupported view mode {}", other)),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lanes => f.pad("lanes"),
            Self::List => f.pad("list"),
        }
    }
}

/// Agent selection; `all` keeps every run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum AgentFilter {
    #[default]
    All,
    Agent(String),
}

impl AgentFilter {
    pub fn matches(&self, agent_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Agent(selected) => selected == agent_id,
        }
    }
}

impl From<String> for AgentFilter {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Agent(trimmed.to_string())
        }
    }
}

impl From<AgentFilter> for String {
    fn from(value: AgentFilter) -> Self {
        match value {
            AgentFilter::All => "all".to_string(),
            AgentFilter::Agent(agent_id) => agent_id,
        }
    }
}

impl FromStr for AgentFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(value.to_string()))
    }
}

/// State selection; `all` keeps every run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum StateFilter {
    #[default]
    All,
    State(LivenessState),
}

impl StateFilter {
    pub fn matches(&self, state: LivenessState) -> bool {
        match self {
            Self::All => true,
            Self::State(selected) => *selected == state,
        }
    }
}

impl FromStr for StateFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value.parse().map(Self::State)
    }
}

impl TryFrom<String> for StateFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StateFilter> for String {
    fn from(value: StateFilter) -> Self {
        match value {
            StateFilter::All => "all".to_string(),
            StateFilter::State(state) => state.as_str().to_string(),
        }
    }
}

/// Operator options; unset fields defer to the next layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,
}

impl ViewPreferences {
    /// Field-wise merge where `self` wins over `fallback`.
    pub fn or(self, fallback: ViewPreferences) -> ViewPreferences {
        ViewPreferences {
            period: self.period.or(fallback.period),
            start: self.start.or(fallback.start),
            end: self.end.or(fallback.end),
            agent: self.agent.or(fallback.agent),
            state: self.state.or(fallback.state),
            view_mode: self.view_mode.or(fallback.view_mode),
            refresh_interval_secs: self.refresh_interval_secs.or(fallback.refresh_interval_secs),
        }
    }
}

/// Immutable view configuration consumed by one refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub period: Period,
    pub range: DateRange,
    pub agent: AgentFilter,
    pub state: StateFilter,
    pub view_mode: ViewMode,
    pub refresh_interval_secs: u64,
}

impl ViewSnapshot {
    /// Resolves explicit overrides, then persisted preferences, then defaults.
    ///
    /// An override that sets the period or either endpoint discards both
    /// persisted endpoints.
    pub fn resolve(
        overrides: ViewPreferences,
        persisted: ViewPreferences,
        today: NaiveDate,
    ) -> ViewSnapshot {
        let overrides_range = overrides.start.is_some()
            || overrides.end.is_some()
            || overrides.period.is_some();
        let persisted = if overrides_range {
            ViewPreferences {
                start: None,
                end: None,
                ..persisted
            }
        } else {
            persisted
        };
        let merged = overrides.or(persisted);
        let period = merged.period.unwrap_or_default();
        ViewSnapshot {
            period,
            range: range_from_bounds(merged.start, merged.end, period, today),
            agent: merged.agent.unwrap_or_default(),
            state: merged.state.unwrap_or_default(),
            view_mode: merged.view_mode.unwrap_or_default(),
            refresh_interval_secs: merged
                .refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}
