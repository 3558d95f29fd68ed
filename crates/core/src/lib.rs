use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod liveness;

pub use liveness::{
    LivenessThresholds, QUIET_THRESHOLD_MS, STALLED_THRESHOLD_MS, classify, classify_now,
    run_badge,
};

pub const UNKNOWN_AGENT: &str = "unknown";

/// Lifecycle status as reported by the run source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Running,
    #[serde(rename = "done", alias = "completed")]
    Completed,
    Failed,
    #[serde(rename = "timeout", alias = "timedOut")]
    TimedOut,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "done",
            Self::Failed => "failed",
            Self::TimedOut => "timeout",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Derives a status from the outcome recorded by the agent runtime.
    ///
    /// A missing outcome reads as `"unknown"`; only an explicitly empty
    /// outcome marks an ended run as completed.
    pub fn from_outcome(outcome: Option<&str>, started: bool, ended: bool) -> Self {
        match outcome.unwrap_or("unknown") {
            "ok" | "done" => Self::Completed,
            "timeout" => Self::TimedOut,
            "error" => Self::Failed,
            "" if ended => Self::Completed,
            _ if started && !ended => Self::Running,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Operational state derived from a run's status and heartbeat age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    Running,
    Quiet,
    Stalled,
    Dead,
}

impl LivenessState {
    pub const ALL: [LivenessState; 4] = [Self::Running, Self::Quiet, Self::Stalled, Self::Dead];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Quiet => "quiet",
            Self::Stalled => "stalled",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LivenessState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "quiet" => Ok(Self::Quiet),
            "stalled" => Ok(Self::Stalled),
            "dead" => Ok(Self::Dead),
            other => Err(format!("unsupported state {}", other)),
        }
    }
}

/// Display key for lanes and badges: liveness while running, the terminal
/// status otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunBadge {
    Running,
    Quiet,
    Stalled,
    Done,
    Failed,
    Timeout,
    Unknown,
}

impl RunBadge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Quiet => "quiet",
            Self::Stalled => "stalled",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn default_agent_id() -> String {
    UNKNOWN_AGENT.to_string()
}

/// Epoch milliseconds; anything that is not a representable number reads as absent.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|ms| ms.is_finite())
                .map(|ms| ms.trunc() as i64)
        }),
        _ => None,
    };
    Ok(millis.and_then(DateTime::<Utc>::from_timestamp_millis))
}

/// Terminal outcome attached by the agent runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One agent execution as supplied by the polling source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: String,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub session_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>, agent_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            run_id: run_id.into(),
            agent_id: agent_id.into(),
            label: String::new(),
            model: String::new(),
            status,
            started_at: None,
            ended_at: None,
            last_heartbeat_at: None,
            runtime_ms: None,
            timeout_seconds: None,
            task: String::new(),
            session_key: String::new(),
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
            outcome: None,
        }
    }

    /// Fills fields the source left unset: the status from the recorded
    /// outcome and the agent id from the session key.
    pub fn backfill(&mut self) {
        if self.status == RunStatus::Unknown {
            if let Some(outcome) = &self.outcome {
                self.status = RunStatus::from_outcome(
                    outcome.status.as_deref(),
                    self.started_at.is_some(),
                    self.ended_at.is_some(),
                );
            }
        }
        if self.agent_id == UNKNOWN_AGENT && !self.session_key.is_empty() {
            self.agent_id = agent_id_from_session_key(&self.session_key);
        }
    }

    /// Last liveness signal, falling back to the start time, then `reference`.
    pub fn heartbeat_or(&self, reference: DateTime<Utc>) -> DateTime<Utc> {
        self.last_heartbeat_at
            .or(self.started_at)
            .unwrap_or(reference)
    }

    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.agent_id
        } else {
            &self.label
        }
    }

    /// Wall-clock runtime; live runs are measured against `now`.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        if let (RunStatus::Running, Some(started)) = (self.status, self.started_at) {
            return non_negative_ms(now - started);
        }
        if let Some(runtime) = self.runtime_ms {
            return runtime;
        }
        match (self.started_at, self.ended_at) {
            (Some(started), Some(ended)) => non_negative_ms(ended - started),
            _ => 0,
        }
    }

    pub fn reports_tokens(&self) -> bool {
        self.input_tokens.is_some() || self.output_tokens.is_some() || self.total_tokens.is_some()
    }

    /// Reported total, or input + output when the source omitted it.
    pub fn effective_total_tokens(&self) -> u64 {
        self.total_tokens.unwrap_or_else(|| {
            self.input_tokens
                .unwrap_or(0)
                .saturating_add(self.output_tokens.unwrap_or(0))
        })
    }

    pub fn token_label(&self) -> String {
        if let Some(total) = self.total_tokens {
            return format!("{} tok", group_thousands(total));
        }
        if self.input_tokens.is_some() || self.output_tokens.is_some() {
            return format!(
                "{} in / {} out",
                group_thousands(self.input_tokens.unwrap_or(0)),
                group_thousands(self.output_tokens.unwrap_or(0))
            );
        }
        "tokens unavailable".to_string()
    }
}

fn non_negative_ms(delta: chrono::Duration) -> u64 {
    u64::try_from(delta.num_milliseconds()).unwrap_or(0)
}

/// Tool invocation recorded inside a transcript message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ToolCall {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMessage {
    pub role: String,
    #[serde(default)]
    pub text: String,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// A run together with its transcript excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetail {
    #[serde(flatten)]
    pub run: RunRecord,
    #[serde(default)]
    pub messages: Vec<RunMessage>,
}

/// Aggregation granularity for usage reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!("unsupported period {}", other)),
        }
    }
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// One agent's contribution within one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUsage {
    pub agent_id: String,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl AgentUsage {
    pub fn zero(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }
}

/// Usage for one period, broken down per agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBucket {
    pub period: String,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub agents: Vec<AgentUsage>,
}

impl UsageBucket {
    /// Builds a bucket whose totals are the sum of `agents`.
    pub fn from_agents(period: impl Into<String>, agents: Vec<AgentUsage>) -> Self {
        let mut bucket = Self {
            period: period.into(),
            agents,
            ..Self::default()
        };
        for usage in &bucket.agents {
            bucket.run_count = bucket.run_count.saturating_add(usage.run_count);
            bucket.input_tokens = bucket.input_tokens.saturating_add(usage.input_tokens);
            bucket.output_tokens = bucket.output_tokens.saturating_add(usage.output_tokens);
            bucket.total_tokens = bucket.total_tokens.saturating_add(usage.total_tokens);
        }
        bucket
    }

    pub fn zero<S: AsRef<str>>(period: impl Into<String>, agent_ids: &[S]) -> Self {
        let agents = agent_ids
            .iter()
            .map(|agent_id| AgentUsage::zero(agent_id.as_ref()))
            .collect();
        Self::from_agents(period, agents)
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentUsage> {
        self.agents.iter().find(|usage| usage.agent_id == agent_id)
    }

    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents
            .iter()
            .map(|usage| usage.agent_id.as_str())
            .collect()
    }
}

/// Page of run records returned by the polling source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsPage {
    pub items: Vec<RunRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingTotals {
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub runtime_ms: u64,
    #[serde(default)]
    pub agent_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSeries {
    #[serde(default)]
    pub items: Vec<UsageBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_stacked: Option<UsageSeries>,
}

/// Pre-aggregated usage report for one period and range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingSnapshot {
    #[serde(default)]
    pub window_days: u64,
    #[serde(default)]
    pub totals: ReportingTotals,
    #[serde(default)]
    pub series: ReportingSeries,
    #[serde(default)]
    pub agent_ids: Vec<String>,
}

impl ReportingSnapshot {
    /// Sparse usage buckets; an absent series reads as empty.
    pub fn usage_items(&self) -> &[UsageBucket] {
        self.series
            .usage_stacked
            .as_ref()
            .map(|series| series.items.as_slice())
            .unwrap_or(&[])
    }
}

pub fn agent_id_from_session_key(session_key: &str) -> String {
    let mut parts = session_key.split(':');
    match (parts.next(), parts.next()) {
        (Some(_), Some(agent_id)) => agent_id.to_string(),
        _ => UNKNOWN_AGENT.to_string(),
    }
}

pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let rest = seconds % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, rest)
    } else {
        format!("{}s", rest)
    }
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
