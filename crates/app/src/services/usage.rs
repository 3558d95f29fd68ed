use std::collections::{BTreeSet, HashMap};

use chrono::Days;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ViewSnapshot;
use crate::services::SharedConfig;
use crate::util::time::{day_label, days_between_inclusive};
use monitor_core::{AgentUsage, DateRange, Period, ReportingSnapshot, UsageBucket};

/// Fetch parameters handed to the reporting source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub period: Period,
    pub range: DateRange,
    pub scope: String,
    pub limit: u32,
}

impl ReportQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("period", self.period.to_string()),
            ("start", day_label(self.range.start)),
            ("end", day_label(self.range.end)),
            ("scope", self.scope.clone()),
            ("limit", self.limit.to_string()),
        ]
    }
}

#[derive(Clone)]
pub struct UsageService {
    config: SharedConfig,
}

impl UsageService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Dense series for `period`; only daily buckets are filled locally.
    pub fn normalize(
        &self,
        items: &[UsageBucket],
        period: Period,
        range: DateRange,
    ) -> Vec<UsageBucket> {
        match period {
            Period::Daily => {
                densify_daily(items, bounded_range(range, self.config.max_daily_days()))
            }
            Period::Weekly | Period::Monthly => items.to_vec(),
        }
    }

    pub fn stacked_data(
        &self,
        report: Option<&ReportingSnapshot>,
        period: Period,
        range: DateRange,
    ) -> Vec<UsageBucket> {
        let items = report.map(ReportingSnapshot::usage_items).unwrap_or(&[]);
        self.normalize(items, period, range)
    }

    pub fn report_query(&self, view: &ViewSnapshot) -> ReportQuery {
        let limit = match view.period {
            Period::Daily => days_between_inclusive(view.range.start, view.range.end)
                .min(self.config.max_daily_days()),
            Period::Weekly => u64::from(self.config.weekly_bucket_cap),
            Period::Monthly => u64::from(self.config.monthly_bucket_cap),
        };
        ReportQuery {
            period: view.period,
            range: view.range,
            scope: "all".to_string(),
            limit: u32::try_from(limit).unwrap_or(u32::MAX),
        }
    }
}

/// Trims `range` to its most recent `max_days` days.
fn bounded_range(range: DateRange, max_days: u64) -> DateRange {
    if days_between_inclusive(range.start, range.end) <= max_days {
        return range;
    }
    let start = range
        .end
        .checked_sub_days(Days::new(max_days.saturating_sub(1)))
        .unwrap_or(range.start);
    warn!(
        requested_start = %range.start,
        end = %range.end,
        max_days,
        "daily range too long, coarsening to most recent days"
    );
    DateRange {
        start,
        end: range.end,
    }
}

/// Every agent id seen anywhere in `items`, sorted.
pub fn canonical_agent_ids(items: &[UsageBucket]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.agents.iter().map(|usage| usage.agent_id.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One bucket per day in `range`, each carrying every known agent.
///
/// `range` must already be clamped; an inverted range yields no buckets.
/// When labels repeat, the last bucket for a day wins.
pub fn densify_daily(items: &[UsageBucket], range: DateRange) -> Vec<UsageBucket> {
    let agent_ids = canonical_agent_ids(items);
    let mut by_period: HashMap<&str, &UsageBucket> = HashMap::with_capacity(items.len());
    for item in items {
        by_period.insert(item.period.as_str(), item);
    }

    let days = days_between_inclusive(range.start, range.end);
    let mut out = Vec::with_capacity(usize::try_from(days).unwrap_or(0));
    for day in range.start.iter_days().take_while(|day| *day <= range.end) {
        let label = day_label(day);
        let bucket = match by_period.get(label.as_str()) {
            Some(current) => align_bucket(label, current, &agent_ids),
            None => UsageBucket::zero(label, agent_ids.as_slice()),
        };
        out.push(bucket);
    }
    debug!(
        days = out.len(),
        agents = agent_ids.len(),
        sparse = items.len(),
        "densified daily usage"
    );
    out
}

fn align_bucket(label: String, current: &UsageBucket, agent_ids: &[String]) -> UsageBucket {
    let agents = agent_ids
        .iter()
        .map(|agent_id| {
            current
                .agent(agent_id)
                .cloned()
                .unwrap_or_else(|| AgentUsage::zero(agent_id.as_str()))
        })
        .collect();
    UsageBucket::from_agents(label, agents)
}

/// Bar-scaling ceiling: the largest summed agent total, never below 1.
pub fn chart_peak(buckets: &[UsageBucket]) -> u64 {
    buckets
        .iter()
        .map(|bucket| visible_total::<&str>(bucket, &[]))
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Bucket total over agents not hidden in the legend.
pub fn visible_total<S: AsRef<str>>(bucket: &UsageBucket, hidden: &[S]) -> u64 {
    bucket
        .agents
        .iter()
        .filter(|usage| !hidden.iter().any(|id| id.as_ref() == usage.agent_id))
        .fold(0u64, |acc, usage| acc.saturating_add(usage.total_tokens))
}
