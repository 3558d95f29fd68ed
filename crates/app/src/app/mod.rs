use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{MonitorConfig, ViewSnapshot};
use crate::error::Result;
use crate::feed;
use crate::services::{AppServices, ReportQuery, RunOverview, canonical_agent_ids, chart_peak};
use monitor_core::{ReportingSnapshot, ReportingTotals, RunRecord, UsageBucket};

/// Input files and tuning used by one monitor instance.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub runs_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub monitor: MonitorConfig,
}

/// Application state shared by front ends.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

/// Derived dashboard for one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub view: ViewSnapshot,
    pub query: ReportQuery,
    pub overview: RunOverview,
    pub usage: Vec<UsageBucket>,
    pub usage_agents: Vec<String>,
    pub chart_peak: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_totals: Option<ReportingTotals>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config.monitor);
        Self { config, services }
    }

    pub fn load_runs(&self) -> Result<Vec<RunRecord>> {
        feed::load_runs(&self.config.runs_path)
    }

    /// Missing or unreadable reports degrade to an empty usage series.
    pub fn load_report(&self) -> Option<ReportingSnapshot> {
        let path = self.config.report_path.as_ref()?;
        match feed::load_report(path) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to load report");
                None
            }
        }
    }

    pub fn refresh(&self, view: &ViewSnapshot, now: DateTime<Utc>) -> Result<Dashboard> {
        let runs = self.load_runs()?;
        let report = self.load_report();
        let dashboard = self.build(&runs, report.as_ref(), view, now);
        info!(
            runs = runs.len(),
            buckets = dashboard.usage.len(),
            range = %view.range,
            "dashboard refreshed"
        );
        Ok(dashboard)
    }

    /// Pure derivation from already loaded inputs.
    pub fn build(
        &self,
        runs: &[RunRecord],
        report: Option<&ReportingSnapshot>,
        view: &ViewSnapshot,
        now: DateTime<Utc>,
    ) -> Dashboard {
        let usage = self
            .services
            .usage
            .stacked_data(report, view.period, view.range);
        Dashboard {
            generated_at: now,
            view: view.clone(),
            query: self.services.usage.report_query(view),
            overview: self.services.runs.overview(runs, view, now),
            usage_agents: canonical_agent_ids(&usage),
            chart_peak: chart_peak(&usage),
            usage,
            reporting_totals: report.map(|report| report.totals.clone()),
        }
    }
}
