mod runs;
mod usage;

use std::sync::Arc;

use crate::config::MonitorConfig;

pub use runs::{AgentSummary, Lane, RunOverview, RunView, RunsService, StateCounts, TokenWindow};
pub use usage::{
    ReportQuery, UsageService, canonical_agent_ids, chart_peak, densify_daily, visible_total,
};

type SharedConfig = Arc<MonitorConfig>;

/// Service registry for dashboard derivations.
#[derive(Clone)]
pub struct AppServices {
    pub runs: RunsService,
    pub usage: UsageService,
}

impl AppServices {
    pub fn new(config: &MonitorConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            runs: RunsService::new(shared.clone()),
            usage: UsageService::new(shared),
        }
    }
}
