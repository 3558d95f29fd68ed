use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use monitor_app::{AgentFilter, StateFilter, ViewMode, ViewPreferences};
use monitor_core::Period;

#[derive(Parser, Debug)]
#[command(name = "agent-monitor", about = "Live dashboard for autonomous agent runs")]
pub struct CliArgs {
    /// Run records: a `{items: [...]}` page or a bare JSON array.
    #[arg(long, required_unless_present = "detail")]
    pub runs: Option<PathBuf>,
    /// Print one run's transcript and exit.
    #[arg(long)]
    pub detail: Option<PathBuf>,
    /// Pre-aggregated usage report.
    #[arg(long)]
    pub report: Option<PathBuf>,
    #[arg(long)]
    pub period: Option<Period>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Move the resolved window by this many days.
    #[arg(long, allow_hyphen_values = true)]
    pub shift: Option<i64>,
    #[arg(long)]
    pub agent: Option<AgentFilter>,
    #[arg(long)]
    pub state: Option<StateFilter>,
    #[arg(long)]
    pub view: Option<ViewMode>,
    /// Agents left out of the usage chart; repeatable.
    #[arg(long = "hide")]
    pub hidden: Vec<String>,
    /// Refresh interval in seconds; 0 renders once.
    #[arg(long)]
    pub interval: Option<u64>,
    #[arg(long, default_value_t = false)]
    pub once: bool,
    #[arg(long, default_value_t = false)]
    pub json: bool,
    /// Persist the resolved selections as preferences.
    #[arg(long, default_value_t = false)]
    pub save: bool,
    #[arg(long, default_value_t = false)]
    pub debug: bool,
    /// Directory holding config.toml.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

impl CliArgs {
    pub fn overrides(&self) -> ViewPreferences {
        ViewPreferences {
            period: self.period,
            start: self.start,
            end: self.end,
            agent: self.agent.clone(),
            state: self.state,
            view_mode: self.view,
            refresh_interval_secs: self.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::LivenessState;

    #[test]
    fn parses_overrides() {
        let args = CliArgs::try_parse_from([
            "agent-monitor",
            "--runs",
            "runs.json",
            "--period",
            "weekly",
            "--start",
            "2024-06-01",
            "--state",
            "stalled",
            "--agent",
            "builder",
            "--shift",
            "-7",
        ])
        .expect("parse args");

        let overrides = args.overrides();
        assert_eq!(overrides.period, Some(Period::Weekly));
        assert_eq!(overrides.start, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(
            overrides.state,
            Some(StateFilter::State(LivenessState::Stalled))
        );
        assert_eq!(
            overrides.agent,
            Some(AgentFilter::Agent("builder".to_string()))
        );
        assert_eq!(args.shift, Some(-7));
        assert!(overrides.end.is_none());
    }

    #[test]
    fn rejects_unknown_period() {
        let result =
            CliArgs::try_parse_from(["agent-monitor", "--runs", "r.json", "--period", "yearly"]);
        assert!(result.is_err());
    }

    #[test]
    fn detail_does_not_need_runs() {
        let args = CliArgs::try_parse_from(["agent-monitor", "--detail", "run.json"])
            .expect("parse args");
        assert_eq!(args.detail, Some(PathBuf::from("run.json")));
        assert!(args.runs.is_none());
        assert!(CliArgs::try_parse_from(["agent-monitor"]).is_err());
    }
}
