#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use monitor_app::{AppServices, MonitorConfig};
use monitor_core::{AgentUsage, RunRecord, RunStatus, UsageBucket};

pub fn services() -> AppServices {
    AppServices::new(&MonitorConfig::default())
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 14, 12, 0, 0)
        .single()
        .expect("now")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn running(run_id: &str, agent_id: &str, idle_minutes: i64) -> RunRecord {
    let mut run = RunRecord::new(run_id, agent_id, RunStatus::Running);
    run.started_at = Some(now() - Duration::hours(1));
    run.last_heartbeat_at = Some(now() - Duration::minutes(idle_minutes));
    run
}

pub fn finished(run_id: &str, agent_id: &str, status: RunStatus) -> RunRecord {
    let mut run = RunRecord::new(run_id, agent_id, status);
    run.started_at = Some(now() - Duration::hours(3));
    run.ended_at = Some(now() - Duration::hours(2));
    run
}

pub fn usage(agent_id: &str, runs: u64, input: u64, output: u64, total: u64) -> AgentUsage {
    AgentUsage {
        agent_id: agent_id.to_string(),
        run_count: runs,
        input_tokens: input,
        output_tokens: output,
        total_tokens: total,
    }
}

pub fn bucket(period: &str, agents: Vec<AgentUsage>) -> UsageBucket {
    UsageBucket {
        period: period.to_string(),
        agents,
        ..UsageBucket::default()
    }
}
