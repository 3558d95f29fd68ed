use std::fs;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};
use monitor_core::{ReportingSnapshot, RunDetail, RunRecord, RunsPage};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(AppError::from)
}

/// Reads run records from a paged `{items: [...]}` payload or a bare array.
pub fn load_runs(path: &Path) -> Result<Vec<RunRecord>> {
    let payload: Value = read_json(path)?;
    let mut runs: Vec<RunRecord> = if payload.is_array() {
        serde_json::from_value(payload)?
    } else {
        serde_json::from_value::<RunsPage>(payload)?.items
    };
    runs.iter_mut().for_each(RunRecord::backfill);
    Ok(runs)
}

pub fn load_report(path: &Path) -> Result<ReportingSnapshot> {
    read_json(path)
}

pub fn load_run_detail(path: &Path) -> Result<RunDetail> {
    let mut detail: RunDetail = read_json(path)?;
    detail.run.backfill();
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use monitor_core::RunStatus;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write feed");
        path
    }

    #[test]
    fn fractional_heartbeat_keeps_the_run() {
        let dir = tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "runs.json",
            r#"[{"runId":"r1","agentId":"a","status":"running",
                 "startedAt":1718366000000,"lastHeartbeatAt":1718366400000.5},
                {"runId":"r2","agentId":"b","status":"running","lastHeartbeatAt":"soon"}]"#,
        );

        let runs = load_runs(&path).expect("load runs");

        assert_eq!(runs.len(), 2);
        assert_eq!(
            runs[0].last_heartbeat_at,
            DateTime::<Utc>::from_timestamp_millis(1_718_366_400_000)
        );
        assert_eq!(runs[1].last_heartbeat_at, None);
    }

    #[test]
    fn page_payload_backfills_missing_fields() {
        let dir = tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "runs.json",
            r#"{"items":[{"runId":"r1","sessionKey":"agent:builder:main",
                          "startedAt":1000,"outcome":{"status":"unknown"}}],
                "total":1,"limit":200,"offset":0}"#,
        );

        let runs = load_runs(&path).expect("load runs");

        assert_eq!(runs[0].agent_id, "builder");
        assert_eq!(runs[0].status, RunStatus::Running);
    }

    #[test]
    fn wrong_shape_reports_the_field() {
        let dir = tempdir().expect("temp dir");
        let path = write(dir.path(), "runs.json", r#"{"items":[{"agentId":"a"}]}"#);

        let err = load_runs(&path).expect_err("missing run id");
        assert!(err.to_string().contains("runId"), "{err}");
    }

    #[test]
    fn run_detail_loads_messages() {
        let dir = tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "detail.json",
            r#"{"runId":"r1","agentId":"a","status":"done",
                "messages":[{"role":"assistant","text":"ok","toolCalls":[{"name":"bash"}]}]}"#,
        );

        let detail = load_run_detail(&path).expect("load detail");
        assert_eq!(detail.run.status, RunStatus::Completed);
        assert_eq!(detail.messages[0].tool_calls[0].display_name(), "bash");
    }
}
