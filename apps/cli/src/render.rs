use monitor_app::services::visible_total;
use monitor_app::{Dashboard, ViewMode};
use monitor_core::{LivenessState, RunDetail, group_thousands};

const BAR_WIDTH: u64 = 40;

/// Plain-text dashboard; `hidden` agents are left out of usage bars.
pub fn render_text(dashboard: &Dashboard, hidden: &[String]) -> String {
    let mut out = String::new();
    let view = &dashboard.view;
    out.push_str(&format!(
        "Agent Monitor  {}  [{} {}]  updated {}\n\n",
        view.range,
        view.period,
        view.view_mode,
        dashboard.generated_at.format("%H:%M:%S")
    ));

    let counts = &dashboard.overview.counts;
    for state in LivenessState::ALL {
        out.push_str(&format!("{:>8}: {:<5}", state.as_str(), counts.get(state)));
    }
    out.push_str(&format!("{:>8}: {}\n", "total", counts.total));

    let tokens = &dashboard.overview.tokens;
    out.push_str(&format!(
        "tokens  in {}  out {}  total {}  ({} / {} runs reporting tokens)\n\n",
        group_thousands(tokens.input_tokens),
        group_thousands(tokens.output_tokens),
        group_thousands(tokens.total_tokens),
        tokens.runs_with_data,
        tokens.runs
    ));

    out.push_str("Agents\n");
    for agent in &dashboard.overview.agents {
        out.push_str(&format!(
            "  {:<24} {:<8} {} runs\n",
            agent.agent_id, agent.badge, agent.run_count
        ));
    }
    out.push('\n');

    for lane in &dashboard.overview.lanes {
        match dashboard.overview.view_mode {
            ViewMode::Lanes => {
                out.push_str(&format!("{} ({} runs)\n", lane.agent_id, lane.runs.len()));
            }
            ViewMode::List => out.push_str("Runs\n"),
        }
        for run in &lane.runs {
            out.push_str(&format!(
                "  [{:<7}] {:<24} {:>8}  {}  {}\n",
                run.badge,
                run.name,
                run.runtime,
                run.tokens,
                if run.task.is_empty() { "-" } else { &run.task }
            ));
        }
    }
    out.push('\n');

    out.push_str(&format!("Usage by {} (tokens)\n", view.period));
    for bucket in &dashboard.usage {
        let total = visible_total(bucket, hidden);
        let width = (total.saturating_mul(BAR_WIDTH) / dashboard.chart_peak).min(BAR_WIDTH);
        out.push_str(&format!(
            "  {:<10} {:<40} {}\n",
            bucket.period,
            "#".repeat(usize::try_from(width).unwrap_or(0)),
            group_thousands(total)
        ));
    }
    out
}

/// Transcript view of one run; tool payloads are printed as compact JSON.
pub fn render_detail(detail: &RunDetail) -> String {
    let run = &detail.run;
    let mut out = String::from("Run detail\n");
    out.push_str(&format!("Agent: {}\n", run.agent_id));
    out.push_str(&format!("Run:   {} [{}]\n", run.run_id, run.status));
    out.push_str(&format!("Task:  {}\n", run.task));
    out.push_str(&format!("Tokens: {}\n", run.token_label()));

    for message in &detail.messages {
        out.push('\n');
        let header = match message.timestamp {
            Some(at) => format!("[{}] {}\n", message.role, at.format("%H:%M:%S")),
            None => format!("[{}]\n", message.role),
        };
        out.push_str(&header);
        for line in message.text.lines() {
            out.push_str(&format!("  {}\n", line));
        }
        for call in &message.tool_calls {
            out.push_str(&format!("  Tool: {}\n", call.display_name()));
            let args = json_or_empty(call.arguments.as_ref());
            let result = json_or_empty(call.result.as_ref());
            out.push_str(&format!("    args:   {}\n    result: {}\n", args, result));
        }
    }
    out
}

fn json_or_empty(value: Option<&serde_json::Value>) -> String {
    value.map_or_else(|| "{}".to_string(), ToString::to_string)
}
