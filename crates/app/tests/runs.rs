mod support;

use monitor_app::{AgentFilter, StateFilter, ViewMode, ViewPreferences, ViewSnapshot};
use monitor_core::{LivenessState, RunBadge, RunStatus};
use support::{date, finished, now, running, services};

#[test]
fn state_counts_route_through_classifier() {
    let services = services();
    let runs = vec![
        running("r1", "alpha", 0),
        running("r2", "alpha", 5),
        running("r3", "beta", 30),
        finished("r4", "beta", RunStatus::Failed),
        finished("r5", "gamma", RunStatus::Completed),
    ];

    let counts = services.runs.state_counts(&runs, now());

    assert_eq!(counts.running, 1);
    assert_eq!(counts.quiet, 1);
    assert_eq!(counts.stalled, 1);
    assert_eq!(counts.dead, 2);
    assert_eq!(counts.total, 5);
    assert_eq!(counts.get(LivenessState::Dead), 2);
}

#[test]
fn filter_runs_by_agent_and_state() {
    let services = services();
    let runs = vec![
        running("r1", "alpha", 0),
        running("r2", "alpha", 5),
        running("r3", "beta", 5),
    ];

    let quiet_alpha = services.runs.filter_runs(
        &runs,
        &AgentFilter::Agent("alpha".to_string()),
        StateFilter::State(LivenessState::Quiet),
        now(),
    );
    assert_eq!(quiet_alpha.len(), 1);
    assert_eq!(quiet_alpha[0].run_id, "r2");

    let all = services
        .runs
        .filter_runs(&runs, &AgentFilter::All, StateFilter::All, now());
    assert_eq!(all.len(), 3);
}

#[test]
fn agent_summaries_sorted_with_first_run_badge() {
    let services = services();
    let runs = vec![
        finished("r1", "zeta", RunStatus::TimedOut),
        running("r2", "alpha", 0),
        finished("r3", "zeta", RunStatus::Completed),
    ];

    let summaries = services.runs.agent_summaries(&runs, now());

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].agent_id, "alpha");
    assert_eq!(summaries[0].run_count, 1);
    assert_eq!(summaries[0].badge, RunBadge::Running);
    assert_eq!(summaries[1].agent_id, "zeta");
    assert_eq!(summaries[1].run_count, 2);
    assert_eq!(summaries[1].badge, RunBadge::Timeout);
}

#[test]
fn lanes_follow_first_appearance_order() {
    let services = services();
    let runs = vec![
        running("r1", "zeta", 0),
        running("r2", "alpha", 0),
        finished("r3", "zeta", RunStatus::Failed),
    ];

    let lanes = services.runs.lanes(&runs, now());

    assert_eq!(lanes.len(), 2);
    assert_eq!(lanes[0].agent_id, "zeta");
    assert_eq!(lanes[0].runs.len(), 2);
    assert_eq!(lanes[0].runs[1].badge, RunBadge::Failed);
    assert_eq!(lanes[0].runs[1].state, LivenessState::Dead);
    assert_eq!(lanes[1].agent_id, "alpha");
}

#[test]
fn run_view_formats_runtime_and_tokens() {
    let services = services();
    let mut run = running("r1", "alpha", 0);
    run.total_tokens = Some(12_345);

    let view = services.runs.view(&run, now());

    assert_eq!(view.runtime_ms, 3_600_000);
    assert_eq!(view.runtime, "1h 0m");
    assert_eq!(view.tokens, "12,345 tok");
    assert_eq!(view.name, "alpha");
}

#[test]
fn overview_tiles_ignore_state_filter_but_lanes_honour_it() {
    let services = services();
    let mut quiet = running("r2", "alpha", 5);
    quiet.input_tokens = Some(10);
    quiet.output_tokens = Some(5);
    let runs = vec![
        running("r1", "alpha", 0),
        quiet,
        running("r3", "beta", 0),
    ];
    let overrides = ViewPreferences {
        agent: Some(AgentFilter::Agent("alpha".to_string())),
        state: Some(StateFilter::State(LivenessState::Quiet)),
        view_mode: Some(ViewMode::List),
        ..ViewPreferences::default()
    };
    let view = ViewSnapshot::resolve(overrides, ViewPreferences::default(), date(2024, 6, 14));

    let overview = services.runs.overview(&runs, &view, now());

    assert_eq!(overview.counts.total, 2);
    assert_eq!(overview.counts.running, 1);
    assert_eq!(overview.counts.quiet, 1);
    assert_eq!(overview.tokens.total_tokens, 15);
    assert_eq!(overview.tokens.runs_with_data, 1);
    assert_eq!(overview.tokens.runs, 2);
    assert_eq!(overview.agents.len(), 2);
    assert_eq!(overview.lanes.len(), 1);
    assert_eq!(overview.lanes[0].runs.len(), 1);
    assert_eq!(overview.lanes[0].runs[0].run_id, "r2");
}
