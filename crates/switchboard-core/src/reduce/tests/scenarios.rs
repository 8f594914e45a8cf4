use serde_json::json;

use super::{apply, fixed_now, session, text, thinking, tool};
use crate::conversation::{ContentBlock, Role};
use crate::events::ServerEvent;
use crate::reduce::{Effect, NoticeLevel, TurnOutcome, reduce};
use crate::state::{ActivityStatus, CompactionStatus, ProcessStatus, SessionState};
use crate::types::SessionId;

fn nested_ids(block: &ContentBlock) -> Vec<String> {
    block
        .as_tool_use()
        .map(|tool| tool.nested_tools.iter().map(|t| t.id.clone()).collect())
        .unwrap_or_default()
}

fn top_level_ids(state: &SessionState) -> Vec<String> {
    state.messages[0]
        .blocks()
        .iter()
        .filter_map(ContentBlock::as_tool_use)
        .map(|tool| tool.id.clone())
        .collect()
}

#[test]
fn streaming_thinking_then_text_then_result() {
    let mut state = session("s1");
    let effects = apply(
        &mut state,
        &[
            ServerEvent::ThinkingStart,
            thinking("Let me "),
            thinking("check."),
            ServerEvent::TokenUpdate { output_tokens: 12 },
            text("Done."),
            ServerEvent::Result,
        ],
    );

    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].role(), Role::Assistant);
    assert_eq!(
        state.messages[0].blocks(),
        &[ContentBlock::thinking("Let me check."), ContentBlock::text("Done.")]
    );
    assert!(!state.loading);
    assert_eq!(state.live_output_tokens, 0);
    assert_eq!(state.activity.status, ActivityStatus::Completed);
    assert_eq!(
        effects,
        vec![Effect::TurnFinalized {
            session_id: Some(SessionId::from("s1")),
            outcome: TurnOutcome::Completed,
        }]
    );
}

#[test]
fn nesting_two_tasks_two_reads() {
    let mut state = session("s1");
    apply(
        &mut state,
        &[
            tool("Task", "T1"),
            tool("Task", "T2"),
            tool("Read", "R1"),
            tool("Read", "R2"),
        ],
    );

    let blocks = state.messages[0].blocks();
    assert_eq!(top_level_ids(&state), vec!["T1", "T2"]);
    assert_eq!(nested_ids(&blocks[0]), vec!["R1"]);
    assert_eq!(nested_ids(&blocks[1]), vec!["R2"]);
}

#[test]
fn thinking_delta_without_open_block_is_dropped() {
    let mut state = session("s1");
    apply(&mut state, &[thinking("orphan")]);
    assert!(state.messages.is_empty());

    apply(&mut state, &[text("Hello"), thinking("late")]);
    assert_eq!(state.messages[0].blocks(), &[ContentBlock::text("Hello")]);
}

#[test]
fn text_after_tool_opens_new_text_block() {
    let mut state = session("s1");
    apply(
        &mut state,
        &[text("Reading "), text("files."), tool("Read", "r1"), text("Found it.")],
    );

    let blocks = state.messages[0].blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], ContentBlock::text("Reading files."));
    assert_eq!(blocks[2], ContentBlock::text("Found it."));
}

#[test]
fn empty_delta_does_not_open_a_turn() {
    let mut state = session("s1");
    state.live_output_tokens = 9;
    apply(&mut state, &[text("")]);

    assert!(state.messages.is_empty());
    assert!(!state.loading);
    assert_eq!(state.live_output_tokens, 9);
}

#[test]
fn token_counter_resets_only_on_new_turn() {
    let mut state = session("s1");
    state.push_user_message("hi", fixed_now());
    state.live_output_tokens = 50;

    apply(&mut state, &[text("a")]);
    assert_eq!(state.live_output_tokens, 0);

    apply(&mut state, &[ServerEvent::TokenUpdate { output_tokens: 7 }, text("b")]);
    assert_eq!(state.live_output_tokens, 7);
    assert_eq!(state.messages.len(), 2);
}

#[test]
fn user_turn_separates_assistant_turns() {
    let mut state = session("s1");
    apply(&mut state, &[text("first"), ServerEvent::Result]);
    state.push_user_message("again", fixed_now());
    apply(&mut state, &[text("second")]);

    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[2].text(), "second");
    assert_eq!(state.messages[2].id.as_str(), "local-3");
}

#[test]
fn tool_use_tracks_current_tool_and_file() {
    let mut state = session("s1");
    apply(&mut state, &[tool("Edit", "e1")]);

    assert!(state.loading);
    assert_eq!(state.activity.status, ActivityStatus::ToolUse);
    assert_eq!(state.activity.current_tool.as_deref(), Some("Edit"));
    assert_eq!(state.activity.current_tool_id.as_deref(), Some("e1"));
    assert_eq!(state.activity.current_file.as_deref(), Some("src/e1.rs"));

    apply(
        &mut state,
        &[ServerEvent::ToolResult {
            tool_id: "e1".to_string(),
            result: json!("ok"),
            is_error: false,
        }],
    );
    assert_eq!(state.activity.status, ActivityStatus::Thinking);
    assert_eq!(state.activity.current_tool, None);
}

#[test]
fn duplicate_tool_use_leaves_activity_untouched() {
    let mut state = session("s1");
    apply(&mut state, &[tool("Read", "r1"), text("done")]);
    let before = state.clone();

    apply(&mut state, &[tool("Read", "r1")]);
    assert_eq!(state, before);
}

#[test]
fn duplicate_tool_result_is_ignored() {
    let result = ServerEvent::ToolResult {
        tool_id: "r1".to_string(),
        result: json!({"lines": 3}),
        is_error: false,
    };
    let mut state = session("s1");
    apply(&mut state, &[tool("Read", "r1"), result.clone(), result]);

    let results = state.messages[0]
        .blocks()
        .iter()
        .filter(|block| matches!(block, ContentBlock::ToolResult { .. }))
        .count();
    assert_eq!(results, 1);
}

#[test]
fn error_appends_icon_block_and_finalizes() {
    let mut state = session("s1");
    apply(&mut state, &[text("Working"), ServerEvent::TokenUpdate { output_tokens: 3 }]);

    let effects = reduce(
        &mut state,
        &ServerEvent::Error {
            error_type: Some("rate_limit".to_string()),
            message: None,
            error: Some("Too many requests".to_string()),
        },
        fixed_now(),
    );

    assert_eq!(
        state.messages[0].blocks(),
        &[
            ContentBlock::text("Working"),
            ContentBlock::text("🚦 Too many requests"),
        ]
    );
    assert!(!state.loading);
    assert_eq!(state.live_output_tokens, 0);
    assert_eq!(state.activity.status, ActivityStatus::Error);
    assert_eq!(
        effects,
        vec![
            Effect::notify(NoticeLevel::Error, "Too many requests"),
            Effect::TurnFinalized {
                session_id: Some(SessionId::from("s1")),
                outcome: TurnOutcome::Failed,
            },
        ]
    );
}

#[test]
fn error_without_text_uses_generic_message() {
    let mut state = session("s1");
    state.push_user_message("hi", fixed_now());
    reduce(
        &mut state,
        &ServerEvent::Error {
            error_type: None,
            message: None,
            error: None,
        },
        fixed_now(),
    );

    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].text(), "❌ An unexpected error occurred");
}

#[test]
fn advisory_events_only_notify() {
    let mut state = session("s1");
    let effects = apply(
        &mut state,
        &[ServerEvent::RetryAttempt {
            attempt: 2,
            max_attempts: 5,
            message: "Backend overloaded".to_string(),
            error_type: Some("overloaded".to_string()),
        }],
    );

    assert!(state.messages.is_empty());
    assert_eq!(
        effects,
        vec![Effect::notify(NoticeLevel::Warn, "Retrying (2/5): Backend overloaded")]
    );
}

#[test]
fn long_running_command_lifecycle() {
    let started = ServerEvent::LongRunningCommandStarted {
        bash_id: "b1".to_string(),
        command: "npm run dev".to_string(),
        command_type: "dev_server".to_string(),
        description: Some("Start dev server".to_string()),
        started_at: None,
    };
    let mut state = session("s1");
    apply(
        &mut state,
        &[
            started.clone(),
            started,
            ServerEvent::LongRunningCommandOutput {
                bash_id: "b1".to_string(),
                content: "ready on :3000".to_string(),
                is_error: false,
            },
            ServerEvent::LongRunningCommandOutput {
                bash_id: "missing".to_string(),
                content: "ignored".to_string(),
                is_error: true,
            },
            ServerEvent::LongRunningCommandCompleted {
                bash_id: "b1".to_string(),
                exit_code: Some(0),
            },
        ],
    );

    let blocks = state.messages[0].blocks();
    assert_eq!(blocks.len(), 1);
    let ContentBlock::LongRunningCommand(command) = &blocks[0] else {
        panic!("expected long-running command block");
    };
    assert_eq!(command.updates.len(), 1);
    assert_eq!(command.updates[0].content, "ready on :3000");
    assert_eq!(command.updates[0].timestamp, fixed_now());
    assert_eq!(command.completed, Some(true));
    assert_eq!(command.exit_code, Some(0));
}

#[test]
fn background_processes_follow_their_lifecycle() {
    let mut state = session("s1");
    apply(
        &mut state,
        &[
            ServerEvent::BackgroundProcessStarted {
                bash_id: "p1".to_string(),
                command: "cargo watch".to_string(),
                description: None,
            },
            ServerEvent::BackgroundProcessStarted {
                bash_id: "p2".to_string(),
                command: "tail -f log".to_string(),
                description: None,
            },
            ServerEvent::BackgroundProcessKilled {
                bash_id: "p1".to_string(),
                command: None,
            },
            ServerEvent::BackgroundProcessExited {
                bash_id: "p2".to_string(),
                command: None,
                exit_code: Some(1),
            },
            ServerEvent::BackgroundProcessKilled {
                bash_id: "unknown".to_string(),
                command: None,
            },
        ],
    );

    assert_eq!(state.background_processes.len(), 2);
    assert_eq!(state.background_processes["p1"].status, ProcessStatus::Killed);
    assert_eq!(
        state.background_processes["p2"].status,
        ProcessStatus::Exited { exit_code: Some(1) }
    );
    assert!(state.messages.is_empty());
}

#[test]
fn side_state_events() {
    let mut state = session("s1");
    let effects = apply(
        &mut state,
        &[
            ServerEvent::ModeChanged {
                mode: "plan".to_string(),
            },
            ServerEvent::PermissionModeChanged {
                mode: "acceptEdits".to_string(),
            },
            ServerEvent::ExitPlanMode {
                plan: Some("1. refactor".to_string()),
            },
            ServerEvent::AskUserQuestion {
                tool_id: "q1".to_string(),
                questions: json!([{"question": "Proceed?"}]),
            },
        ],
    );

    assert_eq!(state.mode.as_deref(), Some("plan"));
    assert_eq!(state.permission_mode.as_deref(), Some("acceptEdits"));
    assert_eq!(state.pending_plan.as_deref(), Some("1. refactor"));
    assert_eq!(
        state.pending_question.as_ref().map(|q| q.tool_id.as_str()),
        Some("q1")
    );
    assert_eq!(effects.len(), 4);

    apply(&mut state, &[ServerEvent::QuestionAnswered]);
    assert!(state.pending_question.is_none());
}

#[test]
fn compaction_cycle_ends_with_info_toast() {
    let mut state = session("s1");
    apply(
        &mut state,
        &[ServerEvent::CompactStart {
            trigger: Some("auto".to_string()),
            pre_tokens: Some(150_000),
        }],
    );
    assert!(matches!(state.compaction, CompactionStatus::Compacting { .. }));

    apply(&mut state, &[ServerEvent::CompactLoading]);
    assert_eq!(state.compaction, CompactionStatus::Loading);

    let effects = apply(
        &mut state,
        &[ServerEvent::CompactComplete {
            pre_tokens: Some(150_000),
        }],
    );
    assert_eq!(state.compaction, CompactionStatus::Idle);
    assert_eq!(
        effects,
        vec![Effect::notify(
            NoticeLevel::Info,
            "Conversation compacted (150000 tokens summarized)"
        )]
    );
}

#[test]
fn title_update_for_other_session_only_reports() {
    let mut state = session("s1");
    let effects = apply(
        &mut state,
        &[ServerEvent::SessionTitleUpdated {
            new_title: "Other".to_string(),
            session_id: Some(SessionId::from("s2")),
        }],
    );
    assert_eq!(state.title, None);
    assert_eq!(
        effects,
        vec![Effect::TitleUpdated {
            session_id: SessionId::from("s2"),
            title: "Other".to_string(),
        }]
    );

    apply(
        &mut state,
        &[ServerEvent::SessionTitleUpdated {
            new_title: "Mine".to_string(),
            session_id: None,
        }],
    );
    assert_eq!(state.title.as_deref(), Some("Mine"));
}

#[test]
fn keepalive_and_context_usage_change_nothing() {
    let mut state = session("s1");
    apply(&mut state, &[text("x")]);
    let before = state.clone();

    let effects = apply(
        &mut state,
        &[
            ServerEvent::Keepalive { elapsed_seconds: 30 },
            ServerEvent::ContextUsage {
                input_tokens: 1_000,
                context_window: 200_000,
                context_percentage: 0.5,
                session_id: None,
            },
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(state, before);
}
