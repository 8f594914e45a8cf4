//! The session reducer: folds one server event into a [`SessionState`].
//!
//! `reduce` is synchronous and performs no I/O. Anything that must happen
//! outside the state (toasts, cache eviction, session-list updates) is returned
//! as an [`Effect`] for the caller to interpret.

mod effect;
pub mod nesting;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::conversation::{CommandUpdate, ContentBlock, LongRunningCommand, ToolUse};
use crate::events::{ErrorKind, ServerEvent};
use crate::state::{
    ActivityStatus, BackgroundProcess, CompactionStatus, PendingQuestion, ProcessStatus,
    SessionState,
};
use crate::types::SessionId;

pub use effect::{Effect, NoticeLevel, TurnOutcome};
pub use nesting::Placement;

const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Input keys that name the file a tool is working on.
const FILE_INPUT_KEYS: [&str; 3] = ["file_path", "path", "notebook_path"];

pub fn reduce(state: &mut SessionState, event: &ServerEvent, now: DateTime<Utc>) -> Vec<Effect> {
    match event {
        ServerEvent::AssistantMessage { content } => handle_assistant_message(state, content, now),

        ServerEvent::ThinkingStart => handle_thinking_start(state, now),

        ServerEvent::ThinkingDelta { content } => handle_thinking_delta(state, content),

        ServerEvent::ToolUse {
            tool_id,
            tool_name,
            tool_input,
        } => handle_tool_use(state, tool_id, tool_name, tool_input, now),

        ServerEvent::ToolResult {
            tool_id,
            result,
            is_error,
        } => handle_tool_result(state, tool_id, result, *is_error, now),

        ServerEvent::TokenUpdate { output_tokens } => {
            state.live_output_tokens = *output_tokens;
            vec![]
        }

        ServerEvent::Result => finish_turn(state, TurnOutcome::Completed),

        ServerEvent::Error {
            error_type,
            message,
            error,
        } => handle_error(
            state,
            error_type.as_deref(),
            message.as_deref().or(error.as_deref()),
            now,
        ),

        ServerEvent::TimeoutWarning { .. } | ServerEvent::RetryAttempt { .. } => {
            advisory_notice(event).into_iter().collect()
        }

        ServerEvent::ExitPlanMode { plan } => {
            state.pending_plan.clone_from(plan);
            vec![Effect::PlanReady { plan: plan.clone() }]
        }

        ServerEvent::SessionTitleUpdated {
            new_title,
            session_id,
        } => handle_title_updated(state, new_title, session_id.as_ref()),

        ServerEvent::ModeChanged { mode } => {
            state.mode = Some(mode.clone());
            vec![Effect::ModeChanged { mode: mode.clone() }]
        }

        ServerEvent::PermissionModeChanged { mode } => {
            state.permission_mode = Some(mode.clone());
            vec![Effect::PermissionModeChanged { mode: mode.clone() }]
        }

        ServerEvent::BackgroundProcessStarted {
            bash_id,
            command,
            description,
        } => {
            state.background_processes.insert(
                bash_id.clone(),
                BackgroundProcess {
                    bash_id: bash_id.clone(),
                    command: command.clone(),
                    description: description.clone(),
                    status: ProcessStatus::Running,
                },
            );
            vec![]
        }

        ServerEvent::BackgroundProcessKilled { bash_id, .. } => {
            set_process_status(state, bash_id, ProcessStatus::Killed);
            vec![]
        }

        ServerEvent::BackgroundProcessExited {
            bash_id, exit_code, ..
        } => {
            set_process_status(
                state,
                bash_id,
                ProcessStatus::Exited {
                    exit_code: *exit_code,
                },
            );
            vec![]
        }

        ServerEvent::LongRunningCommandStarted {
            bash_id,
            command,
            command_type,
            description,
            ..
        } => handle_command_started(
            state,
            bash_id,
            command,
            command_type,
            description.as_deref(),
            now,
        ),

        ServerEvent::LongRunningCommandOutput {
            bash_id,
            content,
            is_error,
        } => {
            match find_command(state, bash_id) {
                Some(command) => command.updates.push(CommandUpdate {
                    timestamp: now,
                    content: content.clone(),
                    is_error: *is_error,
                }),
                None => trace!(target: "switchboard.reduce", %bash_id, "output for unknown command"),
            }
            vec![]
        }

        ServerEvent::LongRunningCommandCompleted { bash_id, exit_code } => {
            if let Some(command) = find_command(state, bash_id) {
                command.completed = Some(true);
                command.exit_code = *exit_code;
            }
            vec![]
        }

        ServerEvent::AskUserQuestion { tool_id, questions } => {
            state.pending_question = Some(PendingQuestion {
                tool_id: tool_id.clone(),
                questions: questions.clone(),
            });
            vec![Effect::QuestionAsked {
                tool_id: tool_id.clone(),
            }]
        }

        ServerEvent::QuestionAnswered => {
            state.pending_question = None;
            vec![]
        }

        ServerEvent::CompactStart {
            trigger,
            pre_tokens,
        } => {
            state.compaction = CompactionStatus::Compacting {
                trigger: trigger.clone(),
                pre_tokens: *pre_tokens,
            };
            vec![]
        }

        ServerEvent::CompactLoading => {
            state.compaction = CompactionStatus::Loading;
            vec![]
        }

        ServerEvent::CompactComplete { pre_tokens } => {
            state.compaction = CompactionStatus::Idle;
            let message = match pre_tokens {
                Some(tokens) => format!("Conversation compacted ({tokens} tokens summarized)"),
                None => "Conversation compacted".to_string(),
            };
            vec![Effect::notify(NoticeLevel::Info, message)]
        }

        // Usage is tracked per session outside the conversation state.
        ServerEvent::ContextUsage { .. } | ServerEvent::Keepalive { .. } => vec![],
    }
}

/// Toast for events that are shown regardless of which session is focused.
pub fn advisory_notice(event: &ServerEvent) -> Option<Effect> {
    match event {
        ServerEvent::TimeoutWarning { message, .. } => {
            Some(Effect::notify(NoticeLevel::Warn, message.clone()))
        }
        ServerEvent::RetryAttempt {
            attempt,
            max_attempts,
            message,
            ..
        } => Some(Effect::notify(
            NoticeLevel::Warn,
            format!("Retrying ({attempt}/{max_attempts}): {message}"),
        )),
        _ => None,
    }
}

fn handle_assistant_message(
    state: &mut SessionState,
    content: &str,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    if content.is_empty() {
        return vec![];
    }

    let Some(blocks) = state.ensure_assistant_blocks(now) else {
        return vec![];
    };
    match blocks.last_mut() {
        Some(ContentBlock::Text { text }) => text.push_str(content),
        _ => blocks.push(ContentBlock::text(content)),
    }

    state.loading = true;
    state.activity.enter(ActivityStatus::Writing);
    vec![]
}

fn handle_thinking_start(state: &mut SessionState, now: DateTime<Utc>) -> Vec<Effect> {
    let Some(blocks) = state.ensure_assistant_blocks(now) else {
        return vec![];
    };
    blocks.push(ContentBlock::thinking(""));

    state.loading = true;
    state.activity.enter(ActivityStatus::Thinking);
    vec![]
}

fn handle_thinking_delta(state: &mut SessionState, content: &str) -> Vec<Effect> {
    match state
        .open_assistant_blocks()
        .and_then(|blocks| blocks.last_mut())
    {
        Some(ContentBlock::Thinking { thinking }) => thinking.push_str(content),
        _ => trace!(target: "switchboard.reduce", "thinking delta without open thinking block"),
    }
    vec![]
}

fn handle_tool_use(
    state: &mut SessionState,
    tool_id: &str,
    tool_name: &str,
    tool_input: &serde_json::Value,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let Some(blocks) = state.ensure_assistant_blocks(now) else {
        return vec![];
    };

    let tool = ToolUse::new(tool_id, tool_name, tool_input.clone());
    match nesting::place_tool_use(blocks, tool) {
        Placement::Duplicate => {
            debug!(target: "switchboard.reduce", %tool_id, "ignoring duplicate tool_use");
            return vec![];
        }
        Placement::Nested { parent_id } => {
            trace!(target: "switchboard.reduce", %tool_id, %parent_id, "nested tool call");
        }
        Placement::TopLevel => {}
    }

    let file = FILE_INPUT_KEYS
        .iter()
        .find_map(|key| tool_input.get(*key).and_then(serde_json::Value::as_str))
        .map(str::to_string);

    state.loading = true;
    state.activity.enter_tool(tool_id, tool_name, file);
    vec![]
}

fn handle_tool_result(
    state: &mut SessionState,
    tool_id: &str,
    result: &serde_json::Value,
    is_error: bool,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let Some(blocks) = state.ensure_assistant_blocks(now) else {
        return vec![];
    };

    let seen = blocks.iter().any(|block| {
        matches!(block, ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == tool_id)
    });
    if seen {
        debug!(target: "switchboard.reduce", %tool_id, "ignoring duplicate tool_result");
        return vec![];
    }

    blocks.push(ContentBlock::ToolResult {
        tool_use_id: tool_id.to_string(),
        content: result.clone(),
        is_error,
    });

    state.activity.enter(ActivityStatus::Thinking);
    vec![]
}

fn handle_error(
    state: &mut SessionState,
    error_type: Option<&str>,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let message = message
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_ERROR_MESSAGE);
    let icon = ErrorKind::classify(error_type).icon();

    if let Some(blocks) = state.ensure_assistant_blocks(now) {
        blocks.push(ContentBlock::text(format!("{icon} {message}")));
    }

    let mut effects = vec![Effect::notify(NoticeLevel::Error, message)];
    effects.extend(finish_turn(state, TurnOutcome::Failed));
    effects
}

fn finish_turn(state: &mut SessionState, outcome: TurnOutcome) -> Vec<Effect> {
    state.loading = false;
    state.live_output_tokens = 0;
    state.activity.finish(match outcome {
        TurnOutcome::Completed => ActivityStatus::Completed,
        TurnOutcome::Failed => ActivityStatus::Error,
    });

    vec![Effect::TurnFinalized {
        session_id: state.session_id.clone(),
        outcome,
    }]
}

fn handle_title_updated(
    state: &mut SessionState,
    new_title: &str,
    target: Option<&SessionId>,
) -> Vec<Effect> {
    let target = target.or(state.session_id.as_ref()).cloned();
    if target.is_none() || target == state.session_id {
        state.title = Some(new_title.to_string());
    }

    target
        .map(|session_id| Effect::TitleUpdated {
            session_id,
            title: new_title.to_string(),
        })
        .into_iter()
        .collect()
}

fn set_process_status(state: &mut SessionState, bash_id: &str, status: ProcessStatus) {
    match state.background_processes.get_mut(bash_id) {
        Some(process) => process.status = status,
        None => trace!(target: "switchboard.reduce", %bash_id, "status for unknown background process"),
    }
}

fn handle_command_started(
    state: &mut SessionState,
    bash_id: &str,
    command: &str,
    command_type: &str,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    if find_command(state, bash_id).is_some() {
        debug!(target: "switchboard.reduce", %bash_id, "ignoring duplicate long-running command");
        return vec![];
    }

    let Some(blocks) = state.ensure_assistant_blocks(now) else {
        return vec![];
    };
    blocks.push(ContentBlock::LongRunningCommand(LongRunningCommand {
        bash_id: bash_id.to_string(),
        command: command.to_string(),
        command_type: command_type.to_string(),
        description: description.map(str::to_string),
        updates: Vec::new(),
        completed: None,
        exit_code: None,
    }));
    vec![]
}

/// Latest long-running command block with `bash_id`, searching newest messages
/// first.
fn find_command<'a>(state: &'a mut SessionState, bash_id: &str) -> Option<&'a mut LongRunningCommand> {
    state
        .messages
        .iter_mut()
        .rev()
        .filter_map(|message| message.blocks_mut())
        .flat_map(|blocks| blocks.iter_mut().rev())
        .find_map(|block| match block {
            ContentBlock::LongRunningCommand(command) if command.bash_id == bash_id => {
                Some(command)
            }
            _ => None,
        })
}
