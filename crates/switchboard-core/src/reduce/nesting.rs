//! Assigns sub-agent tool calls to the `Task` block that most plausibly spawned
//! them.
//!
//! The stream carries no parent id for tool calls made inside a sub-agent, so
//! calls are spread round-robin over the `Task` blocks that are still open. A
//! `Task` stays open until a `Text` block follows it in the same message.

use crate::conversation::{ContentBlock, ToolUse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    TopLevel,
    Nested { parent_id: String },
    Duplicate,
}

/// Indices of open `Task` blocks, oldest first.
pub fn active_task_indices(blocks: &[ContentBlock]) -> Vec<usize> {
    let mut active = Vec::new();
    for (index, block) in blocks.iter().enumerate().rev() {
        match block {
            ContentBlock::Text { .. } => break,
            ContentBlock::ToolUse(tool) if tool.is_task() => active.push(index),
            _ => {}
        }
    }
    active.reverse();
    active
}

/// True if any tool call in the message, nested or not, carries `id`.
pub fn contains_tool_id(blocks: &[ContentBlock], id: &str) -> bool {
    blocks
        .iter()
        .filter_map(ContentBlock::as_tool_use)
        .any(|tool| tool.contains_id(id))
}

pub fn place_tool_use(blocks: &mut Vec<ContentBlock>, tool: ToolUse) -> Placement {
    if contains_tool_id(blocks, &tool.id) {
        return Placement::Duplicate;
    }

    let active = active_task_indices(blocks);
    if tool.is_task() || active.is_empty() {
        blocks.push(ContentBlock::ToolUse(tool));
        return Placement::TopLevel;
    }

    let total: usize = active
        .iter()
        .filter_map(|&index| blocks[index].as_tool_use())
        .map(|task| task.nested_tools.len())
        .sum();
    let target = active[total % active.len()];

    match &mut blocks[target] {
        ContentBlock::ToolUse(task) => {
            let parent_id = task.id.clone();
            task.nested_tools.push(tool);
            Placement::Nested { parent_id }
        }
        _ => {
            blocks.push(ContentBlock::ToolUse(tool));
            Placement::TopLevel
        }
    }
}
