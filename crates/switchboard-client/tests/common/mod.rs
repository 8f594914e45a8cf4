use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use switchboard_client::{
    ClientConfig, InMemorySessionDirectory, SessionController, SessionSummary, SlashCommand,
};
use switchboard_core::{EventEnvelope, PersistedMessage, Role, SessionId, decode_value};

pub const WORKDIR: &str = "/work/app";

pub fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + minutes * 60, 0).unwrap()
}

pub fn summary(id: &str, minutes: i64) -> SessionSummary {
    SessionSummary {
        id: SessionId::from(id),
        title: Some(format!("Session {id}")),
        mode: Some("default".to_string()),
        permission_mode: Some(format!("perm-{id}")),
        working_directory: Some(PathBuf::from(WORKDIR)),
        updated_at: at(minutes),
    }
}

pub fn row(id: &str, role: Role, content: &str) -> PersistedMessage {
    PersistedMessage {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp: at(0),
    }
}

/// Sessions `a`, `b`, `c`, listed newest first in that order.
pub fn directory() -> Arc<InMemorySessionDirectory> {
    let directory = InMemorySessionDirectory::new();
    for (id, minutes) in [("a", 30), ("b", 20), ("c", 10)] {
        directory.insert_session(summary(id, minutes)).unwrap();
        directory
            .put_messages(
                &SessionId::from(id),
                vec![
                    row(&format!("{id}-1"), Role::User, "hello"),
                    row(
                        &format!("{id}-2"),
                        Role::Assistant,
                        &json!([{"type": "text", "text": format!("reply from {id}")}]).to_string(),
                    ),
                ],
            )
            .unwrap();
    }
    directory
        .put_commands(
            std::path::Path::new(WORKDIR),
            vec![SlashCommand {
                name: "review".to_string(),
                description: None,
            }],
        )
        .unwrap();
    Arc::new(directory)
}

pub async fn controller(directory: &Arc<InMemorySessionDirectory>) -> SessionController {
    let mut controller = SessionController::new(directory.clone(), ClientConfig::default());
    controller.refresh_sessions().await.unwrap();
    controller
}

pub fn event(session: Option<&str>, mut value: Value) -> EventEnvelope {
    if let Some(session) = session {
        value["sessionId"] = json!(session);
    }
    decode_value(value).unwrap()
}

pub fn text(session: &str, content: &str) -> EventEnvelope {
    event(
        Some(session),
        json!({"type": "assistant_message", "content": content}),
    )
}

pub fn tool(session: &str, name: &str, id: &str) -> EventEnvelope {
    event(
        Some(session),
        json!({"type": "tool_use", "toolId": id, "toolName": name, "toolInput": {}}),
    )
}

pub fn result(session: &str) -> EventEnvelope {
    event(Some(session), json!({"type": "result"}))
}

pub fn id(value: &str) -> SessionId {
    SessionId::from(value)
}
