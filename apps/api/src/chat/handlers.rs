//! Axum route handlers for counsellor conversations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::chat::prompts::counsellor_system;
use crate::errors::AppError;
use crate::llm_client::{ChatTurn, TurnRole};
use crate::models::chat::{ConversationRow, MessageRow};
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 4_000;
/// Messages of history (including the new one) sent to the model.
pub const HISTORY_WINDOW: i64 = 20;
const TITLE_CHARS: usize = 60;
const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub user_message: MessageRow,
    pub reply: MessageRow,
}

/// POST /api/v1/chat/conversations
pub async fn handle_create_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<CreateConversationRequest>>,
) -> Result<(StatusCode, Json<ConversationRow>), AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let title = req
        .title
        .map(|t| t.trim().chars().take(MAX_TITLE_CHARS).collect::<String>())
        .filter(|t| !t.is_empty());

    let conversation = sqlx::query_as::<_, ConversationRow>(
        "INSERT INTO chat_conversations (user_id, title) VALUES ($1, $2) RETURNING *",
    )
    .bind(auth.id)
    .bind(&title)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/v1/chat/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConversationRow>>, AppError> {
    let conversations = sqlx::query_as::<_, ConversationRow>(
        "SELECT * FROM chat_conversations WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(conversations))
}

/// GET /api/v1/chat/conversations/:id/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    owned_conversation(&state, auth, conversation_id).await?;
    let messages = sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM chat_messages WHERE conversation_id = $1 ORDER BY created_at, id",
    )
    .bind(conversation_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(messages))
}

/// POST /api/v1/chat/conversations/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), AppError> {
    let content = req.content.trim().to_string();
    let length = content.chars().count();
    if length == 0 || length > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message content must be 1 to {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let conversation = owned_conversation(&state, auth, conversation_id).await?;

    let mut recent = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT * FROM chat_messages
        WHERE conversation_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(conversation_id)
    .bind(HISTORY_WINDOW - 1)
    .fetch_all(&state.db)
    .await?;
    recent.reverse();

    let user_name: String = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_one(&state.db)
        .await?;

    // Both messages are stored only once the model has answered.
    let turns = prompt_turns(&recent, &content);
    let reply_text = state
        .llm
        .call_text(&turns, &counsellor_system(&user_name))
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let mut tx = state.db.begin().await?;
    let user_message = insert_message(&mut tx, conversation_id, "user", &content).await?;
    let reply = insert_message(&mut tx, conversation_id, "assistant", &reply_text).await?;

    if conversation.title.is_none() {
        let title: String = content.chars().take(TITLE_CHARS).collect();
        sqlx::query("UPDATE chat_conversations SET title = $1 WHERE id = $2 AND title IS NULL")
            .bind(title.trim())
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("UPDATE chat_conversations SET updated_at = now() WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "Chat reply in conversation {} ({} history messages)",
        conversation_id,
        turns.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            user_message,
            reply,
        }),
    ))
}

/// Stored history followed by the message being sent.
pub fn prompt_turns(history: &[MessageRow], content: &str) -> Vec<ChatTurn> {
    let mut turns = history_turns(history);
    turns.push(ChatTurn {
        role: TurnRole::User,
        content: content.to_string(),
    });
    turns
}

/// Uses `clock_timestamp()` so rows written in one transaction keep their order.
async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
    role: &str,
    content: &str,
) -> Result<MessageRow, AppError> {
    let row = sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO chat_messages (conversation_id, role, content, created_at)
        VALUES ($1, $2, $3, clock_timestamp())
        RETURNING *
        "#,
    )
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

/// Converts stored messages to API turns. The Messages API requires the
/// first turn to come from the user, so leading assistant turns are dropped.
pub fn history_turns(messages: &[MessageRow]) -> Vec<ChatTurn> {
    messages
        .iter()
        .map(|m| ChatTurn {
            role: if m.role == "assistant" {
                TurnRole::Assistant
            } else {
                TurnRole::User
            },
            content: m.content.clone(),
        })
        .skip_while(|t| t.role == TurnRole::Assistant)
        .collect()
}

async fn owned_conversation(
    state: &AppState,
    auth: AuthUser,
    conversation_id: Uuid,
) -> Result<ConversationRow, AppError> {
    sqlx::query_as::<_, ConversationRow>(
        "SELECT * FROM chat_conversations WHERE id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(auth.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(role: &str, content: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_history_turns_map_roles() {
        let turns = history_turns(&[
            message("user", "How do I get into data science?"),
            message("assistant", "Start with statistics."),
            message("user", "Which course?"),
        ]);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(turns[2].content, "Which course?");
    }

    #[test]
    fn test_prompt_turns_end_with_new_message() {
        let turns = prompt_turns(
            &[
                message("user", "Is a masters worth it?"),
                message("assistant", "It depends on the field."),
            ],
            "For embedded systems?",
        );
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].role, TurnRole::User);
        assert_eq!(turns[2].content, "For embedded systems?");
    }

    #[test]
    fn test_prompt_turns_without_history() {
        let turns = prompt_turns(&[], "hello");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
    }

    #[test]
    fn test_history_turns_drop_leading_assistant() {
        let turns = history_turns(&[message("assistant", "cut off"), message("user", "hi")]);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
    }
}
