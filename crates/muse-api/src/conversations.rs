use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};

use muse_chat::service::{ConversationSummary, Inbox, Thread};
use muse_types::api::{
    ApiResponse, ConversationResponse, InboxResponse, MarkReadResponse, MessageResponse, SendMessageRequest,
    ThreadMessage, ThreadMeta, ThreadResponse, UnreadResponse,
};
use muse_types::models::Message;
use muse_types::{AccountId, ParticipantKind, ParticipantRef};

use crate::error::ApiError;
use crate::middleware::Caller;
use crate::state::{AppState, run_blocking};

type Counterpart = Result<Path<(String, String)>, PathRejection>;

/// `{kind}/{id}` of a conversation route. An unknown kind names nothing
/// that can exist (404); a non-numeric id is malformed input (422).
fn counterpart(path: Counterpart) -> Result<ParticipantRef, ApiError> {
    let Path((kind, id)) = path?;
    let kind: ParticipantKind = kind.parse().map_err(|_| ApiError::UnknownConversation)?;
    let id: AccountId = id
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("invalid participant id '{id}'")))?;
    Ok(ParticipantRef::new(kind, id))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(Caller(me)): Extension<Caller>,
) -> Result<Json<ApiResponse<InboxResponse>>, ApiError> {
    let messaging = state.messaging.clone();
    let inbox = run_blocking(move || Ok(messaging.list_threads(&me)?)).await?;

    Ok(Json(ApiResponse::ok("conversations retrieved", inbox_response(inbox))))
}

/// Opening a conversation marks everything the counterpart sent as read.
pub async fn open(
    State(state): State<AppState>,
    Extension(Caller(me)): Extension<Caller>,
    path: Counterpart,
) -> Result<Json<ApiResponse<ThreadResponse>>, ApiError> {
    let them = counterpart(path)?;
    let messaging = state.messaging.clone();
    let thread = run_blocking(move || Ok(messaging.open_thread(&me, &them)?)).await?;

    Ok(Json(ApiResponse::ok("conversation retrieved", thread_response(&me, thread))))
}

pub async fn send(
    State(state): State<AppState>,
    Extension(Caller(me)): Extension<Caller>,
    path: Counterpart,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let them = counterpart(path)?;
    let Json(req) = payload?;

    let messaging = state.messaging.clone();
    let message = run_blocking(move || Ok(messaging.send(&me, &them, &req.message)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("message sent", message_response(message))),
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(Caller(me)): Extension<Caller>,
    path: Counterpart,
) -> Result<Json<ApiResponse<MarkReadResponse>>, ApiError> {
    let them = counterpart(path)?;
    let messaging = state.messaging.clone();
    let updated = run_blocking(move || Ok(messaging.mark_read(&me, &them)?)).await?;

    Ok(Json(ApiResponse::ok("messages marked as read", MarkReadResponse { updated })))
}

pub async fn unread(
    State(state): State<AppState>,
    Extension(Caller(me)): Extension<Caller>,
    path: Counterpart,
) -> Result<Json<ApiResponse<UnreadResponse>>, ApiError> {
    let them = counterpart(path)?;
    let messaging = state.messaging.clone();
    let unread = run_blocking(move || Ok(messaging.unread_from(&me, &them)?)).await?;

    Ok(Json(ApiResponse::ok("unread count retrieved", UnreadResponse { unread })))
}

fn message_response(message: Message) -> MessageResponse {
    MessageResponse {
        id: message.id,
        message: message.body,
        sender: message.sender,
        receiver: message.receiver,
        is_read: message.is_read,
        created_at: message.created_at,
        updated_at: message.updated_at,
    }
}

fn thread_response(me: &ParticipantRef, thread: Thread) -> ThreadResponse {
    let messages: Vec<ThreadMessage> = thread
        .messages
        .iter()
        .map(|m| ThreadMessage {
            sender_data: thread.profile_of(&m.sender).clone(),
            receiver_data: thread.profile_of(&m.receiver).clone(),
            is_me: m.sender == *me,
            message: message_response(m.clone()),
        })
        .collect();

    ThreadResponse {
        meta: ThreadMeta {
            total_messages: messages.len(),
            unread_count: thread.unread_before_open as u64,
        },
        me: thread.caller,
        counterpart: thread.counterpart,
        messages,
    }
}

fn conversation_response(summary: ConversationSummary) -> ConversationResponse {
    ConversationResponse {
        counterpart: summary.counterpart,
        latest_message_id: summary.latest.id,
        latest_message: summary.latest.body,
        latest_at: summary.latest.created_at,
        message_count: summary.message_count,
        unread_count: summary.unread_count,
    }
}

fn inbox_response(inbox: Inbox) -> InboxResponse {
    InboxResponse {
        conversations: inbox.conversations.into_iter().map(conversation_response).collect(),
        total_messages: inbox.total_messages,
        unread_total: inbox.unread_total,
    }
}
