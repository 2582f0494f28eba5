use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use muse_chat::identity::TokenKeys;
use muse_types::ParticipantRef;
use muse_types::api::Claims;
use muse_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Drive one WebSocket connection: Identify handshake, Ready, then forward
/// every event addressed to the identified participant until either side
/// goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, keys: TokenKeys) {
    let (mut sender, mut receiver) = socket.split();

    let claims = match wait_for_identify(&mut receiver, &keys, IDENTIFY_TIMEOUT).await {
        Some(claims) => claims,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };
    let participant = claims.participant();

    // Subscribe before Ready so nothing published after the handshake is missed.
    let events = dispatcher.subscribe();

    info!(
        "{} ({}) connected to gateway, {} live connections",
        claims.name,
        participant,
        dispatcher.connection_count()
    );

    if !send_event(&mut sender, &GatewayEvent::Ready { participant }).await {
        return;
    }

    run_connection_loop(sender, receiver, events, participant).await;

    info!("{} ({}) disconnected from gateway", claims.name, participant);
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut events: tokio::sync::broadcast::Receiver<GatewayEvent>,
    participant: ParticipantRef,
) {
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = events.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("{} lagged by {} events", participant, n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if !event.is_for(&participant) {
                        continue;
                    }

                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout for {} (missed {} pongs), dropping connection", participant, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(GatewayCommand::Identify { .. }) => {
                        debug!("{} sent Identify twice, ignoring", participant);
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            participant,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Returns false once the client is gone.
async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &GatewayEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode gateway event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}

/// Resolve an Identify command through the identity path of the kind it
/// declares.
fn identify(command: GatewayCommand, keys: &TokenKeys) -> Option<Claims> {
    let GatewayCommand::Identify { token, kind } = command;

    match keys.resolve(&token, kind) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!("Identify as {} refused: {}", kind, e);
            None
        }
    }
}

/// Frames other than Identify are skipped. The first Identify decides:
/// a token that does not resolve closes the handshake.
async fn wait_for_identify<S>(receiver: &mut S, keys: &TokenKeys, timeout: Duration) -> Option<Claims>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let handshake = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(command) = serde_json::from_str::<GatewayCommand>(&text) {
                    return identify(command, keys);
                }
            }
        }
        None
    };

    tokio::time::timeout(timeout, handshake).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use serde_json::json;

    use muse_types::ParticipantRef;

    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::from_secret("gateway-test-secret")
    }

    fn identify_frame(token: &str, kind: &str) -> Result<Message, axum::Error> {
        let text = json!({"type": "Identify", "data": {"token": token, "kind": kind}}).to_string();
        Ok(Message::Text(text.into()))
    }

    #[tokio::test]
    async fn identify_resolves_on_the_declared_kind() {
        let keys = keys();
        let token = keys.issue(ParticipantRef::Artist(3), "Maya").unwrap();
        let mut frames = stream::iter(vec![identify_frame(&token, "artist")]);

        let claims = wait_for_identify(&mut frames, &keys, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(claims.participant(), ParticipantRef::Artist(3));
    }

    #[tokio::test]
    async fn user_token_declared_as_artist_is_refused() {
        let keys = keys();
        let token = keys.issue(ParticipantRef::User(3), "Rina").unwrap();
        let mut frames = stream::iter(vec![identify_frame(&token, "artist")]);

        assert!(wait_for_identify(&mut frames, &keys, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn unrelated_frames_before_identify_are_skipped() {
        let keys = keys();
        let token = keys.issue(ParticipantRef::User(8), "Rina").unwrap();
        let mut frames = stream::iter(vec![
            Ok(Message::Ping(Bytes::new())),
            Ok(Message::Text("not json".into())),
            identify_frame(&token, "user"),
        ]);

        let claims = wait_for_identify(&mut frames, &keys, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(claims.participant(), ParticipantRef::User(8));
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let mut frames = stream::pending::<Result<Message, axum::Error>>();
        assert!(
            wait_for_identify(&mut frames, &keys(), Duration::from_millis(50))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn closed_stream_without_identify_fails() {
        let mut frames = stream::iter(Vec::<Result<Message, axum::Error>>::new());
        assert!(wait_for_identify(&mut frames, &keys(), Duration::from_secs(1)).await.is_none());
    }

    #[test]
    fn identify_rejects_garbage_token() {
        let command = GatewayCommand::Identify {
            token: "garbage".to_string(),
            kind: muse_types::ParticipantKind::User,
        };
        assert!(identify(command, &keys()).is_none());
    }
}
