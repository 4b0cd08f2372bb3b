//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{GamificationEvent, UserId};
use crate::service::GamificationService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events that concern a followed user.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<GamificationEvent>,
    gamification: Arc<GamificationService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(text.as_str(), &mut subs, &gamification).await;
                        if let Some(json) = reply
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches_any(&event.user_ids()) {
                            continue;
                        }
                        let payload = match serde_json::to_value(&event) {
                            Ok(payload) => payload,
                            Err(err) => {
                                tracing::warn!(error = %err, "event could not be encoded");
                                continue;
                            }
                        };
                        let msg = WsMessage::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload);
                        if let Some(json) = encode(&msg)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text frame, returning the JSON reply if any.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    gamification: &GamificationService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return encode(&WsMessage::error("", 400, "malformed JSON"));
    };
    if msg.msg_type != WsMessageType::Command {
        return encode(&WsMessage::error(msg.id, 400, "expected a command message"));
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return encode(&WsMessage::error(msg.id, 404, "unknown command"));
    };

    let reply = match command {
        WsCommand::Subscribe { user_ids } => {
            let wildcard = user_ids.iter().any(|s| s == "*");
            let ids = parse_user_ids(&user_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { user_ids } => {
            let ids = parse_user_ids(&user_ids);
            subs.unsubscribe(&ids);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::GetProfile { user_id } => {
            let Some(user_id) = parse_user_id(&user_id) else {
                return encode(&WsMessage::error(msg.id, 400, "invalid user id"));
            };
            match gamification.profile(user_id, Utc::now()).await {
                Ok(summary) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::to_value(&summary).unwrap_or_default(),
                ),
                Err(err) => WsMessage::error(msg.id, err.error_code(), &err.to_string()),
            }
        }
    };
    encode(&reply)
}

fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.parse::<uuid::Uuid>().ok().map(UserId::from_uuid)
}

/// Valid ids among `raw`; `"*"` and garbage are skipped.
fn parse_user_ids(raw: &[String]) -> Vec<UserId> {
    raw.iter().filter_map(|s| parse_user_id(s)).collect()
}

fn encode(msg: &WsMessage) -> Option<String> {
    serde_json::to_string(msg).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::GameRules;
    use crate::domain::{EventBus, Store};

    fn make_service() -> GamificationService {
        GamificationService::new(Arc::new(Store::new()), EventBus::new(16), GameRules::default())
    }

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": "1",
            "type": "command",
            "timestamp": Utc::now(),
            "payload": payload,
        })
        .to_string()
    }

    fn reply(json: Option<String>) -> serde_json::Value {
        let Some(json) = json else {
            panic!("expected a reply");
        };
        let Ok(value) = serde_json::from_str(&json) else {
            panic!("reply is not JSON");
        };
        value
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe() {
        let service = make_service();
        let mut subs = SubscriptionManager::new();
        let id = UserId::new();
        let text = command(serde_json::json!({
            "command": "subscribe",
            "user_ids": [id.to_string(), "not-a-uuid"],
        }));
        let value = reply(handle_text_message(&text, &mut subs, &service).await);
        assert_eq!(value["type"], "response");
        assert_eq!(value["payload"]["count"], 1);
        assert!(subs.matches_any(&[id]));

        let text = command(serde_json::json!({ "command": "unsubscribe", "user_ids": [id.to_string()] }));
        let value = reply(handle_text_message(&text, &mut subs, &service).await);
        assert_eq!(value["payload"]["remaining_count"], 0);
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_get_errors() {
        let service = make_service();
        let mut subs = SubscriptionManager::new();
        let value = reply(handle_text_message("{nope", &mut subs, &service).await);
        assert_eq!(value["payload"]["code"], 400);

        let text = command(serde_json::json!({ "command": "swap" }));
        let value = reply(handle_text_message(&text, &mut subs, &service).await);
        assert_eq!(value["payload"]["code"], 404);
    }

    #[tokio::test]
    async fn get_profile_reports_unknown_users() {
        let service = make_service();
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({
            "command": "get_profile",
            "user_id": UserId::new().to_string(),
        }));
        let value = reply(handle_text_message(&text, &mut subs, &service).await);
        assert_eq!(value["type"], "error");
        assert_eq!(value["payload"]["code"], 2001);
    }
}
