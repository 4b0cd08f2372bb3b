//! End-to-end tests over a real listener: REST with `reqwest`, push
//! events with `tokio-tungstenite`.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use progressia::api::build_app;
use progressia::app_state::AppState;
use progressia::config::GameRules;
use progressia::domain::{EventBus, RateLimiter};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

async fn spawn_server(rate_limiter: RateLimiter) -> SocketAddr {
    let state = AppState::new(GameRules::default(), EventBus::new(256), rate_limiter);
    let app = build_app(state, Duration::from_secs(10));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn start() -> (reqwest::Client, String, SocketAddr) {
    let addr = spawn_server(RateLimiter::new(1_000, 60)).await;
    (reqwest::Client::new(), format!("http://{addr}"), addr)
}

async fn send_json(request: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let response = tokio_test::assert_ok!(request.send().await);
    let status = response.status();
    let body = tokio_test::assert_ok!(response.json::<Value>().await);
    (status, body)
}

async fn create_user(client: &reqwest::Client, base: &str, name: &str, plan: &str) -> String {
    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/users"))
            .json(&json!({ "display_name": name, "plan": plan })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let Some(id) = body["id"].as_str() else {
        panic!("user id missing: {body}");
    };
    id.to_string()
}

#[tokio::test]
async fn health_and_rewards_config() {
    let (client, base, _) = start().await;
    let (status, body) = send_json(client.get(format!("{base}/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["users"], 0);

    let (status, body) = send_json(client.get(format!("{base}/config/rewards"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz_pass_percent"], 70);
    let Some(leagues) = body["leagues"].as_array() else {
        panic!("leagues missing");
    };
    assert_eq!(leagues.len(), 4);
}

#[tokio::test]
async fn first_lesson_awards_xp_and_starts_streak() {
    let (client, base, _) = start().await;
    let user = create_user(&client, &base, "Ana", "FREE").await;

    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/lessons/presupuesto-101/complete"))
            .json(&json!({ "user_id": user })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["first_completion"], true);
    assert_eq!(body["total_xp"], 10);
    assert_eq!(body["streak"]["current_streak"], 1);

    let (_, profile) = send_json(client.get(format!("{base}/api/v1/users/{user}"))).await;
    assert_eq!(profile["total_xp"], 10);
    assert_eq!(profile["lessons_completed"], 1);
    assert_eq!(profile["league"], "BRONZE");

    let (_, progress) = send_json(client.get(format!("{base}/api/v1/users/{user}/progress"))).await;
    assert_eq!(progress["completed"], 1);
}

#[tokio::test]
async fn repeated_idempotency_key_awards_once() {
    let (client, base, _) = start().await;
    let user = create_user(&client, &base, "Luis", "FREE").await;
    let award = json!({ "type": "QUIZ_PASS", "amount": 40, "idempotency_key": "promo-octubre" });

    let (status, first) = send_json(
        client
            .post(format!("{base}/api/v1/users/{user}/xp"))
            .json(&award),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["duplicate"], false);
    assert_eq!(first["total_xp"], 40);

    let (_, second) = send_json(
        client
            .post(format!("{base}/api/v1/users/{user}/xp"))
            .json(&award),
    )
    .await;
    assert_eq!(second["duplicate"], true);
    assert_eq!(second["total_xp"], 40);

    let (_, events) = send_json(client.get(format!("{base}/api/v1/users/{user}/xp-events"))).await;
    assert_eq!(events["pagination"]["total"], 1);
}

#[tokio::test]
async fn caller_key_does_not_block_the_lesson_award() {
    let (client, base, _) = start().await;
    let user = create_user(&client, &base, "Pablo", "FREE").await;
    let (status, _) = send_json(
        client
            .post(format!("{base}/api/v1/users/{user}/xp"))
            .json(&json!({ "type": "CHALLENGE_PARTICIPATE", "idempotency_key": "lesson:presupuesto-101" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/lessons/presupuesto-101/complete"))
            .json(&json!({ "user_id": user })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["awards"][0]["type"], "LESSON_COMPLETE");
    assert_eq!(body["awards"][0]["awarded"], 10);
    assert_eq!(body["awards"][0]["duplicate"], false);
    assert_eq!(body["total_xp"], 20);
}

#[tokio::test]
async fn leaderboard_ranks_by_weekly_xp() {
    let (client, base, _) = start().await;
    let ana = create_user(&client, &base, "Ana", "FREE").await;
    let luis = create_user(&client, &base, "Luis", "FREE").await;
    for (user, amount) in [(&ana, 30), (&luis, 80)] {
        let (status, _) = send_json(
            client
                .post(format!("{base}/api/v1/users/{user}/xp"))
                .json(&json!({ "type": "QUIZ_PASS", "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, board) = send_json(client.get(format!("{base}/api/v1/leaderboard"))).await;
    assert_eq!(status, StatusCode::OK);
    let Some(entries) = board["entries"].as_array() else {
        panic!("entries missing: {board}");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["user_id"], luis.as_str());
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["weekly_xp"], 30);

    let (status, body) = send_json(
        client.get(format!("{base}/api/v1/leaderboard?friends_only=true")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn errors_use_structured_bodies() {
    let (client, base, _) = start().await;
    let unknown = uuid::Uuid::new_v4();
    let (status, body) = send_json(client.get(format!("{base}/api/v1/users/{unknown}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);

    let user = create_user(&client, &base, "Marta", "FREE").await;
    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/lessons/credito-101/complete"))
            .json(&json!({ "user_id": user })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 4002);

    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/lessons/regla-50-30-20/complete"))
            .json(&json!({ "user_id": user })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 4001);

    let (status, body) = send_json(
        client
            .post(format!("{base}/api/v1/users/{user}/xp"))
            .json(&json!({ "type": "QUIZ_PASS", "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn xp_endpoint_is_rate_limited() {
    let addr = spawn_server(RateLimiter::new(2, 60)).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");
    let user = create_user(&client, &base, "Rosa", "FREE").await;
    let url = format!("{base}/api/v1/users/{user}/xp");

    for _ in 0..2 {
        let (status, _) = send_json(client.post(&url).json(&json!({ "type": "QUIZ_PASS", "amount": 5 }))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send_json(client.post(&url).json(&json!({ "type": "QUIZ_PASS", "amount": 5 }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], 429);
}

#[tokio::test]
async fn challenge_between_friends_resolves_at_goal() {
    let (client, base, _) = start().await;
    let ana = create_user(&client, &base, "Ana", "FREE").await;
    let luis = create_user(&client, &base, "Luis", "FREE").await;

    let (status, _) = send_json(
        client
            .post(format!("{base}/api/v1/friends"))
            .json(&json!({ "requester_id": ana, "addressee_id": luis })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send_json(
        client
            .post(format!("{base}/api/v1/friends/accept"))
            .json(&json!({ "addressee_id": luis, "requester_id": ana })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, challenge) = send_json(client.post(format!("{base}/api/v1/challenges")).json(&json!({
        "kind": "DUEL",
        "title": "Semana del ahorro",
        "creator_id": ana,
        "invitee_ids": [luis],
        "goal_xp": 50,
    })))
    .await;
    assert_eq!(status, StatusCode::CREATED, "{challenge}");
    let Some(challenge_id) = challenge["id"].as_str() else {
        panic!("challenge id missing");
    };

    let (status, body) = send_json(
        client.post(format!("{base}/api/v1/challenges/{challenge_id}/resolve")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 2009);

    let (_, _) = send_json(
        client
            .post(format!("{base}/api/v1/users/{ana}/xp"))
            .json(&json!({ "type": "QUIZ_PASS", "amount": 60 })),
    )
    .await;
    let (status, view) = send_json(
        client.post(format!("{base}/api/v1/challenges/{challenge_id}/resolve")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{view}");
    assert_eq!(view["challenge"]["status"], "COMPLETED");
    assert_eq!(view["challenge"]["winners"][0], ana.as_str());

    let (status, body) = send_json(
        client.post(format!("{base}/api/v1/challenges/{challenge_id}/resolve")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 4004);
}

#[tokio::test]
async fn websocket_pushes_events_for_followed_users() {
    let (client, base, addr) = start().await;
    let user = create_user(&client, &base, "Ana", "FREE").await;

    let Ok((mut socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await
    else {
        panic!("ws connect failed");
    };
    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "subscribe", "user_ids": [user] },
    });
    tokio_test::assert_ok!(socket.send(Message::text(subscribe.to_string())).await);

    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["count"], 1);

    let (status, _) = send_json(
        client
            .post(format!("{base}/api/v1/users/{user}/xp"))
            .json(&json!({ "type": "QUIZ_PASS", "amount": 15 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let event = next_json(&mut socket).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "xp_awarded");
    assert_eq!(event["payload"]["amount"], 15);
}

async fn next_json<S>(socket: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let Ok(Some(Ok(frame))) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
        else {
            panic!("no frame before timeout");
        };
        if let Message::Text(text) = frame {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("frame is not JSON");
            };
            return value;
        }
    }
}
