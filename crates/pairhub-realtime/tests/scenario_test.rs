//! End-to-end scenarios driven through in-process connections.
//!
//! Each test talks to the engine exactly the way the socket layer does:
//! inbound frames go through `handle_frame`, outbound traffic is read
//! from the connection's channel. Time is paused so the auth watchdog,
//! heartbeat supervisor, and request TTL are exercised deterministically.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use pairhub_core::config::RealtimeConfig;
use pairhub_core::traits::{IdentityError, IdentityVerifier, MembershipResolver};
use pairhub_core::types::identity::UserIdentity;
use pairhub_core::types::{IpHash, NetworkId, UserId};
use pairhub_realtime::RendezvousEngine;
use pairhub_realtime::connection::{ConnectionHandle, Outbound};

const SALT: &str = "test-salt";

/// Accepts any token of the form `tok_<user-id>`.
struct TestVerifier;

#[async_trait]
impl IdentityVerifier for TestVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Missing);
        }
        if token == "expired" {
            return Err(IdentityError::Expired);
        }
        let Some(user) = token.strip_prefix("tok_") else {
            return Err(IdentityError::Invalid);
        };
        Ok(UserIdentity {
            user_id: UserId::new(user),
            display_name: user.to_string(),
            email: format!("{user}@example.com"),
            provider_tag: "test".to_string(),
            roles: Vec::new(),
        })
    }
}

/// Fixed user → network table.
struct TestMembership(HashMap<UserId, NetworkId>);

#[async_trait]
impl MembershipResolver for TestMembership {
    async fn active_network(&self, user_id: &UserId) -> Option<NetworkId> {
        self.0.get(user_id).cloned()
    }
}

fn engine_with(networks: &[(&str, &str)]) -> Arc<RendezvousEngine> {
    let table = networks
        .iter()
        .map(|(user, net)| (UserId::new(*user), NetworkId::new(*net)))
        .collect();
    RendezvousEngine::new(
        RealtimeConfig {
            ip_salt: SALT.to_string(),
            ..RealtimeConfig::default()
        },
        Arc::new(TestVerifier),
        Arc::new(TestMembership(table)),
    )
}

type Client = (Arc<ConnectionHandle>, mpsc::Receiver<Outbound>);

async fn send(engine: &Arc<RendezvousEngine>, client: &Client, frame: Value) {
    engine.handle_frame(&client.0, &frame.to_string()).await;
}

/// Reads the next outbound item, which must be an application frame;
/// returns its parsed JSON.
async fn expect_frame(client: &mut Client) -> Value {
    match client.1.recv().await {
        Some(Outbound::Frame(text)) => serde_json::from_str(&text).expect("frame is JSON"),
        other => panic!("expected frame, got {other:?}"),
    }
}

/// Reads the next outbound item and asserts its event name, returning
/// the payload.
async fn expect_event(client: &mut Client, event: &str) -> Value {
    let frame = expect_frame(client).await;
    assert_eq!(frame["event"], event, "unexpected frame: {frame}");
    frame["data"].clone()
}

/// Reads the next outbound item, which must be a close with this code.
async fn expect_close(client: &mut Client, code: u16) {
    match client.1.recv().await {
        Some(Outbound::Close { code: got, .. }) => assert_eq!(got, code),
        other => panic!("expected close {code}, got {other:?}"),
    }
}

/// Asserts that nothing is queued for this client.
fn expect_silence(client: &mut Client) {
    if let Ok(item) = client.1.try_recv() {
        panic!("expected silence, got {item:?}");
    }
}

/// Discards everything currently queued.
fn drain(client: &mut Client) {
    while client.1.try_recv().is_ok() {}
}

/// Connects and authenticates `user`, asserting AUTH_SUCCESS.
async fn auth(engine: &Arc<RendezvousEngine>, user: &str, ip: &str) -> Client {
    let mut client = engine.connect(IpHash::from_addr(ip, SALT));
    send(
        engine,
        &client,
        json!({"event": "AUTH", "data": {"token": format!("tok_{user}")}}),
    )
    .await;
    let data = expect_event(&mut client, "AUTH_SUCCESS").await;
    assert_eq!(data["userId"], user);
    client
}

/// Connects, authenticates, and registers `user`.
async fn join(engine: &Arc<RendezvousEngine>, user: &str, ip: &str) -> Client {
    let mut client = auth(engine, user, ip).await;
    send(engine, &client, json!({"event": "PEER_REGISTER", "data": {}})).await;
    let data = expect_event(&mut client, "PEER_REGISTERED").await;
    assert_eq!(data["id"], user);
    assert_eq!(data["status"], "online");
    client
}

// ---------------------------------------------------------------------
// Authentication lifecycle
// ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn auth_timeout_closes_with_4001() {
    let engine = engine_with(&[]);
    let mut client = engine.connect(IpHash::unknown());

    tokio::time::advance(Duration::from_secs(10)).await;

    let data = expect_event(&mut client, "ERROR").await;
    assert_eq!(data["code"], "ERR_1001");
    expect_close(&mut client, 4001).await;
}

#[tokio::test(start_paused = true)]
async fn auth_completing_in_time_disarms_the_watchdog() {
    let engine = engine_with(&[]);
    let mut client = auth(&engine, "user_1", "10.0.0.1").await;

    tokio::time::advance(Duration::from_secs(15)).await;

    expect_silence(&mut client);
    assert!(!client.0.is_closed());
}

#[tokio::test(start_paused = true)]
async fn invalid_token_fails_auth_and_closes() {
    let engine = engine_with(&[]);
    let mut client = engine.connect(IpHash::unknown());

    send(&engine, &client, json!({"event": "AUTH", "data": {"token": "nope"}})).await;

    let data = expect_event(&mut client, "AUTH_FAILED").await;
    assert_eq!(data["code"], "ERR_1002");
    expect_close(&mut client, 4001).await;
    assert_eq!(engine.connection_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn expired_token_reports_err_1003() {
    let engine = engine_with(&[]);
    let mut client = engine.connect(IpHash::unknown());

    send(&engine, &client, json!({"event": "AUTH", "data": {"token": "expired"}})).await;

    let data = expect_event(&mut client, "AUTH_FAILED").await;
    assert_eq!(data["code"], "ERR_1003");
    expect_close(&mut client, 4001).await;
}

#[tokio::test(start_paused = true)]
async fn supersession_evicts_the_prior_connection() {
    let engine = engine_with(&[("user_1", "net_x")]);
    let mut first = join(&engine, "user_1", "10.0.0.1").await;

    tokio::time::advance(Duration::from_secs(3)).await;
    let mut second = auth(&engine, "user_1", "10.0.0.2").await;

    let data = expect_event(&mut first, "ERROR").await;
    assert_eq!(data["code"], "ERR_2005");
    expect_close(&mut first, 4002).await;

    send(&engine, &second, json!({"event": "PEER_REGISTER", "data": {}})).await;
    expect_event(&mut second, "PEER_REGISTERED").await;

    assert_eq!(engine.peer_count(), 1);
    assert_eq!(engine.connection_count(), 1);
}

// ---------------------------------------------------------------------
// Discovery and network isolation
// ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cross_network_peers_are_invisible_and_unpairable() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_y")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(&engine, &a, json!({"event": "DISCOVER_PEERS", "data": {}})).await;
    let data = expect_event(&mut a, "PEERS_LIST").await;
    assert_eq!(data["peers"], json!([]));

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_2007");
    expect_silence(&mut b);
}

#[tokio::test(start_paused = true)]
async fn null_network_peer_sees_empty_list() {
    let engine = engine_with(&[("user_b", "net_x")]);
    let mut unassigned = join(&engine, "user_a", "10.0.0.1").await;
    let _b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut unassigned);

    send(&engine, &unassigned, json!({"event": "DISCOVER_PEERS", "data": {}})).await;
    let data = expect_event(&mut unassigned, "PEERS_LIST").await;
    assert_eq!(data["peers"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn discovery_lists_network_peers_and_ignores_filters() {
    let engine = engine_with(&[
        ("user_a", "net_x"),
        ("user_b", "net_x"),
        ("user_c", "net_x"),
    ]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let _b = join(&engine, "user_b", "10.0.0.2").await;
    let _c = join(&engine, "user_c", "10.0.0.3").await;
    drain(&mut a);

    // Filters in the payload are ignored by design.
    send(
        &engine,
        &a,
        json!({"event": "DISCOVER_PEERS", "data": {"ide": "vscode", "lanOnly": true}}),
    )
    .await;
    let data = expect_event(&mut a, "PEERS_LIST").await;
    let ids: Vec<&str> = data["peers"]
        .as_array()
        .expect("peers is an array")
        .iter()
        .map(|p| p["id"].as_str().expect("id is a string"))
        .collect();
    assert_eq!(ids, vec!["user_b", "user_c"]);
}

#[tokio::test(start_paused = true)]
async fn registration_announces_with_per_recipient_connection_mode() {
    let engine = engine_with(&[
        ("user_a", "net_x"),
        ("user_b", "net_x"),
        ("user_c", "net_x"),
    ]);
    // a and c share an address; b is elsewhere.
    let mut a = join(&engine, "user_a", "192.168.1.7").await;
    let mut b = join(&engine, "user_b", "203.0.113.9").await;
    drain(&mut a);

    let _c = join(&engine, "user_c", "192.168.1.7").await;

    let to_a = expect_event(&mut a, "PEER_STATUS_UPDATE").await;
    assert_eq!(to_a["id"], "user_c");
    assert_eq!(to_a["status"], "online");
    assert_eq!(to_a["connectionMode"], "LAN");

    let to_b = expect_event(&mut b, "PEER_STATUS_UPDATE").await;
    assert_eq!(to_b["id"], "user_c");
    assert_eq!(to_b["connectionMode"], "REMOTE");
}

// ---------------------------------------------------------------------
// Pairing handshake and routing
// ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn accepted_pairing_routes_messages_one_way() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    let request_id = received["requestId"].as_str().expect("has requestId").to_string();
    assert_eq!(received["from"]["id"], "user_a");

    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": request_id, "accepted": true}}),
    )
    .await;

    let accepted = expect_event(&mut a, "CONNECTION_ACCEPTED").await;
    assert_eq!(accepted["requestId"], request_id.as_str());
    assert_eq!(accepted["peer"]["id"], "user_b");
    let session_id = accepted["sessionId"].as_str().expect("has sessionId").to_string();
    assert!(session_id.starts_with("ses_"));

    let created = expect_event(&mut b, "SESSION_CREATED").await;
    assert_eq!(created["sessionId"], session_id.as_str());
    assert_eq!(created["peer"]["id"], "user_a");

    send(
        &engine,
        &a,
        json!({"event": "SEND_MESSAGE", "data": {
            "sessionId": session_id,
            "content": {"hello": 1},
            "correlationId": "c1",
        }}),
    )
    .await;

    let message = expect_event(&mut b, "MESSAGE_RECEIVED").await;
    assert_eq!(message["sessionId"], session_id.as_str());
    assert_eq!(message["from"], "user_a");
    assert_eq!(message["content"], json!({"hello": 1}));
    assert_eq!(message["correlationId"], "c1");
    assert!(message["timestamp"].is_string());

    // Fire-and-forget: nothing comes back to the sender.
    expect_silence(&mut a);
}

#[tokio::test(start_paused = true)]
async fn rejected_pairing_notifies_the_requester() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    let request_id = received["requestId"].clone();

    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": request_id, "accepted": false}}),
    )
    .await;

    let rejected = expect_event(&mut a, "CONNECTION_REJECTED").await;
    assert_eq!(rejected["requestId"], received["requestId"]);
    assert_eq!(rejected["targetId"], "user_b");
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn expired_request_cannot_be_answered() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    let request_id = received["requestId"].clone();

    tokio::time::advance(Duration::from_secs(31)).await;

    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": request_id, "accepted": true}}),
    )
    .await;

    let data = expect_event(&mut b, "ERROR").await;
    assert_eq!(data["code"], "ERR_6001");
    expect_silence(&mut a);
}

#[tokio::test(start_paused = true)]
async fn response_from_a_bystander_is_unauthorized() {
    let engine = engine_with(&[
        ("user_a", "net_x"),
        ("user_b", "net_x"),
        ("user_c", "net_x"),
    ]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    let mut c = join(&engine, "user_c", "10.0.0.3").await;
    drain(&mut a);
    drain(&mut b);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    let request_id = received["requestId"].clone();

    send(
        &engine,
        &c,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": request_id, "accepted": true}}),
    )
    .await;
    let data = expect_event(&mut c, "ERROR").await;
    assert_eq!(data["code"], "ERR_6004");

    // The request survives a bystander's attempt; the addressee can
    // still accept it.
    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": received["requestId"], "accepted": true}}),
    )
    .await;
    expect_event(&mut a, "CONNECTION_ACCEPTED").await;
    expect_event(&mut b, "SESSION_CREATED").await;
}

#[tokio::test(start_paused = true)]
async fn self_request_is_a_validation_failure() {
    let engine = engine_with(&[("user_a", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_a"}}),
    )
    .await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_9003");
}

#[tokio::test(start_paused = true)]
async fn unknown_target_is_not_found() {
    let engine = engine_with(&[("user_a", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_ghost"}}),
    )
    .await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_2001");
}

#[tokio::test(start_paused = true)]
async fn message_to_unknown_session_and_from_non_participant() {
    let engine = engine_with(&[
        ("user_a", "net_x"),
        ("user_b", "net_x"),
        ("user_c", "net_x"),
    ]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    let mut c = join(&engine, "user_c", "10.0.0.3").await;
    drain(&mut a);
    drain(&mut b);

    send(
        &engine,
        &a,
        json!({"event": "SEND_MESSAGE", "data": {"sessionId": "ses_missing", "content": {}}}),
    )
    .await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_3001");

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": received["requestId"], "accepted": true}}),
    )
    .await;
    let accepted = expect_event(&mut a, "CONNECTION_ACCEPTED").await;
    let session_id = accepted["sessionId"].clone();
    drain(&mut b);
    drain(&mut c);

    send(
        &engine,
        &c,
        json!({"event": "SEND_MESSAGE", "data": {"sessionId": session_id, "content": {}}}),
    )
    .await;
    let data = expect_event(&mut c, "ERROR").await;
    assert_eq!(data["code"], "ERR_3008");
}

// ---------------------------------------------------------------------
// Disconnect and liveness
// ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn host_disconnect_ends_the_session() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": received["requestId"], "accepted": true}}),
    )
    .await;
    let accepted = expect_event(&mut a, "CONNECTION_ACCEPTED").await;
    let session_id = accepted["sessionId"].clone();
    expect_event(&mut b, "SESSION_CREATED").await;

    engine.handle_disconnect(&a.0).await;

    let update = expect_event(&mut b, "PEER_STATUS_UPDATE").await;
    assert_eq!(update["id"], "user_a");
    assert_eq!(update["status"], "offline");
    assert_eq!(engine.session_count(), 0);

    send(
        &engine,
        &b,
        json!({"event": "SEND_MESSAGE", "data": {"sessionId": session_id, "content": {}}}),
    )
    .await;
    let data = expect_event(&mut b, "ERROR").await;
    assert_eq!(data["code"], "ERR_3001");
}

#[tokio::test(start_paused = true)]
async fn guest_disconnect_also_ends_the_session() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": received["requestId"], "accepted": true}}),
    )
    .await;
    expect_event(&mut a, "CONNECTION_ACCEPTED").await;
    expect_event(&mut b, "SESSION_CREATED").await;

    engine.handle_disconnect(&b.0).await;

    let update = expect_event(&mut a, "PEER_STATUS_UPDATE").await;
    assert_eq!(update["id"], "user_b");
    assert_eq!(update["status"], "offline");
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn disconnect_purges_pending_requests() {
    let engine = engine_with(&[("user_a", "net_x"), ("user_b", "net_x")]);
    let mut a = join(&engine, "user_a", "10.0.0.1").await;
    let mut b = join(&engine, "user_b", "10.0.0.2").await;
    drain(&mut a);

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"targetId": "user_b"}}),
    )
    .await;
    let received = expect_event(&mut b, "CONNECTION_REQUEST_RECEIVED").await;
    assert_eq!(engine.pending_request_count(), 1);

    engine.handle_disconnect(&a.0).await;
    assert_eq!(engine.pending_request_count(), 0);

    let update = expect_event(&mut b, "PEER_STATUS_UPDATE").await;
    assert_eq!(update["status"], "offline");

    // The purge makes the request unanswerable.
    send(
        &engine,
        &b,
        json!({"event": "CONNECTION_RESPONSE", "data": {"requestId": received["requestId"], "accepted": true}}),
    )
    .await;
    let data = expect_event(&mut b, "ERROR").await;
    assert_eq!(data["code"], "ERR_6001");
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_terminates_a_silent_connection() {
    let engine = engine_with(&[("user_a", "net_x")]);
    engine.start();
    let mut a = join(&engine, "user_a", "10.0.0.1").await;

    // First sweep: liveness flag cleared, low-level ping sent.
    tokio::time::advance(Duration::from_secs(30)).await;
    match a.1.recv().await {
        Some(Outbound::Ping) => {}
        other => panic!("expected ping, got {other:?}"),
    }

    // No traffic in the second window: terminated.
    tokio::time::advance(Duration::from_secs(30)).await;
    expect_close(&mut a, 1001).await;
    assert_eq!(engine.peer_count(), 0);
    assert_eq!(engine.connection_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn traffic_keeps_a_connection_alive_through_sweeps() {
    let engine = engine_with(&[("user_a", "net_x")]);
    engine.start();
    let mut a = join(&engine, "user_a", "10.0.0.1").await;

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(30)).await;
        drain(&mut a);
        send(&engine, &a, json!({"event": "PING", "data": {}})).await;
        expect_event(&mut a, "PONG").await;
    }

    assert!(!a.0.is_closed());
    assert_eq!(engine.peer_count(), 1);
}

// ---------------------------------------------------------------------
// Protocol robustness
// ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pong_timestamps_are_monotonic() {
    let engine = engine_with(&[]);
    let mut a = auth(&engine, "user_1", "10.0.0.1").await;

    send(&engine, &a, json!({"event": "PING", "data": {}})).await;
    let first = expect_event(&mut a, "PONG").await["timestamp"]
        .as_u64()
        .expect("timestamp is a number");

    tokio::time::advance(Duration::from_secs(1)).await;

    send(&engine, &a, json!({"event": "PING", "data": {}})).await;
    let second = expect_event(&mut a, "PONG").await["timestamp"]
        .as_u64()
        .expect("timestamp is a number");

    assert!(second >= first);
}

#[tokio::test(start_paused = true)]
async fn ping_is_allowed_before_auth() {
    let engine = engine_with(&[]);
    let mut client = engine.connect(IpHash::unknown());

    send(&engine, &client, json!({"event": "PING", "data": {}})).await;
    expect_event(&mut client, "PONG").await;
}

#[tokio::test(start_paused = true)]
async fn wrong_state_events_report_without_closing() {
    let engine = engine_with(&[("user_1", "net_x")]);

    let mut fresh = engine.connect(IpHash::unknown());
    send(&engine, &fresh, json!({"event": "DISCOVER_PEERS", "data": {}})).await;
    let data = expect_event(&mut fresh, "ERROR").await;
    assert_eq!(data["code"], "ERR_5005");
    assert!(!fresh.0.is_closed());

    let mut authed = auth(&engine, "user_1", "10.0.0.1").await;
    send(&engine, &authed, json!({"event": "DISCOVER_PEERS", "data": {}})).await;
    let data = expect_event(&mut authed, "ERROR").await;
    assert_eq!(data["code"], "ERR_2006");
    assert!(!authed.0.is_closed());
}

#[tokio::test(start_paused = true)]
async fn malformed_and_unknown_frames_are_non_fatal() {
    let engine = engine_with(&[("user_1", "net_x")]);
    let mut a = join(&engine, "user_1", "10.0.0.1").await;

    engine.handle_frame(&a.0, "this is not json").await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_5003");

    send(&engine, &a, json!({"event": "TELEPORT", "data": {}})).await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_5003");
    assert!(
        data["message"]
            .as_str()
            .expect("message is a string")
            .contains("TELEPORT")
    );

    // Still functional afterwards.
    send(&engine, &a, json!({"event": "PING", "data": {}})).await;
    expect_event(&mut a, "PONG").await;
}

#[tokio::test(start_paused = true)]
async fn malformed_payload_is_a_validation_failure() {
    let engine = engine_with(&[("user_1", "net_x")]);
    let mut a = join(&engine, "user_1", "10.0.0.1").await;

    send(
        &engine,
        &a,
        json!({"event": "CONNECTION_REQUEST", "data": {"wrongField": true}}),
    )
    .await;
    let data = expect_event(&mut a, "ERROR").await;
    assert_eq!(data["code"], "ERR_9003");
}
