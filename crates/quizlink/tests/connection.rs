//! Integration tests for the connection manager against a scripted
//! loopback WebSocket server.
//!
//! The server side is plain `tokio-tungstenite`: each test accepts the
//! connections it expects and asserts on the exact frames that crossed
//! the socket. Reconnection timing uses a fast test policy — the exact
//! default delay schedule is pinned by unit tests on `ReconnectPolicy`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use quizlink::prelude::*;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

// =========================================================================
// Helpers
// =========================================================================

/// `RUST_LOG=quizlink=debug cargo test -- --nocapture` shows the
/// worker's transitions while debugging a flaky run.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn bind() -> (TcpListener, String) {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    (listener, url)
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("accept timed out")
        .expect("accept failed");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("should upgrade")
}

/// Next text frame from the client, within a bounded wait.
async fn next_text(ws: &mut ServerWs) -> String {
    let deadline = Duration::from_secs(5);
    timeout(deadline, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(_)) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("no frame within deadline")
}

/// Asserts the client sends nothing for `quiet`.
async fn expect_no_frame(ws: &mut ServerWs, quiet: Duration) {
    let result = timeout(quiet, ws.next()).await;
    match result {
        Err(_) => {} // timed out quietly, as expected
        Ok(None) | Ok(Some(Ok(Message::Close(_)))) => {}
        Ok(Some(frame)) => panic!("unexpected frame: {frame:?}"),
    }
}

async fn send_text(ws: &mut ServerWs, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("server send");
}

async fn wait_status(
    rx: &mut watch::Receiver<ConnectionStatus>,
    want: ConnectionStatus,
) {
    timeout(Duration::from_secs(5), rx.wait_for(|s| *s == want))
        .await
        .unwrap_or_else(|_| panic!("never reached status {want}"))
        .expect("status channel closed");
}

/// Milliseconds-scale schedule so reconnect tests finish quickly.
fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(80),
        max_attempts: 3,
    }
}

fn player_credentials() -> Credentials {
    Credentials::Player {
        player_id: "p1".into(),
        player_token: "t1".into(),
    }
}

fn player_builder(url: &str) -> ConnectionBuilder {
    ConnectionBuilder::new("ABC123", Role::Player)
        .credentials(player_credentials())
        .endpoint(url)
        .reconnect_policy(fast_policy())
}

/// Collects every dispatched message as its JSON text.
fn collector() -> (
    Arc<Mutex<Vec<String>>>,
    impl Fn(RawMessage) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let callback = move |msg: RawMessage| {
        seen_clone
            .lock()
            .expect("collector lock")
            .push(msg.as_value().to_string());
    };
    (seen, callback)
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_open_sends_exact_player_init() {
    let (listener, url) = bind().await;

    let conn = player_builder(&url).open().expect("open");
    let mut server = accept(&listener).await;

    let init = next_text(&mut server).await;
    assert_eq!(
        init,
        r#"{"type":"init","role":"player","player_id":"p1","player_token":"t1"}"#
    );

    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Connected).await;
}

#[tokio::test]
async fn test_host_init_carries_bearer_token_only() {
    let (listener, url) = bind().await;

    let _conn = ConnectionBuilder::new("ABC123", Role::Host)
        .credentials(Credentials::Host {
            token: Some("host-tok".into()),
        })
        .endpoint(&url)
        .reconnect_policy(fast_policy())
        .open()
        .expect("open");

    let mut server = accept(&listener).await;
    let init: serde_json::Value =
        serde_json::from_str(&next_text(&mut server).await).expect("json");

    assert_eq!(init["type"], "init");
    assert_eq!(init["role"], "host");
    assert_eq!(init["token"], "host-tok");
    assert!(init.get("player_id").is_none());
}

// =========================================================================
// Outbound ordering and queuing
// =========================================================================

#[tokio::test]
async fn test_sends_while_connected_arrive_in_call_order() {
    let (listener, url) = bind().await;
    let conn = player_builder(&url).open().expect("open");
    let mut server = accept(&listener).await;
    next_text(&mut server).await; // init

    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Connected).await;

    for i in 0..3 {
        conn.send(ClientCommand::SubmitAnswer {
            question_id: format!("q{i}"),
            option_index: i,
        });
    }

    for i in 0..3 {
        let frame: serde_json::Value =
            serde_json::from_str(&next_text(&mut server).await).expect("json");
        assert_eq!(frame["question_id"], format!("q{i}"));
    }
}

#[tokio::test]
async fn test_queued_messages_flush_after_handshake_exactly_once() {
    let (listener, url) = bind().await;

    // The server does not accept yet, so everything sent now queues.
    let conn = player_builder(&url).open().expect("open");
    conn.send(ClientCommand::SubmitAnswer {
        question_id: "q1".into(),
        option_index: 0,
    });
    conn.send(ClientCommand::SubmitAnswer {
        question_id: "q2".into(),
        option_index: 1,
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // First connection: init, then the queue in enqueue order.
    let mut server = accept(&listener).await;
    let init: serde_json::Value =
        serde_json::from_str(&next_text(&mut server).await).expect("json");
    assert_eq!(init["type"], "init");
    for expected in ["q1", "q2"] {
        let frame: serde_json::Value =
            serde_json::from_str(&next_text(&mut server).await).expect("json");
        assert_eq!(frame["question_id"], expected);
    }

    // Server drops the connection; the client reconnects and sends the
    // handshake again — but never the already-flushed messages.
    drop(server);
    let mut server = accept(&listener).await;
    let init: serde_json::Value =
        serde_json::from_str(&next_text(&mut server).await).expect("json");
    assert_eq!(init["type"], "init");
    expect_no_frame(&mut server, Duration::from_millis(150)).await;
}

#[tokio::test]
async fn test_messages_sent_during_backoff_flush_on_next_open() {
    let (listener, url) = bind().await;
    let conn = player_builder(&url).open().expect("open");

    let mut server = accept(&listener).await;
    next_text(&mut server).await; // init
    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Connected).await;

    // Kill the connection, then send while the client is backing off.
    drop(server);
    wait_status(&mut status, ConnectionStatus::Reconnecting).await;
    conn.send(ClientCommand::SubmitAnswer {
        question_id: "queued-during-backoff".into(),
        option_index: 3,
    });

    let mut server = accept(&listener).await;
    let init: serde_json::Value =
        serde_json::from_str(&next_text(&mut server).await).expect("json");
    assert_eq!(init["type"], "init", "handshake precedes the flush");
    let frame: serde_json::Value =
        serde_json::from_str(&next_text(&mut server).await).expect("json");
    assert_eq!(frame["question_id"], "queued-during-backoff");
}

// =========================================================================
// Heartbeat and the malformed-frame boundary
// =========================================================================

#[tokio::test]
async fn test_ping_answered_with_pong_and_never_forwarded() {
    let (listener, url) = bind().await;
    let (seen, on_message) = collector();

    let conn = player_builder(&url).on_message(on_message).open().expect("open");
    let mut server = accept(&listener).await;
    next_text(&mut server).await; // init

    send_text(&mut server, r#"{"type":"ping"}"#).await;
    let pong = next_text(&mut server).await;
    assert_eq!(pong, r#"{"type":"pong"}"#);

    // An application message still flows normally afterwards.
    send_text(
        &mut server,
        r#"{"type":"question","question_id":"q1","text":"?","options":["a"],"time_limit_secs":5}"#,
    )
    .await;
    timeout(Duration::from_secs(5), async {
        loop {
            if !seen.lock().expect("lock").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("question never dispatched");

    let messages = seen.lock().expect("lock");
    assert_eq!(messages.len(), 1, "ping must not reach the handler");
    assert!(messages[0].contains(r#""type":"question""#));
    drop(messages);
    drop(conn);
}

#[tokio::test]
async fn test_malformed_frames_are_dropped_silently() {
    let (listener, url) = bind().await;
    let (seen, on_message) = collector();

    let _conn = player_builder(&url).on_message(on_message).open().expect("open");
    let mut server = accept(&listener).await;
    next_text(&mut server).await; // init

    for junk in [
        "definitely not json",
        "[1,2,3]",
        "null",
        "42",
        r#"{"question_id":"q1"}"#,
        r#"{"type":7}"#,
    ] {
        send_text(&mut server, junk).await;
    }
    send_text(
        &mut server,
        r#"{"type":"session_ended","reason":"done"}"#,
    )
    .await;

    timeout(Duration::from_secs(5), async {
        loop {
            if !seen.lock().expect("lock").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("valid frame never dispatched");

    let messages = seen.lock().expect("lock");
    assert_eq!(messages.len(), 1, "junk frames must be dropped");
    assert!(messages[0].contains("session_ended"));
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test]
async fn test_reconnects_after_server_close_and_resends_init() {
    let (listener, url) = bind().await;
    let conn = player_builder(&url).open().expect("open");
    let mut status = conn.status_watch();

    let mut server = accept(&listener).await;
    next_text(&mut server).await;
    wait_status(&mut status, ConnectionStatus::Connected).await;

    drop(server);
    wait_status(&mut status, ConnectionStatus::Reconnecting).await;

    let mut server = accept(&listener).await;
    let init = next_text(&mut server).await;
    assert!(init.contains(r#""type":"init""#));
    wait_status(&mut status, ConnectionStatus::Connected).await;
}

#[tokio::test]
async fn test_exhaustion_fires_exactly_once_then_terminal() {
    // Bind-and-drop: nothing will ever listen here.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let exhausted = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));

    let exhausted_clone = Arc::clone(&exhausted);
    let errors_clone = Arc::clone(&errors);
    let conn = ConnectionBuilder::new("ABC123", Role::Player)
        .credentials(player_credentials())
        .endpoint(&url)
        .reconnect_policy(fast_policy())
        .on_error(move |_| {
            errors_clone.fetch_add(1, Ordering::SeqCst);
        })
        .on_exhausted(move || {
            exhausted_clone.fetch_add(1, Ordering::SeqCst);
        })
        .open()
        .expect("open");

    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Disconnected).await;

    // The callback fires right after the status flip, from the worker
    // task; give it its turn rather than racing it.
    timeout(Duration::from_secs(5), async {
        while exhausted.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("exhaustion callback never fired");

    assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    // Initial attempt + max_attempts retries, each surfacing an error.
    assert_eq!(errors.load(Ordering::SeqCst), 4);

    // Terminal means terminal: nothing changes afterwards.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    assert_eq!(conn.status(), ConnectionStatus::Disconnected);
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test]
async fn test_close_suppresses_late_events_from_old_transport() {
    let (listener, url) = bind().await;
    let (seen, on_message) = collector();

    let conn = player_builder(&url).on_message(on_message).open().expect("open");
    let mut status = conn.status_watch();
    let mut server = accept(&listener).await;
    next_text(&mut server).await;
    wait_status(&mut status, ConnectionStatus::Connected).await;

    conn.close();
    wait_status(&mut status, ConnectionStatus::Disconnected).await;

    // The server floods the (dying) socket. None of it may surface.
    for i in 0..5 {
        let frame = format!(
            r#"{{"type":"question","question_id":"late-{i}","text":"?","options":[],"time_limit_secs":5}}"#
        );
        if ws_send_ignoring_errors(&mut server, &frame).await.is_err() {
            break; // socket already fully closed — even better
        }
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(
        seen.lock().expect("lock").is_empty(),
        "late events leaked past teardown"
    );
    assert_eq!(conn.status(), ConnectionStatus::Disconnected);
}

async fn ws_send_ignoring_errors(
    ws: &mut ServerWs,
    text: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    ws.send(Message::Text(text.to_string().into())).await
}

#[tokio::test]
async fn test_close_cancels_pending_reconnect() {
    // Dead endpoint, long delays: the client parks in backoff.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let conn = ConnectionBuilder::new("ABC123", Role::Player)
        .credentials(player_credentials())
        .endpoint(&url)
        .reconnect_policy(ReconnectPolicy {
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        })
        .open()
        .expect("open");

    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Reconnecting).await;

    // Close must cut the 30 s backoff short, not wait it out.
    let start = std::time::Instant::now();
    conn.close();
    wait_status(&mut status, ConnectionStatus::Disconnected).await;
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "pending reconnect timer was not cancelled"
    );
}

#[tokio::test]
async fn test_dropping_the_handle_closes_the_socket() {
    let (listener, url) = bind().await;
    let conn = player_builder(&url).open().expect("open");

    let mut server = accept(&listener).await;
    next_text(&mut server).await;
    let mut status = conn.status_watch();
    wait_status(&mut status, ConnectionStatus::Connected).await;

    drop(conn);

    // The server observes the close within a bounded wait.
    let observed = timeout(Duration::from_secs(5), async {
        loop {
            match server.next().await {
                Some(Ok(Message::Close(_))) | None => return,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return,
            }
        }
    })
    .await;
    assert!(observed.is_ok(), "socket never closed after handle drop");
}

// =========================================================================
// End-to-end: question flow through the dispatcher
// =========================================================================

#[tokio::test]
async fn test_question_event_drives_player_phase_and_countdown() {
    let (listener, url) = bind().await;

    // Tiny player state machine: phase + countdown armed from the
    // question's time limit.
    #[derive(Default)]
    struct PlayerState {
        phase: String,
        countdown_secs: u32,
    }
    let state = Arc::new(Mutex::new(PlayerState::default()));

    let dispatcher = {
        let state = Arc::clone(&state);
        Dispatcher::new().on(tags::QUESTION, move |msg| {
            if let Some(PlayerEvent::Question {
                time_limit_secs, ..
            }) = PlayerEvent::from_raw(msg)
            {
                let mut state = state.lock().expect("state lock");
                state.phase = "question".into();
                state.countdown_secs = time_limit_secs;
            }
        })
    };

    let _conn = player_builder(&url)
        .on_message(move |msg| {
            dispatcher.dispatch(&msg);
        })
        .open()
        .expect("open");

    let mut server = accept(&listener).await;
    let init = next_text(&mut server).await;
    assert_eq!(
        init,
        r#"{"type":"init","role":"player","player_id":"p1","player_token":"t1"}"#
    );

    send_text(
        &mut server,
        r#"{"type":"question","question_id":"q1","text":"2+2?",
            "options":["3","4","5"],"time_limit_secs":20,"index":1,"total":5}"#,
    )
    .await;

    timeout(Duration::from_secs(5), async {
        loop {
            if state.lock().expect("lock").phase == "question" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("phase never transitioned");

    let state = state.lock().expect("lock");
    assert_eq!(state.phase, "question");
    assert_eq!(state.countdown_secs, 20);
}
