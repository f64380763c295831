//! End-to-end tests: a real server on a loopback port, driven with
//! `tokio-tungstenite` and `reqwest`.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use station_gateway::api::build_app;
use station_gateway::app_state::AppState;
use station_gateway::bridge::{Bridge, BridgeHandle, spawn_bridge};
use station_gateway::config::GatewayConfig;
use station_gateway::domain::NormalizedCommand;
use station_gateway::interpreter::{CommandInterpreter, LoopbackInterpreter, ResponseSink};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    bridge: BridgeHandle,
}

impl Server {
    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

async fn start<I: CommandInterpreter>(
    max_clients: usize,
    static_dir: PathBuf,
    interp: I,
) -> Server {
    let config = GatewayConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        max_clients,
        static_dir,
        cleanup_interval: Duration::from_millis(50),
        ..GatewayConfig::default()
    };
    let (bridge, _task) = spawn_bridge(
        Bridge::new(config.bridge_limits(), interp),
        config.bridge_event_capacity,
        config.cleanup_interval,
    );
    let state = AppState {
        bridge: bridge.clone(),
        config: Arc::new(config),
    };
    let app = build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind loopback listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    Server { addr, bridge }
}

async fn start_loopback(max_clients: usize) -> Server {
    start(max_clients, PathBuf::from("/nonexistent"), LoopbackInterpreter).await
}

async fn connect(server: &Server) -> Client {
    let Ok((ws, _)) = connect_async(server.ws_url()).await else {
        panic!("websocket connect failed");
    };
    ws
}

/// Next text frame, skipping control frames. Panics on close or timeout.
async fn next_text(ws: &mut Client) -> String {
    loop {
        let Ok(msg) = tokio::time::timeout(WAIT, ws.next()).await else {
            panic!("timed out waiting for a message");
        };
        match msg {
            Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            other => panic!("expected text, got {other:?}"),
        }
    }
}

/// Returns `true` if the server closes the stream before `WAIT`.
async fn closes(ws: &mut Client) -> bool {
    loop {
        let Ok(msg) = tokio::time::timeout(WAIT, ws.next()).await else {
            return false;
        };
        match msg {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
            Some(Ok(_)) => {}
        }
    }
}

async fn send(ws: &mut Client, text: &str) {
    if ws.send(Message::text(text.to_string())).await.is_err() {
        panic!("send failed");
    }
}

async fn client_count(server: &Server) -> usize {
    let Ok(status) = server.bridge.status().await else {
        panic!("bridge gone");
    };
    status.clients
}

/// Polls until the bridge reports `expected` clients.
async fn wait_for_count(server: &Server, expected: usize) {
    for _ in 0..100 {
        if client_count(server).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("client count never reached {expected}");
}

fn status_reply(command: &NormalizedCommand, out: &mut dyn ResponseSink) {
    if command.as_bytes() == b"<status>" {
        out.write_block(b"<iDCC-EX V-5.0.0 / ESP32>\n<p1 MAIN>\n<H 1 0>");
    }
}

#[tokio::test]
async fn command_reply_reaches_the_sender() {
    let server = start(5, PathBuf::from("/nonexistent"), status_reply).await;
    let mut ws = connect(&server).await;

    let welcome = next_text(&mut ws).await;
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&welcome) else {
        panic!("welcome is not JSON: {welcome}");
    };
    assert_eq!(json["connected"], true);
    assert!(json["clientId"].is_u64());
    assert_eq!(client_count(&server).await, 1);

    send(&mut ws, "status").await;
    let mut reply = Vec::new();
    for _ in 0..3 {
        reply.push(next_text(&mut ws).await);
    }
    assert_eq!(
        reply,
        vec!["<iDCC-EX V-5.0.0 / ESP32>\n", "<p1 MAIN>\n", "<H 1 0>"]
    );

    let _ = ws.close(None).await;
    wait_for_count(&server, 0).await;
}

#[tokio::test]
async fn blank_and_oversized_frames_are_ignored() {
    let server = start_loopback(5).await;
    let mut ws = connect(&server).await;
    let _ = next_text(&mut ws).await;

    send(&mut ws, "   \r\n").await;
    send(&mut ws, &"x".repeat(129)).await;
    send(&mut ws, "<s>").await;

    assert_eq!(next_text(&mut ws).await, "<s>\n");
}

#[tokio::test]
async fn client_over_ceiling_is_rejected_and_closed() {
    let server = start_loopback(2).await;
    let mut first = connect(&server).await;
    let mut second = connect(&server).await;
    let _ = next_text(&mut first).await;
    let _ = next_text(&mut second).await;

    let mut third = connect(&server).await;
    assert_eq!(
        next_text(&mut third).await,
        r#"{"error":"Max clients reached"}"#
    );
    assert!(closes(&mut third).await);
    assert_eq!(client_count(&server).await, 2);

    // The admitted clients are unaffected.
    send(&mut first, "s").await;
    assert_eq!(next_text(&mut first).await, "<s>\n");
}

#[tokio::test]
async fn slot_is_reusable_after_disconnect() {
    let server = start_loopback(1).await;
    let mut first = connect(&server).await;
    let _ = next_text(&mut first).await;
    let _ = first.close(None).await;
    wait_for_count(&server, 0).await;

    let mut second = connect(&server).await;
    let welcome = next_text(&mut second).await;
    assert!(welcome.starts_with(r#"{"connected":true"#));
}

#[tokio::test]
async fn broadcast_reaches_every_connected_client() {
    let server = start_loopback(5).await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut ws = connect(&server).await;
        let _ = next_text(&mut ws).await;
        clients.push(ws);
    }
    let mut gone = connect(&server).await;
    let _ = next_text(&mut gone).await;
    let _ = gone.close(None).await;
    wait_for_count(&server, 3).await;

    let Ok(()) = server.bridge.broadcast("TRACK POWER OFF").await else {
        panic!("bridge gone");
    };
    for ws in &mut clients {
        assert_eq!(next_text(ws).await, "TRACK POWER OFF");
    }
}

#[tokio::test]
async fn info_endpoint_reports_clients() {
    let server = start_loopback(4).await;
    let mut ws = connect(&server).await;
    let _ = next_text(&mut ws).await;

    let Ok(resp) = reqwest::get(server.http_url("/api/info")).await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 200);
    let Ok(body) = resp.json::<serde_json::Value>().await else {
        panic!("body is not JSON");
    };
    assert_eq!(body["clients"], 1);
    assert_eq!(body["maxClients"], 4);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn info_endpoint_fails_once_bridge_stops() {
    let server = start_loopback(1).await;
    let _ = server.bridge.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let Ok(resp) = reqwest::get(server.http_url("/api/info")).await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn unknown_paths_are_plain_404() {
    let server = start_loopback(1).await;
    let Ok(resp) = reqwest::get(server.http_url("/nope.html")).await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 404);
    let Ok(body) = resp.text().await else {
        panic!("no body");
    };
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn static_index_is_served_at_root() {
    let dir = std::env::temp_dir().join(format!("station-gateway-it-{}", std::process::id()));
    let _ = std::fs::create_dir_all(&dir);
    if std::fs::write(dir.join("index.html"), "<h1>throttle</h1>").is_err() {
        panic!("cannot write index.html");
    }

    let server = start(1, dir.clone(), LoopbackInterpreter).await;
    let Ok(resp) = reqwest::get(server.http_url("/")).await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 200);
    let Ok(body) = resp.text().await else {
        panic!("no body");
    };
    assert_eq!(body, "<h1>throttle</h1>");
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let server = start_loopback(1).await;
    let Ok(resp) = reqwest::get(server.http_url("/health")).await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), 200);
}
