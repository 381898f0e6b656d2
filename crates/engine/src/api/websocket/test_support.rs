use super::*;

use std::{net::SocketAddr, time::Duration};

use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::infrastructure::chess_rules::ChessRules;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::ports::RulesFactory;

pub(crate) type TestWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) fn build_test_app() -> Arc<App> {
    build_test_app_with_rules(ChessRules::factory())
}

pub(crate) fn build_test_app_with_rules(rules: RulesFactory) -> Arc<App> {
    Arc::new(App::new(
        ServerConfig::default(),
        rules,
        Arc::new(SystemClock::new()),
    ))
}

pub(crate) async fn spawn_ws_server(app: Arc<App>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(app));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> TestWs {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut TestWs, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json)).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut TestWs, text: &str) {
    ws.send(WsMessage::Text(text.to_string())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut TestWs) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin).unwrap();
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut TestWs,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}
