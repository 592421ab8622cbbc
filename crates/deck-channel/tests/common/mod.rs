use std::net::SocketAddr;
use std::time::Duration;

use deck_channel::{DeckChannelConfig, Env, StreamEvent};
use futures_util::StreamExt;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub const TOKEN: &str = "test-control-token";
pub const TIMEOUT: Duration = Duration::from_secs(2);

pub type Ws = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub fn test_config() -> DeckChannelConfig {
    let env = Env {
        deck_max_slides: 20,
        ..Env::default()
    };
    DeckChannelConfig::new(&env).with_control_token(TOKEN)
}

pub async fn start_server(config: DeckChannelConfig) -> SocketAddr {
    let app = deck_channel::router(config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn connect_viewer(addr: SocketAddr, deck: &str) -> Ws {
    let url = format!("ws://{addr}/decks/{deck}/ws");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("failed to connect");
    ws
}

pub async fn next_event(ws: &mut Ws) -> StreamEvent {
    loop {
        let msg = tokio::time::timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");

        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("invalid event json");
        }
    }
}

pub async fn post_slide(addr: SocketAddr, deck: &str, slide: u32, token: Option<&str>) -> reqwest::Response {
    let mut req = reqwest::Client::new()
        .post(format!("http://{addr}/decks/{deck}/slide"))
        .json(&serde_json::json!({ "slide": slide }));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    req.send().await.unwrap()
}
