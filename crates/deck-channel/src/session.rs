use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::response::sse::Event;
use futures_util::{SinkExt, Stream, StreamExt, stream::SplitSink};

use podium_deck_interface::StreamEvent;

use crate::registry::Subscription;

type WsSender = SplitSink<WebSocket, Message>;

enum LoopAction {
    Continue,
    Break,
}

async fn send_ws(sender: &mut WsSender, event: &StreamEvent) -> bool {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(error = %error, "stream_event_serialize_failed");
            return false;
        }
    };

    sender.send(Message::Text(payload.into())).await.is_ok()
}

pub(crate) async fn handle_websocket(
    socket: WebSocket,
    mut subscription: Subscription,
    keepalive: Duration,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let handle = subscription.handle().clone();
    let mut heartbeat =
        tokio::time::interval_at(tokio::time::Instant::now() + keepalive, keepalive);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(deck_id = %handle.deck_id, connection_id = %handle.id, "websocket_session_started");

    loop {
        let action = tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    if send_ws(&mut ws_sender, &event).await {
                        LoopAction::Continue
                    } else {
                        LoopAction::Break
                    }
                }
                None => {
                    tracing::info!(deck_id = %handle.deck_id, connection_id = %handle.id, "websocket_session_evicted");
                    LoopAction::Break
                }
            },
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => LoopAction::Break,
                Some(Err(error)) => {
                    tracing::debug!(error = %error, "websocket_receive_failed");
                    LoopAction::Break
                }
                // Publishing goes through the control endpoint.
                Some(Ok(_)) => LoopAction::Continue,
            },
            _ = heartbeat.tick() => {
                if ws_sender.send(Message::Ping(Vec::new().into())).await.is_ok() {
                    LoopAction::Continue
                } else {
                    LoopAction::Break
                }
            }
        };
        if matches!(action, LoopAction::Break) {
            break;
        }
    }

    drop(subscription);
    let _ = ws_sender.close().await;

    tracing::info!(deck_id = %handle.deck_id, connection_id = %handle.id, "websocket_session_ended");
}

pub(crate) fn sse_events(
    subscription: Subscription,
) -> impl Stream<Item = Result<Event, axum::Error>> + Send + 'static {
    subscription.map(|event| Event::default().event(event.kind()).json_data(&event))
}
