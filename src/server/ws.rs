//! WebSocket endpoint registering broadcast subscribers.
//!
//! Each connection gets its own channel in the broadcaster; delivered
//! messages are forwarded as text frames. Inbound text stamps the user's
//! last-interaction time; chat itself is handled elsewhere.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use super::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (id, mut rx) = state.broadcaster.subscribe();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Broadcaster dropped this subscriber.
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(_))) => {
                        state.context.record_interaction().await;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Binary(_))) => {}
                }
            }
        }
    }

    state.broadcaster.unsubscribe(id);
    tracing::debug!(subscriber = %id, "WebSocket closed");
}
