//! WebSocket handler for live job-update streaming.
//!
//! A connection subscribes to one job's event stream on upgrade and receives
//! every event published from that moment onward; there is no backlog for
//! late subscribers. The subscription is dropped when either side closes.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

pub async fn job_updates(
    ws: WebSocketUpgrade,
    Path(job_id): Path<Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, job_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, job_id: Uuid) {
    let (subscriber_id, mut events) = state.events.subscribe(job_id);
    tracing::debug!(%job_id, "websocket connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(%job_id, error = %e, "failed to serialize event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // clients may send keepalive text; ignore
                    Some(Err(e)) => {
                        tracing::debug!(%job_id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    state.events.unsubscribe(job_id, subscriber_id);
    tracing::debug!(%job_id, "websocket disconnected");
}
