use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::future;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::models::location::LocationUpdate;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Every listener receives every location update. A listener that falls
/// behind skips what it missed and keeps going.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut frames = Box::pin(update_frames(state.location_events_tx.subscribe()));

    state.metrics.ws_listeners.inc();
    info!("websocket listener connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(json) = frames.next().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.metrics.ws_listeners.dec();
    info!("websocket listener disconnected");
}

/// JSON text frames for each update a subscriber receives. Ends when the
/// sender side is dropped.
pub fn update_frames(
    rx: broadcast::Receiver<LocationUpdate>,
) -> impl Stream<Item = String> + Send + 'static {
    BroadcastStream::new(rx).filter_map(|next| {
        let frame = match next {
            Ok(update) => match serde_json::to_string(&update) {
                Ok(json) => Some(json),
                Err(err) => {
                    warn!(error = %err, "failed to serialize location update for ws");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "websocket listener lagged; dropping missed updates");
                None
            }
        };
        future::ready(frame)
    })
}
