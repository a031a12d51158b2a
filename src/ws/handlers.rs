use axum::{
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast::error::RecvError;

use crate::{broadcast::ChannelLayer, models::event::MOVIES_TOPIC, state::AppState};

pub async fn movies_ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    tracing::info!("New WebSocket connection from {}", addr);

    let channel = state.channel.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, channel))
}

/// Push-only connection: subscribe to the movies topic, forward every
/// published payload verbatim, and tear everything down the moment the
/// client goes away. Dropping the receiver is the unsubscribe.
async fn handle_socket(socket: WebSocket, channel: Arc<dyn ChannelLayer>) {
    let mut updates = channel.subscribe(MOVIES_TOPIC).await;
    tracing::info!("WebSocket connected and subscribed to '{}'", MOVIES_TOPIC);

    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(payload) => {
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        // Client vanished mid-send; no retries.
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Slow WebSocket client, {} updates dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // The server never expects application messages; drain until the
    // client closes or the transport fails.
    let mut read = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward => read.abort(),
        _ = &mut read => forward.abort(),
    }

    tracing::info!("WebSocket disconnected and unsubscribed from '{}'", MOVIES_TOPIC);
}
