//! WebSocket handler streaming playback updates.

use crate::state::Update;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

/// WebSocket upgrade handler for /ws/frames.
pub async fn frames_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_update(socket: &mut WebSocket, update: &Update) -> bool {
    match serde_json::to_string(update) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(_) => true,
    }
}

async fn send_error(socket: &mut WebSocket, message: String) -> bool {
    let text = json!({ "type": "error", "data": message }).to_string();
    socket.send(Message::Text(text.into())).await.is_ok()
}

/// Send the current picture, then every update as it happens.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.subscribe();

    let initial = [
        state.graph().await.map(Update::Graph),
        state.overlay().await.map(Update::Overlay),
        state.frame().await.map(Update::Frame),
    ];
    for update in initial.into_iter().flatten() {
        if !send_update(&mut socket, &update).await {
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(update) => {
                        if !send_update(&mut socket, &update).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Frames are snapshots; the next one catches up.
                        debug!(skipped, "subscriber lagging");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(cmd) = serde_json::from_str::<ClientCommand>(&text) else {
                            continue;
                        };
                        let result = match cmd {
                            ClientCommand::Start { best_only, routed } => {
                                state.start(best_only, routed).await.map(|_| ())
                            }
                            ClientCommand::Stop => state.stop().await.map(|_| ()),
                            ClientCommand::Frame => match state.frame().await {
                                Ok(frame) => {
                                    if !send_update(&mut socket, &Update::Frame(frame)).await {
                                        break;
                                    }
                                    Ok(())
                                }
                                Err(e) => Err(e),
                            },
                        };
                        if let Err(e) = result {
                            if !send_error(&mut socket, e.to_string()).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// Commands that can be sent over WebSocket.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum ClientCommand {
    Start {
        #[serde(default)]
        best_only: Option<bool>,
        #[serde(default)]
        routed: Option<bool>,
    },
    Stop,
    Frame,
}
