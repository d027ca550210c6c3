pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;

/// WebSocket upgrade handler. Every connection is its own game session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialize and send one message. Returns false once the client is gone.
async fn send_message(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection.
///
/// Messages are processed strictly one at a time, so the AI request for a
/// round blocks this session (and only this session) until it resolves.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = state.open_session();

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        session_id: session.id.clone(),
        question_count: state.questions.len(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    let initial = ServerMessage::State {
        state: session.snapshot(&state.questions),
    };
    if !send_message(&mut sender, &welcome).await || !send_message(&mut sender, &initial).await {
        tracing::error!("Failed to send welcome message");
        state.close_session(session);
        return;
    }

    'conn: while let Some(ws_msg) = receiver.next().await {
        match ws_msg {
            Ok(Message::Text(text)) => {
                // Raw text is never logged: it may carry the API key
                tracing::debug!("Session {}: received {} bytes", session.id, text.len());

                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::error!("Failed to parse client message: {}", e);
                        let error = ServerMessage::Error {
                            code: "PARSE_ERROR".to_string(),
                            msg: format!("Invalid message format: {}", e),
                        };
                        if !send_message(&mut sender, &error).await {
                            break;
                        }
                        continue;
                    }
                };

                if let Some(notice) = handlers::loading_notice(&client_msg, &session) {
                    if !send_message(&mut sender, &notice).await {
                        break;
                    }
                }

                for response in handlers::handle_message(client_msg, &mut session, &state).await {
                    if !send_message(&mut sender, &response).await {
                        tracing::error!("Failed to send response");
                        break 'conn;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed");
                break;
            }
            Ok(Message::Ping(data)) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    state.close_session(session);
}
