// ============================
// portfolio-backend-lib/src/ws_router.rs
// ============================
//! HTTP router and the chat WebSocket connection loop.
use crate::chat::{ChatRoom, Participant, ParticipantId};
use crate::handlers::{auth, feedback, pages};
use crate::metrics::CHAT_CONNECTION;
use crate::middleware::{require_login, CurrentUser};
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::counter;
use portfolio_common::{ChatClientEvent, ChatServerEvent, Role};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/chat", get(pages::chat))
        .route("/chat/ws", get(chat_socket))
        .route_layer(from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(auth::root))
        .route("/home", get(pages::home))
        .route("/login", get(pages::login))
        .route("/processlogin", post(auth::process_login))
        .route("/logout", get(auth::logout))
        .route("/register", get(pages::register))
        .route("/processregister", post(auth::process_register))
        .route("/resume", get(pages::resume))
        .route("/projects", get(pages::projects))
        .route("/piano", get(pages::piano))
        .route("/processfeedback", post(feedback::process_feedback))
        .route("/health", get(health_handler))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "Healthy"
}

/// Upgrade a logged-in request to a chat connection
async fn chat_socket(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let participant = Participant::new(
        user.session.display_name(),
        user.session.role.unwrap_or(Role::Other),
    );
    ws.on_upgrade(move |socket| handle_socket(socket, state.chat.clone(), participant))
}

/// Handle a chat connection
///
/// The connection is registered on upgrade so it hears the room right away;
/// it is only announced once the client sends `joined`.
async fn handle_socket(socket: WebSocket, room: Arc<ChatRoom>, participant: Participant) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut rx) = room.connect(participant);
    counter!(CHAT_CONNECTION).increment(1);

    // The room holds the only sender, so this ends once the participant is removed
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => {
                if !handle_frame(&room, id, text.as_str()) {
                    break;
                }
            },
            Message::Close(_) => break,
            _ => {},
        }
    }

    room.disconnect(id);
    let _ = send_task.await;
    debug!(%id, "chat connection closed");
}

/// Apply one client frame; returns `false` once the participant has left
fn handle_frame(room: &ChatRoom, id: ParticipantId, text: &str) -> bool {
    match serde_json::from_str::<ChatClientEvent>(text) {
        Ok(ChatClientEvent::Joined) => {
            room.announce_join(id);
        },
        Ok(ChatClientEvent::Message { msg }) => {
            room.say(id, &msg);
        },
        Ok(ChatClientEvent::Left) => {
            room.leave(id);
            return false;
        },
        Err(e) => {
            debug!(error = %e, "malformed chat frame");
            room.send_to(
                id,
                ChatServerEvent::Error {
                    message: e.to_string(),
                },
            );
        },
    }
    true
}
