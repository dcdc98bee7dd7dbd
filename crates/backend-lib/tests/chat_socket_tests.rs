// ============================
// crates/backend-lib/tests/chat_socket_tests.rs
// ============================
//! The chat room over real WebSocket connections.
mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request},
};
use backend_lib::{ws_router::create_router, AppState};
use futures_util::{SinkExt, StreamExt};
use portfolio_common::{ChatServerEvent, StyleClass};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
    MaybeTlsStream, WebSocketStream,
};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the router on an ephemeral port
async fn start_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/chat/ws")
}

/// Log in through `/processlogin` and return the `name=value` session cookie
async fn login(state: &Arc<AppState>, email: &str) -> String {
    let body = format!("email={}&password=password", email.replace('@', "%40"));
    let request = Request::builder()
        .method("POST")
        .uri("/processlogin")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let value = response.headers()[header::SET_COOKIE].to_str().unwrap();
    value.split(';').next().unwrap().to_string()
}

async fn connect(url: &str, cookie: &str) -> Client {
    let mut request = url.into_client_request().unwrap();
    request
        .headers_mut()
        .insert("cookie", HeaderValue::from_str(cookie).unwrap());
    let (stream, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("Failed to connect");
    stream
}

async fn next_event(client: &mut Client, operation_name: &str) -> ChatServerEvent {
    match tokio::time::timeout(Duration::from_secs(5), client.next()).await {
        Ok(Some(Ok(msg))) => serde_json::from_str(msg.to_text().unwrap()).unwrap(),
        Ok(Some(Err(e))) => panic!("{operation_name} failed with error: {e:?}"),
        Ok(None) => panic!("{operation_name} returned None (connection closed?)"),
        Err(e) => panic!("{operation_name} timed out: {e:?}"),
    }
}

/// Wait until the room holds `expected` connections
async fn wait_for_members(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.chat.len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room has {} members, expected {expected}", state.chat.len());
}

#[tokio::test]
async fn two_clients_share_the_room() {
    let (state, _dir) = common::setup_test_env().await;
    let owner_cookie = login(&state, "owner@email.com").await;
    let guest_cookie = login(&state, "guest@email.com").await;
    let url = start_server(state.clone()).await;

    let mut owner = connect(&url, &owner_cookie).await;
    wait_for_members(&state, 1).await;
    let mut guest = connect(&url, &guest_cookie).await;
    wait_for_members(&state, 2).await;

    owner.send(Message::text(r#"{"event":"joined"}"#)).await.unwrap();
    let seen_by_owner = next_event(&mut owner, "Owner join").await;
    let seen_by_guest = next_event(&mut guest, "Owner join").await;
    assert_eq!(
        seen_by_owner,
        ChatServerEvent::Status {
            msg: "Owner (Owner) has entered the room.".into(),
            class: StyleClass::SystemMessage,
        }
    );
    assert_eq!(seen_by_owner, seen_by_guest);

    guest
        .send(Message::text(r#"{"event":"message","msg":"hello"}"#))
        .await
        .unwrap();
    let seen_by_owner = next_event(&mut owner, "Guest message").await;
    let seen_by_guest = next_event(&mut guest, "Guest message").await;
    assert_eq!(seen_by_owner, seen_by_guest);
    let ChatServerEvent::Status { msg, .. } = seen_by_owner else {
        panic!("Expected a status line")
    };
    assert_eq!(msg, "Guest (Guest): hello");

    drop(guest);
    wait_for_members(&state, 1).await;

    // a silent drop is not announced
    owner
        .send(Message::text(r#"{"event":"message","msg":"anyone?"}"#))
        .await
        .unwrap();
    let ChatServerEvent::Status { msg, .. } = next_event(&mut owner, "Owner message").await else {
        panic!("Expected a status line")
    };
    assert_eq!(msg, "Owner (Owner): anyone?");
}

#[tokio::test]
async fn socket_without_session_is_refused() {
    let (state, _dir) = common::setup_test_env().await;
    let url = start_server(state.clone()).await;

    assert!(tokio_tungstenite::connect_async(url.as_str()).await.is_err());
    assert!(state.chat.is_empty());
}
