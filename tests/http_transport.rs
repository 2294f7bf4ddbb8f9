//! End-to-end request lifecycle against a local one-shot HTTP responder

use sparkchat::config::Config;
use sparkchat::{Dispatcher, FALLBACK_REPLY, HttpTransport, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

mod common;
use common::{read_request, serve_once};

fn dispatcher_for(endpoint: &str) -> Dispatcher {
    let config = Config {
        endpoint: endpoint.to_string(),
        ..Config::default()
    };
    Dispatcher::new(Arc::new(HttpTransport::new(&config).unwrap()))
}

#[tokio::test]
async fn hello_gets_hi_there() {
    let (url, server) = serve_once("200 OK", r#"{"response":"Hi there"}"#).await;
    let mut dispatcher = dispatcher_for(&url);

    dispatcher.send("Hello").await;

    assert_eq!(
        dispatcher.conversation().all(),
        &[Message::user("Hello"), Message::bot("Hi there")]
    );
    assert!(!dispatcher.is_loading());

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat HTTP/1.1"));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"message":"Hello"}"#));
}

#[tokio::test]
async fn configured_field_name_is_used() {
    let (url, server) = serve_once("200 OK", r#"{"response":"ok"}"#).await;
    let config = Config {
        endpoint: url,
        request_field: "query".to_string(),
        ..Config::default()
    };
    let mut dispatcher = Dispatcher::new(Arc::new(HttpTransport::new(&config).unwrap()));

    dispatcher.send("  Hello  ").await;

    let request = server.await.unwrap();
    assert!(request.ends_with(r#"{"query":"Hello"}"#));
}

#[tokio::test]
async fn error_field_shows_fallback_not_raw_error() {
    let (url, _server) = serve_once("200 OK", r#"{"error":"model exploded"}"#).await;
    let mut dispatcher = dispatcher_for(&url);

    dispatcher.send("Hello").await;

    assert_eq!(
        dispatcher.conversation().all(),
        &[Message::user("Hello"), Message::bot(FALLBACK_REPLY)]
    );
    assert!(
        dispatcher
            .conversation()
            .all()
            .iter()
            .all(|m| !m.text.contains("model exploded"))
    );
}

#[tokio::test]
async fn non_json_body_shows_fallback() {
    let (url, _server) = serve_once("200 OK", "<html>oops</html>").await;
    let mut dispatcher = dispatcher_for(&url);

    dispatcher.send("Hello").await;

    assert_eq!(dispatcher.conversation().last(), Some(&Message::bot(FALLBACK_REPLY)));
}

#[tokio::test]
async fn server_error_status_shows_fallback() {
    let (url, _server) = serve_once("500 Internal Server Error", r#"{"response":"partial"}"#).await;
    let mut dispatcher = dispatcher_for(&url);

    dispatcher.send("Hello").await;

    assert_eq!(dispatcher.conversation().last(), Some(&Message::bot(FALLBACK_REPLY)));
}

#[tokio::test]
async fn network_failure_shows_fallback() {
    // Reserve a port, then close it so the connection is refused
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut dispatcher = dispatcher_for(&format!("http://{addr}/chat"));
    dispatcher.send("Hello").await;

    assert_eq!(
        dispatcher.conversation().all(),
        &[Message::user("Hello"), Message::bot(FALLBACK_REPLY)]
    );
    assert!(!dispatcher.is_loading());
}

#[tokio::test]
async fn timeout_is_treated_as_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut socket).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let config = Config {
        endpoint: format!("http://{addr}/chat"),
        request_timeout_secs: Some(1),
        ..Config::default()
    };
    let mut dispatcher = Dispatcher::new(Arc::new(HttpTransport::new(&config).unwrap()));

    dispatcher.send("Hello").await;

    assert_eq!(dispatcher.conversation().last(), Some(&Message::bot(FALLBACK_REPLY)));
}
