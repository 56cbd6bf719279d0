// ABOUTME: Integration tests for failure notifications.
// ABOUTME: Runs a local axum webhook sink and checks what the notifier delivers.

mod support;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use swapd::notify::{LogNotifier, Notifier, WebhookNotifier, from_url};
use tokio::net::TcpListener;

type Received = Arc<Mutex<Vec<Value>>>;

async fn sink(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::default();

    async fn capture(
        State((received, status)): State<(Received, StatusCode)>,
        axum::Json(body): axum::Json<Value>,
    ) -> StatusCode {
        received.lock().push(body);
        status
    }

    let app = Router::new()
        .route("/hook", post(capture))
        .with_state((Arc::clone(&received), status));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/hook", addr), received)
}

#[tokio::test]
async fn webhook_receives_text_payload() {
    support::init_tracing();
    let (url, received) = sink(StatusCode::OK).await;
    let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

    notifier
        .notify("swap to registry.example.com/team/app:v2 failed while pulling: denied")
        .await;

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0]["text"],
        "swap to registry.example.com/team/app:v2 failed while pulling: denied"
    );
}

#[tokio::test]
async fn rejected_delivery_does_not_panic() {
    support::init_tracing();
    let (url, received) = sink(StatusCode::INTERNAL_SERVER_ERROR).await;
    let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

    notifier.notify("boom").await;

    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn unreachable_sink_is_swallowed() {
    support::init_tracing();
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier =
        WebhookNotifier::new(format!("http://{}/hook", addr), Duration::from_secs(2)).unwrap();

    notifier.notify("nobody home").await;
}

#[tokio::test]
async fn no_url_falls_back_to_log_notifier() {
    let notifier = from_url(None, Duration::from_secs(1)).unwrap();
    notifier.notify("logged only").await;

    LogNotifier.notify("also logged").await;
}
