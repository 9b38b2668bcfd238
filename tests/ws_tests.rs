//! Live-update channel over a real WebSocket connection.

use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

mod common;
use common::mocks::{harness, Behavior, TestHarness};

async fn spawn_server(h: &TestHarness) -> std::net::SocketAddr {
    let app = pharos::api::routes::create_router().with_state(h.state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Drain event frames until a terminal event arrives, returning the
/// event_type sequence.
async fn collect_events(
    stream: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
              + Unpin),
) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for event");
        match frame {
            Some(Ok(Message::Text(text))) => {
                let event: serde_json::Value = serde_json::from_str(&text).unwrap();
                let event_type = event["event_type"].as_str().unwrap().to_string();
                events.push(event);
                if event_type == "job_completed" || event_type == "job_failed" {
                    return events;
                }
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => panic!("websocket error: {}", e),
            None => return events,
        }
    }
}

#[tokio::test]
async fn two_early_subscribers_see_the_same_stream() {
    let h = harness(
        Behavior::Items(5),
        Behavior::Items(3),
        Behavior::Items(8),
        Duration::from_secs(5),
    );
    let addr = spawn_server(&h).await;

    let job = h.state.jobs.create("lung cancer trials in India").await.unwrap();

    let url = format!("ws://{}/ws/jobs/{}", addr, job.job_id);
    let (mut ws_a, _) = connect_async(url.as_str()).await.unwrap();
    let (mut ws_b, _) = connect_async(url.as_str()).await.unwrap();

    // The server registers the subscription in the upgrade task after the
    // handshake completes; give it a beat before events start flowing.
    while h.state.events.subscriber_count(job.job_id) < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    h.state.orchestrator.spawn(job.job_id, job.query.clone());

    let events_a = collect_events(&mut ws_a).await;
    let events_b = collect_events(&mut ws_b).await;

    // Schema: {job_id, event_type, payload, timestamp} on every frame.
    for event in &events_a {
        assert_eq!(event["job_id"].as_str().unwrap(), job.job_id.to_string());
        assert!(event["event_type"].is_string());
        assert!(event["payload"].is_object());
        assert!(event["timestamp"].is_string());
    }

    let types = |events: &[serde_json::Value]| -> Vec<String> {
        events
            .iter()
            .map(|e| e["event_type"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(types(&events_a), types(&events_b));
    assert_eq!(types(&events_a).first().unwrap(), "job_started");
    assert_eq!(types(&events_a).last().unwrap(), "job_completed");

    // The completion event carries the report reference.
    let completed = events_a.last().unwrap();
    assert!(completed["payload"]["report_url"]
        .as_str()
        .unwrap()
        .starts_with("/api/reports/"));
}

#[tokio::test]
async fn subscriber_connecting_after_completion_sees_nothing() {
    let h = harness(
        Behavior::Items(2),
        Behavior::Items(2),
        Behavior::Items(2),
        Duration::from_secs(5),
    );
    let addr = spawn_server(&h).await;

    let job = h.state.jobs.create("hepatitis c antivirals").await.unwrap();
    h.state.orchestrator.spawn(job.job_id, job.query.clone());
    h.state.orchestrator.wait(job.job_id).await;

    let url = format!("ws://{}/ws/jobs/{}", addr, job.job_id);
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();

    // No backlog replay: the stream stays silent.
    let outcome = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(outcome.is_err(), "late subscriber unexpectedly received a frame");
}
