//! Orchestrator behavior: pipeline ordering, bulkhead isolation, progress
//! monotonicity, and event delivery guarantees.

use std::time::{Duration, Instant};

use pharos::types::{EventType, JobStatus};

mod common;
use common::mocks::{harness, Behavior};

#[tokio::test]
async fn progress_is_monotonic_across_the_run() {
    let h = harness(
        Behavior::Delayed(Duration::from_millis(50), 5),
        Behavior::Delayed(Duration::from_millis(80), 3),
        Behavior::Delayed(Duration::from_millis(30), 8),
        Duration::from_secs(5),
    );

    let job = h.state.jobs.create("copd therapies in Europe").await.unwrap();
    h.state
        .orchestrator
        .spawn(job.job_id, job.query.clone());

    let mut samples = Vec::new();
    loop {
        let current = h.state.jobs.get(job.job_id).await.unwrap();
        samples.push(current.progress);
        if matches!(current.status, JobStatus::Completed | JobStatus::Failed) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    h.state.orchestrator.wait(job.job_id).await;

    assert!(
        samples.windows(2).all(|w| w[0] <= w[1]),
        "progress regressed: {:?}",
        samples
    );
    let final_job = h.state.jobs.get(job.job_id).await.unwrap();
    assert_eq!(final_job.progress, 100);
}

#[tokio::test]
async fn subscribers_see_the_identical_ordered_event_sequence() {
    let h = harness(
        Behavior::Items(5),
        Behavior::Items(3),
        Behavior::Items(8),
        Duration::from_secs(5),
    );

    let job = h.state.jobs.create("hypertension generics market").await.unwrap();

    // Both connected before the job starts.
    let (_a, mut rx_a) = h.state.events.subscribe(job.job_id);
    let (_b, mut rx_b) = h.state.events.subscribe(job.job_id);

    h.state
        .orchestrator
        .spawn(job.job_id, job.query.clone());
    h.state.orchestrator.wait(job.job_id).await;

    let mut seq_a = Vec::new();
    while let Ok(event) = rx_a.try_recv() {
        seq_a.push((event.event_type, serde_json::to_value(&event.payload).unwrap()));
    }
    let mut seq_b = Vec::new();
    while let Ok(event) = rx_b.try_recv() {
        seq_b.push((event.event_type, serde_json::to_value(&event.payload).unwrap()));
    }

    assert_eq!(seq_a, seq_b);
    assert_eq!(seq_a.first().unwrap().0, EventType::JobStarted);
    assert_eq!(seq_a.last().unwrap().0, EventType::JobCompleted);
    // One running + one settled update per worker.
    let agent_updates = seq_a
        .iter()
        .filter(|(t, _)| *t == EventType::AgentUpdate)
        .count();
    assert_eq!(agent_updates, 6);
}

#[tokio::test]
async fn one_hanging_worker_does_not_delay_the_others() {
    let h = harness(
        Behavior::Delayed(Duration::from_millis(50), 5),
        Behavior::Hang,
        Behavior::Delayed(Duration::from_millis(50), 8),
        Duration::from_millis(300),
    );

    let job = h.state.jobs.create("oncology pipeline in Japan").await.unwrap();
    let started = Instant::now();
    h.state
        .orchestrator
        .spawn(job.job_id, job.query.clone());
    h.state.orchestrator.wait(job.job_id).await;
    let elapsed = started.elapsed();

    // The run is bounded by the timeout, not by the hang.
    assert!(
        elapsed < Duration::from_secs(2),
        "run took {:?}, hang leaked past the timeout",
        elapsed
    );

    let final_job = h.state.jobs.get(job.job_id).await.unwrap();
    assert_eq!(final_job.status, JobStatus::Completed);
    let patents = final_job.agent(pharos::types::PATENT_AGENT).unwrap();
    assert_eq!(patents.error.as_deref(), Some("Timeout"));
}

#[tokio::test]
async fn run_for_unknown_job_publishes_job_failed() {
    let h = harness(
        Behavior::Items(1),
        Behavior::Items(1),
        Behavior::Items(1),
        Duration::from_secs(5),
    );

    let phantom = uuid::Uuid::new_v4();
    let (_id, mut rx) = h.state.events.subscribe(phantom);

    h.state
        .orchestrator
        .spawn(phantom, "query for a job that was never created".to_string());
    h.state.orchestrator.wait(phantom).await;

    let event = rx.try_recv().expect("expected a terminal event");
    assert_eq!(event.event_type, EventType::JobFailed);
}

#[tokio::test]
async fn background_runs_are_tracked_until_joined() {
    let h = harness(
        Behavior::Delayed(Duration::from_millis(200), 1),
        Behavior::Items(1),
        Behavior::Items(1),
        Duration::from_secs(5),
    );

    let job = h.state.jobs.create("antibiotic resistance landscape").await.unwrap();
    h.state
        .orchestrator
        .spawn(job.job_id, job.query.clone());
    assert_eq!(h.state.orchestrator.running_jobs(), 1);

    assert!(h.state.orchestrator.wait(job.job_id).await);
    assert_eq!(h.state.orchestrator.running_jobs(), 0);
    // A second wait on the same id reports nothing tracked.
    assert!(!h.state.orchestrator.wait(job.job_id).await);
}

#[tokio::test]
async fn late_subscriber_receives_no_backlog() {
    let h = harness(
        Behavior::Items(5),
        Behavior::Items(3),
        Behavior::Items(8),
        Duration::from_secs(5),
    );

    let job = h.state.jobs.create("statin market dynamics").await.unwrap();
    h.state
        .orchestrator
        .spawn(job.job_id, job.query.clone());
    h.state.orchestrator.wait(job.job_id).await;

    // Everything already happened; a fresh subscriber sees silence.
    let (_id, mut rx) = h.state.events.subscribe(job.job_id);
    assert!(rx.try_recv().is_err());
}
