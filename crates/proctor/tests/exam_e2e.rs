use std::sync::Arc;

use invigil_capture::sim::SimCaptureBackend;
use invigil_capture::surface::CaptureSurface;
use invigil_delivery::sim::SimDeliveryStore;
use invigil_proctor::admission::{AdmissionDesk, AdmissionForm};
use invigil_proctor::flow::ExamFlow;
use invigil_proctor::stores::{SimRoster, SimSettingsStore};
use invigil_recorder::sim::SimEncoderFactory;
use invigil_session::guard::SessionConfig;
use invigil_session::metadata::{ExamPart, QualitySetting, SessionMetadata};
use invigil_session::state::SessionStatus;

fn metadata(part: ExamPart) -> SessionMetadata {
    SessionMetadata {
        first_name: "Min-Jun".into(),
        last_name: "Kim".into(),
        email: "minjun@example.com".into(),
        part,
    }
}

fn rig(
    backend: SimCaptureBackend,
    config: SessionConfig,
) -> (
    ExamFlow,
    Arc<SimCaptureBackend>,
    Arc<SimEncoderFactory>,
    Arc<SimDeliveryStore>,
) {
    // First call wins; lets RUST_LOG surface traces from these tests.
    invigil_common::logging::init_default_logging();
    let backend = Arc::new(backend);
    let encoders = Arc::new(SimEncoderFactory::new());
    let store = Arc::new(SimDeliveryStore::new());
    let flow = ExamFlow::new(
        backend.clone(),
        encoders.clone(),
        store.clone(),
        metadata(ExamPart::Part1),
        config,
    );
    (flow, backend, encoders, store)
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn three_chunks_and_an_explicit_stop_deliver_once() {
    let (flow, backend, encoders, store) = rig(
        SimCaptureBackend::granting(CaptureSurface::Monitor),
        SessionConfig::default(),
    );

    flow.begin().await.expect("begin");
    assert_eq!(flow.guard().status(), SessionStatus::Recording);

    let encoder = encoders.last_handle().expect("encoder");
    encoder.emit_now(vec![1u8; 400]);
    encoder.emit_now(vec![2u8; 600]);
    encoder.emit_now(vec![3u8; 500]);

    let report = flow.finish().await.expect("finish");
    assert_eq!(report.status, SessionStatus::Finished);
    assert!(!report.involuntary);
    assert!(report.delivered);
    assert!(backend.last_grant_released());

    assert_eq!(store.delivery_count(), 1);
    let stored = store.last_stored().expect("stored recording");
    assert_eq!(stored.size_bytes, 1500);
    assert_eq!(stored.folder, "min-jun_kim");
    assert_eq!(stored.part, "Part 1");
    assert_eq!(stored.end_reason, "manual");
    assert!(stored.object_name.starts_with("part1_"));
}

#[tokio::test]
async fn a_window_grant_records_and_delivers_nothing() {
    let (flow, backend, encoders, store) = rig(
        SimCaptureBackend::granting(CaptureSurface::Window),
        SessionConfig::default(),
    );

    flow.begin().await.expect("begin");
    let report = flow.conclude().await.expect("conclude");

    assert_eq!(report.status, SessionStatus::Errored);
    assert!(!report.delivered);
    assert!(report
        .error
        .as_deref()
        .expect("session error")
        .contains("a full monitor is required"));

    // The misgranted stream was released and no encoder ever opened.
    assert!(backend.last_grant_released());
    assert!(encoders.last_handle().is_none());
    assert_eq!(store.delivery_count(), 0);
}

#[tokio::test]
async fn an_involuntary_end_still_delivers_the_recording() {
    let (flow, backend, encoders, store) = rig(
        SimCaptureBackend::granting(CaptureSurface::Monitor),
        SessionConfig::default(),
    );

    flow.begin().await.expect("begin");
    let encoder = encoders.last_handle().expect("encoder");
    encoder.emit_now(vec![7u8; 800]);
    settle().await;

    backend.revoke();
    let report = flow.conclude().await.expect("conclude");

    assert_eq!(report.status, SessionStatus::Finished);
    assert!(report.involuntary);
    assert!(report.delivered);
    assert_eq!(store.delivery_count(), 1);

    let stored = store.last_stored().expect("stored recording");
    assert_eq!(stored.size_bytes, 800);
    assert_eq!(stored.end_reason, "interrupted");
}

#[tokio::test]
async fn admission_gates_the_whole_journey() {
    let settings = SimSettingsStore::configured("exam-2026", "halt1", "halt2");
    let roster = Arc::new(SimRoster::new());
    let desk = AdmissionDesk::new(Arc::new(settings), roster.clone());

    let metadata = desk
        .validate_and_start(&AdmissionForm {
            access_code: "exam-2026".into(),
            first_name: "Min-Jun".into(),
            last_name: "Kim".into(),
            email: "minjun@example.com".into(),
            part: "Part 2".into(),
        })
        .await
        .expect("admission");
    assert_eq!(roster.count(), 1);

    let backend = Arc::new(SimCaptureBackend::granting(CaptureSurface::Monitor));
    let encoders = Arc::new(SimEncoderFactory::new());
    let store = Arc::new(SimDeliveryStore::new());
    let flow = ExamFlow::new(
        backend,
        encoders.clone(),
        store.clone(),
        metadata.clone(),
        SessionConfig::with_quality(QualitySetting::Medium),
    );

    flow.begin().await.expect("begin");
    let (_, bitrate) = encoders.last_open().expect("encoder opened");
    assert_eq!(bitrate, 1_500_000);
    encoders
        .last_handle()
        .expect("encoder")
        .emit_now(vec![9u8; 2048]);

    // Stop needs this part's password; the other part's is refused.
    desk.authorize_stop(metadata.part, "halt1")
        .await
        .expect_err("wrong part password");
    desk.authorize_stop(metadata.part, "halt2")
        .await
        .expect("stop authorized");

    let report = flow.finish().await.expect("finish");
    assert!(report.delivered);

    let stored = store.last_stored().expect("stored recording");
    assert_eq!(stored.part, "Part 2");
    assert!(stored.object_name.starts_with("part2_"));
    assert_eq!(stored.student_id, "minjun@example.com");
}
