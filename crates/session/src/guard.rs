//! Session guard: exclusive owner of live capture resources.
//!
//! The guard runs as a single task that owns the stream and recorder
//! for one session at a time. Callers talk to it through a handle;
//! internal signals (track ended, encoder chunks) arrive over channels
//! into the same event loop, so every transition happens in one place
//! and no lock ever guards a live resource.

use std::sync::Arc;

use invigil_capture::backend::CaptureBackend;
use invigil_capture::negotiator::CaptureNegotiator;
use invigil_capture::stream::CaptureStream;
use invigil_common::clock::SessionClock;
use invigil_common::config::AppConfig;
use invigil_common::error::{InvigilError, InvigilResult};
use invigil_recorder::artifact::Artifact;
use invigil_recorder::encoder::{EncoderEvent, EncoderFactory};
use invigil_recorder::engine::{RecorderEngine, RecorderHandle};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::metadata::QualitySetting;
use crate::state::{transition, SessionEvent, SessionStatus};

/// Per-session recording options.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Caller-selected bitrate override (e.g. from a quality preset).
    pub override_bitrate: Option<u32>,

    /// Process-configured default bitrate.
    pub configured_bitrate: Option<u32>,
}

impl SessionConfig {
    /// Use a quality preset as the bitrate override.
    pub fn with_quality(quality: QualitySetting) -> Self {
        Self {
            override_bitrate: Some(quality.bitrate_bps()),
            configured_bitrate: None,
        }
    }

    /// Take the configured default bitrate from the application config.
    /// Environment overrides have already been folded in by
    /// [`AppConfig::load`], so they arrive here as the configured value.
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            override_bitrate: None,
            configured_bitrate: app.recording.video_bitrate_bps,
        }
    }
}

/// Observable session state, published on every change.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,

    /// Whether the platform, not the caller, ended the recording.
    pub involuntary: bool,

    /// Message of the most recent failure, if any.
    pub error: Option<String>,

    /// Correlates every log line and outcome of one start attempt.
    pub attempt_id: Option<Uuid>,
}

/// Terminal result of a session, retrievable exactly once.
///
/// A viable artifact and an involuntary flag can coexist: a recording
/// cut short by the platform is still worth delivering.
#[derive(Debug)]
pub struct SessionOutcome {
    pub artifact: Option<Artifact>,
    pub involuntary: bool,
    pub error: Option<InvigilError>,
}

enum Command {
    Start(oneshot::Sender<InvigilResult<()>>),
    Stop(oneshot::Sender<InvigilResult<()>>),
    Reset(oneshot::Sender<InvigilResult<()>>),
    TakeOutcome(oneshot::Sender<Option<SessionOutcome>>),
    Teardown(oneshot::Sender<()>),
}

enum Step {
    Command(Option<Command>),
    TrackEnded,
    Encoder(Option<EncoderEvent>),
}

/// Spawns guard actors.
pub struct SessionGuard;

impl SessionGuard {
    /// Spawn a guard over the given capture backend and encoder
    /// factory. The returned handle is the only way to talk to it.
    pub fn spawn(
        backend: Arc<dyn CaptureBackend>,
        encoders: Arc<dyn EncoderFactory>,
        config: SessionConfig,
    ) -> GuardHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            status: SessionStatus::Idle,
            involuntary: false,
            error: None,
            attempt_id: None,
        });
        let (recording_tx, recording_rx) = watch::channel(false);

        let actor = GuardActor {
            backend,
            encoders,
            config,
            status: SessionStatus::Idle,
            attempt_id: None,
            stream: None,
            recorder: None,
            ended: None,
            clock: None,
            involuntary: false,
            last_error: None,
            outcome: None,
            snapshot_tx,
            recording_tx,
        };
        tokio::spawn(actor.run(cmd_rx));

        GuardHandle {
            commands: cmd_tx,
            snapshots: snapshot_rx,
            recording: recording_rx,
        }
    }
}

/// Caller-side handle to a guard actor.
#[derive(Clone)]
pub struct GuardHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    recording: watch::Receiver<bool>,
}

impl GuardHandle {
    /// Start a session: negotiate capture, open the recorder, begin
    /// collecting chunks.
    ///
    /// Returns `Err` only when starting is illegal in the current
    /// state. Negotiation and recorder failures move the session to
    /// errored instead; read them from the snapshot or the outcome.
    pub async fn start(&self) -> InvigilResult<()> {
        self.request(Command::Start).await
    }

    /// Stop an active recording and finalize. Resolves once the
    /// artifact decision has been made and the tracks are released.
    pub async fn stop(&self) -> InvigilResult<()> {
        self.request(Command::Stop).await
    }

    /// Return a terminal session to idle for a fresh attempt.
    pub async fn reset(&self) -> InvigilResult<()> {
        self.request(Command::Reset).await
    }

    /// Take the terminal outcome. The first call after a session ends
    /// gets it; every later call sees `None`.
    pub async fn take_outcome(&self) -> Option<SessionOutcome> {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::TakeOutcome(tx)).await.is_err() {
            return None;
        }
        rx.await.unwrap_or(None)
    }

    /// Release everything without finalizing; the guard task exits.
    pub async fn teardown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Teardown(tx)).await.is_ok() {
            rx.await.ok();
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.snapshot().status
    }

    /// Subscribe to snapshot updates.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// The recording flag that drives the elapsed-time reporter.
    pub fn recording_signal(&self) -> watch::Receiver<bool> {
        self.recording.clone()
    }

    /// Wait until the session reaches finished or errored.
    pub async fn wait_terminal(&self) -> SessionSnapshot {
        let mut rx = self.snapshots.clone();
        loop {
            {
                let snap = rx.borrow_and_update();
                if snap.status.is_terminal() {
                    return snap.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshots.borrow().clone();
            }
        }
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<InvigilResult<()>>) -> Command,
    ) -> InvigilResult<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| InvigilError::session("session guard is gone"))?;
        rx.await
            .map_err(|_| InvigilError::session("session guard dropped the request"))?
    }
}

struct GuardActor {
    backend: Arc<dyn CaptureBackend>,
    encoders: Arc<dyn EncoderFactory>,
    config: SessionConfig,
    status: SessionStatus,
    attempt_id: Option<Uuid>,
    stream: Option<CaptureStream>,
    recorder: Option<RecorderHandle>,
    ended: Option<watch::Receiver<bool>>,
    clock: Option<SessionClock>,
    involuntary: bool,
    last_error: Option<String>,
    outcome: Option<SessionOutcome>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    recording_tx: watch::Sender<bool>,
}

impl GuardActor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::debug!("Session guard started");
        loop {
            let step = {
                let ended = self.ended.as_mut();
                let recorder = self.recorder.as_mut();
                tokio::select! {
                    cmd = commands.recv() => Step::Command(cmd),
                    _ = wait_track_ended(ended) => Step::TrackEnded,
                    event = wait_encoder_event(recorder) => Step::Encoder(event),
                }
            };

            match step {
                Step::Command(Some(cmd)) => {
                    if self.handle_command(cmd).await {
                        break;
                    }
                }
                Step::Command(None) => {
                    tracing::debug!(
                        attempt = ?self.attempt_id,
                        "All guard handles dropped; releasing session resources"
                    );
                    self.release_resources();
                    break;
                }
                Step::TrackEnded => self.on_track_ended().await,
                Step::Encoder(Some(event)) => {
                    if let Some(recorder) = self.recorder.as_mut() {
                        recorder.absorb(event);
                    }
                }
                Step::Encoder(None) => self.on_encoder_closed().await,
            }
        }
        tracing::debug!(attempt = ?self.attempt_id, "Session guard exited");
    }

    /// Returns true when the actor should exit.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Start(ack) => {
                let result = self.run_start().await;
                ack.send(result).ok();
                false
            }
            Command::Stop(ack) => {
                let result = self.run_explicit_stop().await;
                ack.send(result).ok();
                false
            }
            Command::Reset(ack) => {
                let result = self.run_reset();
                ack.send(result).ok();
                false
            }
            Command::TakeOutcome(ack) => {
                ack.send(self.outcome.take()).ok();
                false
            }
            Command::Teardown(ack) => {
                tracing::info!(attempt = ?self.attempt_id, "Tearing down session guard");
                self.release_resources();
                ack.send(()).ok();
                true
            }
        }
    }

    async fn run_start(&mut self) -> InvigilResult<()> {
        self.apply_command_event(SessionEvent::StartRequested)?;

        let attempt = Uuid::new_v4();
        self.attempt_id = Some(attempt);
        self.involuntary = false;
        self.last_error = None;
        self.outcome = None;
        self.publish();
        tracing::info!(attempt = %attempt, "Starting recording session");

        let negotiator = CaptureNegotiator::new(self.backend.clone());
        let stream = match negotiator.request_monitor_capture().await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail_start(e);
                return Ok(());
            }
        };

        // Subscribe before anything else can end the track, so an
        // immediate revocation is never missed.
        let ended = stream.ended_signal();

        let recorder = match RecorderEngine::open(
            self.encoders.as_ref(),
            self.config.override_bitrate,
            self.config.configured_bitrate,
        )
        .await
        {
            Ok(handle) => handle,
            Err(e) => {
                let mut stream = stream;
                stream.stop_tracks();
                self.fail_start(e);
                return Ok(());
            }
        };

        tracing::info!(
            attempt = %attempt,
            bitrate_bps = recorder.bitrate_bps(),
            profile = recorder.profile().mime(),
            "Recording started"
        );

        self.stream = Some(stream);
        self.ended = Some(ended);
        self.recorder = Some(recorder);
        self.clock = Some(SessionClock::start());
        self.apply_internal_event(SessionEvent::CaptureReady);
        self.recording_tx.send(true).ok();
        Ok(())
    }

    fn fail_start(&mut self, error: InvigilError) {
        tracing::warn!(attempt = ?self.attempt_id, error = %error, "Session start failed");
        self.last_error = Some(error.to_string());
        self.apply_internal_event(SessionEvent::CaptureFailed);
        self.outcome = Some(SessionOutcome {
            artifact: None,
            involuntary: false,
            error: Some(error),
        });
        self.recording_tx.send(false).ok();
    }

    async fn run_explicit_stop(&mut self) -> InvigilResult<()> {
        self.apply_command_event(SessionEvent::StopRequested)?;
        self.finalize_session().await;
        Ok(())
    }

    async fn on_track_ended(&mut self) {
        if self.status != SessionStatus::Recording {
            tracing::debug!(
                attempt = ?self.attempt_id,
                status = %self.status,
                "Track ended outside recording; ignoring"
            );
            self.ended = None;
            return;
        }
        tracing::warn!(
            attempt = ?self.attempt_id,
            "Screen sharing ended by the platform; stopping the session"
        );
        self.involuntary = true;
        self.apply_internal_event(SessionEvent::TrackEnded);
        self.finalize_session().await;
    }

    async fn on_encoder_closed(&mut self) {
        if self.status == SessionStatus::Recording {
            tracing::warn!(
                attempt = ?self.attempt_id,
                "Encoder went away mid-recording; stopping the session"
            );
            self.involuntary = true;
            self.apply_internal_event(SessionEvent::TrackEnded);
            self.finalize_session().await;
        } else {
            self.recorder = None;
        }
    }

    /// Runs with status already at stopping. Ordering is the contract:
    /// finalize first, release tracks second, so the final chunks are
    /// in hand before the platform capture goes away.
    async fn finalize_session(&mut self) {
        self.recording_tx.send(false).ok();

        let finalized = match self.recorder.take() {
            Some(handle) => handle.finish().await,
            None => Err(InvigilError::session("no active recorder to finalize")),
        };

        self.release_stream();

        if let Some(clock) = self.clock.take() {
            tracing::info!(
                attempt = ?self.attempt_id,
                duration_secs = clock.elapsed_secs(),
                "Recording stopped"
            );
        }

        match finalized {
            Ok(artifact) => {
                self.apply_internal_event(SessionEvent::FinalizeSucceeded);
                self.outcome = Some(SessionOutcome {
                    artifact: Some(artifact),
                    involuntary: self.involuntary,
                    error: None,
                });
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.apply_internal_event(SessionEvent::FinalizeFailed);
                self.outcome = Some(SessionOutcome {
                    artifact: None,
                    involuntary: self.involuntary,
                    error: Some(e),
                });
            }
        }
    }

    fn run_reset(&mut self) -> InvigilResult<()> {
        let next = transition(self.status, SessionEvent::Reset)
            .map_err(|denied| InvigilError::session(denied.to_string()))?;
        let attempt = self.attempt_id.take();
        self.involuntary = false;
        self.last_error = None;
        self.outcome = None;
        self.clock = None;
        self.set_status(next, SessionEvent::Reset);
        tracing::info!(attempt = ?attempt, "Session reset to idle");
        Ok(())
    }

    fn apply_command_event(&mut self, event: SessionEvent) -> InvigilResult<()> {
        match transition(self.status, event) {
            Ok(next) => {
                self.set_status(next, event);
                Ok(())
            }
            Err(denied) => Err(InvigilError::session(denied.to_string())),
        }
    }

    fn apply_internal_event(&mut self, event: SessionEvent) {
        match transition(self.status, event) {
            Ok(next) => self.set_status(next, event),
            Err(denied) => tracing::warn!(
                attempt = ?self.attempt_id,
                %denied,
                "Ignoring out-of-order internal event"
            ),
        }
    }

    fn set_status(&mut self, next: SessionStatus, event: SessionEvent) {
        tracing::debug!(
            attempt = ?self.attempt_id,
            from = %self.status,
            to = %next,
            event = ?event,
            "Session transition"
        );
        self.status = next;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx
            .send(SessionSnapshot {
                status: self.status,
                involuntary: self.involuntary,
                error: self.last_error.clone(),
                attempt_id: self.attempt_id,
            })
            .ok();
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
        self.ended = None;
    }

    fn release_resources(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.abort();
        }
        self.release_stream();
        self.recording_tx.send(false).ok();
    }
}

async fn wait_track_ended(watch: Option<&mut watch::Receiver<bool>>) {
    match watch {
        Some(rx) => loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone: the source no longer exists.
                return;
            }
        },
        None => std::future::pending().await,
    }
}

async fn wait_encoder_event(recorder: Option<&mut RecorderHandle>) -> Option<EncoderEvent> {
    match recorder {
        Some(handle) => handle.next_event().await,
        None => std::future::pending().await,
    }
}
