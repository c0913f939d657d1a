//! Simulated chunk encoder for tests and headless runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use invigil_common::error::{InvigilError, InvigilResult};
use tokio::sync::mpsc;

use crate::encoder::{ChunkEncoder, EncoderEvent, EncoderFactory};
use crate::profile::{EncoderProfile, PROFILE_FALLBACK_ORDER};

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct SimShared {
    tx: Option<mpsc::Sender<EncoderEvent>>,
    pending: Vec<u8>,
    running: bool,
}

impl SimShared {
    fn send(&self, event: EncoderEvent) {
        if let Some(tx) = &self.tx {
            if tx.try_send(event).is_err() {
                tracing::warn!("Sim encoder event dropped; consumer is behind");
            }
        }
    }
}

/// In-process encoder whose output is scripted by tests.
///
/// Chunks are driven through a [`SimEncoderHandle`]: `emit_now` plays
/// the role of a cadence tick delivering a finished chunk, while
/// `buffer` stashes bytes that only a flush (or stop) will emit. The
/// stop sequence mirrors platform recorders: the final buffered chunk
/// goes out first, then the `Stopped` acknowledgment.
pub struct SimEncoder {
    shared: Arc<Mutex<SimShared>>,
}

impl SimEncoder {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimShared {
                tx: None,
                pending: Vec::new(),
                running: false,
            })),
        }
    }

    /// A driving handle for scripting this encoder's output.
    pub fn handle(&self) -> SimEncoderHandle {
        SimEncoderHandle {
            shared: self.shared.clone(),
        }
    }
}

impl Default for SimEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChunkEncoder for SimEncoder {
    async fn start(&mut self, timeslice: Duration) -> InvigilResult<mpsc::Receiver<EncoderEvent>> {
        let mut shared = self.shared.lock().unwrap();
        if shared.running {
            return Err(InvigilError::encoder("sim encoder already started"));
        }
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        shared.tx = Some(tx);
        shared.running = true;
        tracing::debug!(timeslice_ms = timeslice.as_millis() as u64, "Sim encoder started");
        Ok(rx)
    }

    fn request_data(&mut self) -> InvigilResult<()> {
        let mut shared = self.shared.lock().unwrap();
        if !shared.running {
            return Err(InvigilError::encoder("sim encoder is not running"));
        }
        let flushed = std::mem::take(&mut shared.pending);
        tracing::debug!(size = flushed.len(), "Sim encoder flush");
        shared.send(EncoderEvent::Chunk(flushed));
        Ok(())
    }

    fn stop(&mut self) -> InvigilResult<()> {
        let mut shared = self.shared.lock().unwrap();
        if !shared.running {
            return Err(InvigilError::encoder("sim encoder is not running"));
        }
        shared.running = false;
        let tail = std::mem::take(&mut shared.pending);
        if !tail.is_empty() {
            shared.send(EncoderEvent::Chunk(tail));
        }
        shared.send(EncoderEvent::Stopped);
        shared.tx = None;
        tracing::debug!("Sim encoder stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.lock().unwrap().running
    }
}

/// Scripting handle for a [`SimEncoder`].
#[derive(Clone)]
pub struct SimEncoderHandle {
    shared: Arc<Mutex<SimShared>>,
}

impl SimEncoderHandle {
    /// Deliver a finished chunk immediately, as a cadence tick would.
    pub fn emit_now(&self, bytes: Vec<u8>) {
        let shared = self.shared.lock().unwrap();
        if !shared.running {
            tracing::debug!("Ignoring chunk emission; sim encoder not running");
            return;
        }
        shared.send(EncoderEvent::Chunk(bytes));
    }

    /// Stash bytes that only a flush or the stop sequence will emit.
    pub fn buffer(&self, bytes: &[u8]) {
        let mut shared = self.shared.lock().unwrap();
        if !shared.running {
            tracing::debug!("Ignoring buffered bytes; sim encoder not running");
            return;
        }
        shared.pending.extend_from_slice(bytes);
    }

    /// Whether the encoder is still running.
    pub fn is_running(&self) -> bool {
        self.shared.lock().unwrap().running
    }
}

/// Factory handing out sim encoders, with observation points for the
/// profile and bitrate each open actually used.
pub struct SimEncoderFactory {
    supported: Vec<String>,
    last_handle: Mutex<Option<SimEncoderHandle>>,
    last_open: Mutex<Option<(String, u32)>>,
}

impl SimEncoderFactory {
    /// A factory supporting the whole webm fallback order.
    pub fn new() -> Self {
        Self::supporting(PROFILE_FALLBACK_ORDER)
    }

    /// A factory supporting only the given profile strings.
    pub fn supporting<I, S>(mimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported: mimes.into_iter().map(Into::into).collect(),
            last_handle: Mutex::new(None),
            last_open: Mutex::new(None),
        }
    }

    /// Handle for the most recently opened encoder.
    pub fn last_handle(&self) -> Option<SimEncoderHandle> {
        self.last_handle.lock().unwrap().clone()
    }

    /// Profile string and bitrate of the most recent open.
    pub fn last_open(&self) -> Option<(String, u32)> {
        self.last_open.lock().unwrap().clone()
    }
}

impl Default for SimEncoderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderFactory for SimEncoderFactory {
    fn supports(&self, mime: &str) -> bool {
        self.supported.iter().any(|m| m == mime)
    }

    fn open(
        &self,
        profile: &EncoderProfile,
        bitrate_bps: u32,
    ) -> InvigilResult<Box<dyn ChunkEncoder>> {
        let encoder = SimEncoder::new();
        *self.last_handle.lock().unwrap() = Some(encoder.handle());
        *self.last_open.lock().unwrap() = Some((profile.mime().to_string(), bitrate_bps));
        Ok(Box::new(encoder))
    }
}
