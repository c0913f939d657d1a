//! Elapsed-time reporting.
//!
//! Purely presentational: a one-second counter driven by the guard's
//! recording flag. It counts up while the flag is up and snaps back to
//! zero the moment recording stops. Nothing in the recording core
//! depends on it.

use std::time::Duration;

use invigil_common::clock::format_hms;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct CounterState {
    seconds: u64,
    counting: bool,
}

impl CounterState {
    fn on_flag(&mut self, recording: bool) {
        self.counting = recording;
        if !recording {
            self.seconds = 0;
        }
    }

    fn on_tick(&mut self) {
        if self.counting {
            self.seconds += 1;
        }
    }
}

/// One-second elapsed counter bound to a recording flag.
pub struct ElapsedReporter {
    seconds_rx: watch::Receiver<u64>,
    task: tokio::task::JoinHandle<()>,
}

impl ElapsedReporter {
    /// Spawn the counter task against a guard's recording signal.
    pub fn spawn(recording: watch::Receiver<bool>) -> Self {
        let (tx, rx) = watch::channel(0);
        let task = tokio::spawn(run_counter(recording, tx));
        Self {
            seconds_rx: rx,
            task,
        }
    }

    /// Subscribe to elapsed-seconds updates.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.seconds_rx.clone()
    }

    /// Seconds counted so far in the current recording.
    pub fn elapsed_secs(&self) -> u64 {
        *self.seconds_rx.borrow()
    }

    /// Zero-padded `HH:MM:SS` rendering of the counter.
    pub fn render(&self) -> String {
        format_hms(self.elapsed_secs())
    }
}

impl Drop for ElapsedReporter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_counter(mut recording: watch::Receiver<bool>, tx: watch::Sender<u64>) {
    let mut state = CounterState {
        seconds: 0,
        counting: *recording.borrow(),
    };

    loop {
        if state.counting {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    state.on_tick();
                    tx.send(state.seconds).ok();
                }
                changed = recording.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    state.on_flag(*recording.borrow());
                    tx.send(state.seconds).ok();
                }
            }
        } else {
            if recording.changed().await.is_err() {
                break;
            }
            state.on_flag(*recording.borrow());
            tx.send(state.seconds).ok();
        }
    }
}
