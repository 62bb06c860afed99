//! Debounced background persistence
//!
//! Coalesces bursts of snapshots into one store write after a quiescence
//! window. Only the most recent snapshot is ever written; dropping the
//! writer flushes whatever is pending.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::store::KvStore;

enum Msg {
    Snapshot(String),
    Flush(Sender<()>),
    Shutdown,
}

/// Writes snapshots to one store key, debounced over a quiescence window.
pub struct DebouncedWriter {
    tx: Sender<Msg>,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    /// Spawn the writer thread over the given store and key.
    pub fn new(store: Box<dyn KvStore + Send>, key: &str, window: Duration) -> Self {
        let (tx, rx) = unbounded::<Msg>();
        let key = key.to_string();

        let handle = thread::spawn(move || {
            let mut store = store;
            let mut pending: Option<String> = None;

            let mut write_pending = |store: &mut Box<dyn KvStore + Send>,
                                     pending: &mut Option<String>| {
                if let Some(snapshot) = pending.take() {
                    match store.set(&key, &snapshot) {
                        Ok(()) => debug!(bytes = snapshot.len(), "debounced write"),
                        Err(err) => warn!(%err, "debounced write failed"),
                    }
                }
            };

            loop {
                let msg = match rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                };
                match msg {
                    Msg::Snapshot(snapshot) => {
                        pending = Some(snapshot);
                        // Keep absorbing snapshots until the burst goes quiet
                        loop {
                            match rx.recv_timeout(window) {
                                Ok(Msg::Snapshot(snapshot)) => pending = Some(snapshot),
                                Ok(Msg::Flush(ack)) => {
                                    write_pending(&mut store, &mut pending);
                                    let _ = ack.send(());
                                    break;
                                }
                                Ok(Msg::Shutdown) => {
                                    write_pending(&mut store, &mut pending);
                                    return;
                                }
                                Err(RecvTimeoutError::Timeout) => {
                                    write_pending(&mut store, &mut pending);
                                    break;
                                }
                                Err(RecvTimeoutError::Disconnected) => {
                                    write_pending(&mut store, &mut pending);
                                    return;
                                }
                            }
                        }
                    }
                    Msg::Flush(ack) => {
                        write_pending(&mut store, &mut pending);
                        let _ = ack.send(());
                    }
                    Msg::Shutdown => {
                        write_pending(&mut store, &mut pending);
                        return;
                    }
                }
            }
            write_pending(&mut store, &mut pending);
        });

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Queue a snapshot; an unwritten earlier snapshot is discarded.
    pub fn submit(&self, snapshot: String) {
        let _ = self.tx.send(Msg::Snapshot(snapshot));
    }

    /// Write any pending snapshot now and wait for it to land.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(Msg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
