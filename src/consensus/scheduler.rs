use crate::consensus::ConsensusEngine;
use crate::error::{BlockchainError, Result};
use crate::network::PeerClient;
use crate::node::Node;
use log::{debug, info};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs a consensus pass every `interval` on a background thread until
/// stopped or dropped
pub struct SyncScheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    pub fn start(
        engine: Arc<ConsensusEngine>,
        node: Arc<Node>,
        client: Arc<dyn PeerClient>,
        interval: Duration,
    ) -> Result<SyncScheduler> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("sync-scheduler".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let outcome = engine.run(&node, client.as_ref());
                        debug!("Scheduled consensus pass: {outcome:?}");
                    }
                    // a stop message or a dropped sender both end the loop
                    _ => break,
                }
            })
            .map_err(|e| {
                BlockchainError::Io(format!("Failed to start sync scheduler: {e}"))
            })?;

        info!("Sync scheduler running every {interval:?}");
        Ok(SyncScheduler {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for an in-flight pass to finish
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("Sync scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
