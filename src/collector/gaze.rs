//! Background reader for the GazeFlow feed.
//!
//! `start()` performs the handshake on the caller's thread so rejections
//! surface immediately, then hands the connected client to a reader thread
//! that forwards every polling outcome over a bounded channel. `stop()`
//! shuts the stream down, which wakes a blocked read, and joins the thread.

use crate::collector::types::FeedEvent;
use crate::error::{Error, ProtocolError, Result, StateError};
use crate::protocol::{
    ClientConfig, GazeSessionClient, ShutdownHandle, DEFAULT_APP_KEY, DEFAULT_PORT,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 1024;

/// Where to connect and how fast to poll.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub host: String,
    pub port: u16,
    pub app_key: String,
    /// Pause between reads; zero reads back-to-back
    pub poll_interval: Duration,
    pub client: ClientConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            app_key: DEFAULT_APP_KEY.to_string(),
            poll_interval: Duration::from_millis(15),
            client: ClientConfig::default(),
        }
    }
}

pub struct GazeCollector {
    config: CollectorConfig,
    sender: Sender<FeedEvent>,
    receiver: Receiver<FeedEvent>,
    running: Arc<AtomicBool>,
    shutdown: Option<ShutdownHandle>,
    worker: Option<JoinHandle<()>>,
}

impl GazeCollector {
    pub fn new(config: CollectorConfig) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: None,
            worker: None,
        }
    }

    /// Connect and start the reader thread.
    pub fn start(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            if self.is_running() {
                self.worker = Some(worker);
                return Err(StateError::AlreadyConnected.into());
            }
            // Reap a reader that ended on its own.
            let _ = worker.join();
        }
        while self.receiver.try_recv().is_ok() {}

        let mut client = GazeSessionClient::new(self.config.client.clone());
        client.connect(&self.config.host, self.config.port, &self.config.app_key)?;
        self.shutdown = Some(client.shutdown_handle());
        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = Arc::clone(&self.running);
        let poll_interval = self.config.poll_interval;

        let spawned = thread::Builder::new()
            .name("gaze-reader".to_string())
            .spawn(move || read_loop(client, sender, running, poll_interval));
        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.shutdown = None;
                Err(ProtocolError::Io(e).into())
            }
        }
    }

    /// Stop reading and release the connection. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.shutdown.take() {
            handle.shutdown();
        }
        if let Some(worker) = self.worker.take() {
            // Unblock a reader stuck on a full channel.
            while self.receiver.try_recv().is_ok() {}
            if worker.join().is_err() {
                warn!("Gaze reader thread panicked");
            }
        }
    }

    /// Whether the reader thread is still delivering events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Channel the reader thread delivers events on.
    pub fn receiver(&self) -> &Receiver<FeedEvent> {
        &self.receiver
    }

    /// Next pending event, without blocking.
    pub fn try_recv(&self) -> Option<FeedEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for GazeCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(
    mut client: GazeSessionClient,
    sender: Sender<FeedEvent>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    info!("Gaze reader started");

    while running.load(Ordering::SeqCst) {
        let event = match client.receive_sample() {
            Ok(sample) => FeedEvent::sample(sample),
            Err(Error::Sample(e)) => {
                warn!("{e}");
                FeedEvent::malformed(e.to_string())
            }
            Err(e) => {
                // A stop request also surfaces here as a lost connection.
                if running.load(Ordering::SeqCst) {
                    warn!("Gaze feed ended: {e}");
                    let _ = sender.send(FeedEvent::ConnectionLost);
                } else {
                    debug!("Gaze reader stopped");
                }
                break;
            }
        };

        if sender.send(event).is_err() {
            break;
        }

        if !poll_interval.is_zero() {
            thread::sleep(poll_interval);
        }
    }

    client.disconnect();
    running.store(false, Ordering::SeqCst);
    info!("Gaze reader exited");
}
