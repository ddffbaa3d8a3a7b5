/*!
 * Background parse offload.
 *
 * Routes large subtitle payloads to a dedicated background thread so the
 * cooperative driver never stalls on a parse, falling back to the
 * in-process parser for small inputs or when the thread cannot be
 * started. Requests and responses are correlated by unique id through a
 * pending-request table; progress messages are forwarded to the caller
 * without resolving the request.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::app_config::WorkerConfig;
use crate::errors::WorkerError;
use crate::subtitle_parser::{self, CueList, SubtitleFormat};

/// Progress callback invoked with a 0-100 percentage
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync + 'static>;

/// Request sent to the background parse thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Parse a subtitle payload
    Parse {
        /// Raw subtitle text
        text: String,
        /// Optional format override
        format_hint: Option<SubtitleFormat>,
        /// Correlation id
        id: Uuid,
    },
}

/// Response emitted by the background parse thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    /// Intermediate progress; does not resolve the request
    Progress {
        /// Correlation id
        id: Uuid,
        /// Parsed percentage, 0-100
        percent: u8,
    },
    /// Successful completion
    Result {
        /// Correlation id
        id: Uuid,
        /// Parsed cues
        cues: CueList,
    },
    /// Failed completion; rejects only this request
    Error {
        /// Correlation id
        id: Uuid,
        /// Failure description
        message: String,
    },
}

/// A request awaiting its response
struct PendingRequest {
    /// Resolves or rejects the caller's future
    result_tx: oneshot::Sender<Result<CueList, WorkerError>>,
    /// Forwards progress percentages to the caller
    progress: Option<ProgressFn>,
}

type PendingTable = Arc<Mutex<HashMap<Uuid, PendingRequest>>>;

/// Worker offload manager
///
/// Owns the background parse thread and the response dispatcher. If the
/// threads cannot be spawned at construction time, every call degrades
/// to synchronous parsing for the lifetime of the manager.
pub struct WorkerManager {
    /// Offload threshold and timeout settings
    config: WorkerConfig,

    /// Request queue into the parse thread; None when degraded or
    /// terminated (dropping the sender is what releases the thread)
    request_tx: Mutex<Option<mpsc::Sender<WorkerRequest>>>,

    /// Requests awaiting responses, keyed by correlation id
    pending: PendingTable,

    /// Set once `shutdown` has run; nothing resolves afterwards
    terminated: Arc<AtomicBool>,

    /// Background thread handles, joined on shutdown
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerManager {
    /// Create a manager, spawning the parse and dispatch threads
    pub fn new(config: WorkerConfig) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let terminated = Arc::new(AtomicBool::new(false));

        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();

        let mut threads = Vec::new();
        let parse_thread = std::thread::Builder::new()
            .name("shadowsync-parse".to_string())
            .spawn(move || parse_thread_main(request_rx, response_tx));

        let request_tx = match parse_thread {
            Ok(handle) => {
                threads.push(handle);
                Some(request_tx)
            }
            Err(e) => {
                warn!("Worker thread unavailable, degrading to synchronous parsing: {}", e);
                None
            }
        };

        if request_tx.is_some() {
            let dispatch_pending = Arc::clone(&pending);
            let dispatch_terminated = Arc::clone(&terminated);
            let dispatch_thread = std::thread::Builder::new()
                .name("shadowsync-dispatch".to_string())
                .spawn(move || dispatch_thread_main(response_rx, dispatch_pending, dispatch_terminated));
            match dispatch_thread {
                Ok(handle) => threads.push(handle),
                Err(e) => {
                    warn!("Dispatch thread unavailable, degrading to synchronous parsing: {}", e);
                }
            }
        }

        // Both threads or neither; a parse thread without a dispatcher
        // would leak pending requests.
        let degraded = threads.len() < 2;
        Self {
            config,
            request_tx: Mutex::new(if degraded { None } else { request_tx }),
            pending,
            terminated,
            threads: Mutex::new(threads),
        }
    }

    /// Whether requests can be offloaded to the background thread
    pub fn worker_available(&self) -> bool {
        self.request_tx.lock().is_some() && !self.terminated.load(Ordering::SeqCst)
    }

    /// Parse a subtitle payload, offloading to the background thread
    /// when the payload is large enough
    ///
    /// Rejects with `WorkerError::Timeout` after the configured bound.
    /// Any worker runtime failure falls back silently to the synchronous
    /// parser.
    pub async fn parse_async(
        &self,
        text: &str,
        format_hint: Option<SubtitleFormat>,
        on_progress: Option<ProgressFn>,
    ) -> Result<CueList, WorkerError> {
        if text.len() < self.config.offload_threshold_bytes || !self.worker_available() {
            return Ok(subtitle_parser::parse(text, format_hint));
        }

        let id = Uuid::new_v4();
        let (result_tx, result_rx) = oneshot::channel();
        self.pending
            .lock()
            .insert(id, PendingRequest { result_tx, progress: on_progress });

        let request = WorkerRequest::Parse { text: text.to_string(), format_hint, id };
        let sent = match self.request_tx.lock().as_ref() {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        };
        if !sent {
            self.pending.lock().remove(&id);
            warn!("Worker queue closed, parsing synchronously");
            return Ok(subtitle_parser::parse(text, format_hint));
        }
        debug!("Offloaded parse request {} ({} bytes)", id, text.len());

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, result_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                // Responder dropped without resolving; treat as a worker
                // runtime failure
                self.pending.lock().remove(&id);
                if self.terminated.load(Ordering::SeqCst) {
                    return Err(WorkerError::Terminated);
                }
                warn!("Worker response channel dropped, parsing synchronously");
                Ok(subtitle_parser::parse(text, format_hint))
            }
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(WorkerError::Timeout(self.config.timeout_secs))
            }
        }
    }

    /// Terminate the manager
    ///
    /// Rejects all still-pending requests, closes the request queue, and
    /// joins the background threads. No request resolves afterwards.
    pub fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }

        let drained: Vec<PendingRequest> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, entry)| entry).collect()
        };
        for entry in drained {
            let _ = entry.result_tx.send(Err(WorkerError::Terminated));
        }

        // Closing the queue ends the parse thread, which closes the
        // response channel and ends the dispatcher.
        *self.request_tx.lock() = None;
        let handles: Vec<JoinHandle<()>> = self.threads.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background parse loop
fn parse_thread_main(request_rx: mpsc::Receiver<WorkerRequest>, response_tx: mpsc::Sender<WorkerResponse>) {
    while let Ok(request) = request_rx.recv() {
        match request {
            WorkerRequest::Parse { text, format_hint, id } => {
                let progress_tx = response_tx.clone();
                let cues = subtitle_parser::parse_with_progress(&text, format_hint, |percent| {
                    let _ = progress_tx.send(WorkerResponse::Progress { id, percent });
                });
                let _ = response_tx.send(WorkerResponse::Result { id, cues });
            }
        }
    }
    debug!("Worker parse thread exiting");
}

/// Response routing loop
fn dispatch_thread_main(
    response_rx: mpsc::Receiver<WorkerResponse>,
    pending: PendingTable,
    terminated: Arc<AtomicBool>,
) {
    while let Ok(response) = response_rx.recv() {
        if terminated.load(Ordering::SeqCst) {
            // Late responses after shutdown are dropped on the floor
            continue;
        }
        match response {
            WorkerResponse::Progress { id, percent } => {
                let pending = pending.lock();
                if let Some(entry) = pending.get(&id) {
                    if let Some(progress) = &entry.progress {
                        progress(percent);
                    }
                }
            }
            WorkerResponse::Result { id, cues } => {
                if let Some(entry) = pending.lock().remove(&id) {
                    let _ = entry.result_tx.send(Ok(cues));
                }
            }
            WorkerResponse::Error { id, message } => {
                if let Some(entry) = pending.lock().remove(&id) {
                    let _ = entry.result_tx.send(Err(WorkerError::ParseFailed(message)));
                }
            }
        }
    }
    debug!("Worker dispatch thread exiting");
}
