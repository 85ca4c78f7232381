//! Session registry and progress channel.
//!
//! One [`JobRegistry`] instance is injected into the service; sessions are
//! keyed by generated UUIDs and live only in memory. Each session carries a
//! single-writer, last-value-cached event channel so any number of
//! subscribers (live or late) can observe the job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use uuid::Uuid;

const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SUBSCRIBER_BUFFER: usize = 16;

/// Event published to a session's progress channel. The tagged serialization
/// is the wire shape handed to whatever transport (SSE, WebSocket, polling)
/// the presentation layer plugs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress { progress: u8 },
    Completed { progress: u8 },
    Error { error: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Error { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// Snapshot of one session, as returned to pollers.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Session {
    state: JobState,
    events: watch::Sender<ProgressEvent>,
    created_at: Instant,
    /// Set once a subscriber consumed a terminal event. Later subscribers
    /// take the replay fast path instead of attaching a live watcher.
    closed: bool,
    cancelled: bool,
}

/// In-memory registry of ingestion sessions with TTL eviction.
///
/// Sessions are never durable: a process restart forgets in-flight jobs,
/// which is acceptable because persisted match records are idempotent and the
/// client can simply re-issue the job.
pub struct JobRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    subscribe_timeout: Duration,
}

impl JobRegistry {
    pub fn new(ttl: Duration, subscribe_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            subscribe_timeout,
        }
    }

    /// Register a new session and return its id. Terminal sessions past
    /// their TTL are evicted here; running ones are left alone.
    pub fn create(&self) -> String {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        let now = Instant::now();
        sessions.retain(|_, session| {
            !(session.state.status.is_terminal()
                && now.duration_since(session.created_at) >= self.ttl)
        });

        let session_id = Uuid::new_v4().to_string();
        let (events, _) = watch::channel(ProgressEvent::Progress { progress: 0 });
        sessions.insert(
            session_id.clone(),
            Session {
                state: JobState {
                    status: JobStatus::Starting,
                    progress: 0,
                    error: None,
                },
                events,
                created_at: now,
                closed: false,
                cancelled: false,
            },
        );
        session_id
    }

    pub fn set_running(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        if let Some(session) = sessions.get_mut(session_id) {
            if session.state.status == JobStatus::Starting {
                session.state.status = JobStatus::Running;
            }
        }
    }

    /// Publish one event to the session. Fire-and-forget: missing sessions
    /// and absent subscribers are both tolerated.
    pub fn publish(&self, session_id: &str, event: ProgressEvent) {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        let Some(session) = sessions.get_mut(session_id) else {
            warn!(%session_id, "publish to unknown session dropped");
            return;
        };

        match &event {
            ProgressEvent::Progress { progress } => {
                session.state.progress = *progress;
                if session.state.status == JobStatus::Starting {
                    session.state.status = JobStatus::Running;
                }
            }
            ProgressEvent::Completed { progress } => {
                session.state.status = JobStatus::Completed;
                session.state.progress = *progress;
            }
            ProgressEvent::Error { error } => {
                session.state.status = JobStatus::Error;
                session.state.error = Some(error.clone());
            }
        }

        session.events.send_replace(event);
    }

    pub fn state(&self, session_id: &str) -> Option<JobState> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        sessions.get(session_id).map(|s| s.state.clone())
    }

    /// Ask a job to stop. Returns false for unknown or already-terminal
    /// sessions. The job notices at its next per-match boundary.
    pub fn cancel(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        match sessions.get_mut(session_id) {
            Some(session) if !session.state.status.is_terminal() => {
                session.cancelled = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_cancelled(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        sessions.get(session_id).is_some_and(|s| s.cancelled)
    }

    fn mark_closed(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session registry poisoned");
        if let Some(session) = sessions.get_mut(session_id) {
            session.closed = true;
        }
    }

    /// Terminal event to replay for a session already observed to completion.
    fn closed_terminal(&self, session_id: &str) -> Option<ProgressEvent> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        let session = sessions.get(session_id)?;
        if !(session.closed && session.state.status.is_terminal()) {
            return None;
        }
        Some(match session.state.status {
            JobStatus::Completed => ProgressEvent::Completed {
                progress: session.state.progress,
            },
            _ => ProgressEvent::Error {
                error: session
                    .state
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            },
        })
    }

    fn watch(&self, session_id: &str) -> Option<watch::Receiver<ProgressEvent>> {
        let sessions = self.sessions.lock().expect("session registry poisoned");
        sessions.get(session_id).map(|s| s.events.subscribe())
    }

    /// Subscribe to a session's events.
    ///
    /// The returned stream is finite: it ends after a terminal event, after
    /// the session disappears, or — when the session never shows up within
    /// the bounded wait — after a single `error` event. A subscriber may
    /// attach before the job exists, while it runs, or after it finished;
    /// late subscribers receive the terminal event exactly once.
    pub async fn subscribe(self: Arc<Self>, session_id: &str) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);

        // Bounded wait for the session to appear.
        let deadline = Instant::now() + self.subscribe_timeout;
        let watch_rx = loop {
            if let Some(found) = self.watch(session_id) {
                break Some(found);
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(SESSION_POLL_INTERVAL).await;
        };

        let Some(mut watch_rx) = watch_rx else {
            let _ = tx
                .send(ProgressEvent::Error {
                    error: "session not found".to_string(),
                })
                .await;
            return rx;
        };

        // Already-closed terminal sessions replay without a live watcher.
        if let Some(terminal) = self.closed_terminal(session_id) {
            debug!(%session_id, "replaying terminal event to late subscriber");
            let _ = tx.send(terminal).await;
            return rx;
        }

        let registry = self;
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            loop {
                let event = watch_rx.borrow_and_update().clone();
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() {
                    return; // subscriber went away
                }
                if terminal {
                    registry.mark_closed(&session_id);
                    return;
                }
                if watch_rx.changed().await.is_err() {
                    return; // session evicted
                }
            }
        });

        rx
    }
}
