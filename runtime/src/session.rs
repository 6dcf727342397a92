//! Lifecycle of the single automated browser session.
//!
//! The manager is owned by the acquisition queue worker and lent to each
//! pipeline run by `&mut`, so at most one session can exist at a time
//! without any global state.

use crate::acquisition::bounded;
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::renderer::{DeviceProfile, RenderContext, Renderer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default number of launch attempts before a start is reported as failed.
pub const DEFAULT_LAUNCH_ATTEMPTS: u32 = 2;

/// Bound on a single browser launch.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on tearing a session down. A browser that does not close in time is
/// abandoned.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(20);

/// Observable state of the session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Absent,
    Starting,
    Active,
    Closing,
}

/// A live browser session.
pub struct Session {
    /// Sequence number of this session within the process.
    pub id: u64,
    context: Box<dyn RenderContext>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Session {
    /// Get the browser context for this session.
    pub fn context(&self) -> &dyn RenderContext {
        self.context.as_ref()
    }

    /// Get the browser context for navigation.
    pub fn context_mut(&mut self) -> &mut dyn RenderContext {
        self.context.as_mut()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// How long the session has been alive.
    pub fn age(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Owns the one browser session slot.
pub struct BrowserSessionManager {
    renderer: Arc<dyn Renderer>,
    profile: DeviceProfile,
    launch_attempts: u32,
    launch_timeout: Duration,
    close_timeout: Duration,
    state: SessionState,
    current: Option<Session>,
    launches: u64,
}

impl BrowserSessionManager {
    pub fn new(renderer: Arc<dyn Renderer>, profile: DeviceProfile) -> Self {
        Self {
            renderer,
            profile,
            launch_attempts: DEFAULT_LAUNCH_ATTEMPTS,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            state: SessionState::Absent,
            current: None,
            launches: 0,
        }
    }

    /// Override how many times a failed launch is retried (minimum one attempt).
    pub fn with_launch_attempts(mut self, attempts: u32) -> Self {
        self.launch_attempts = attempts.max(1);
        self
    }

    /// Override the launch and close time bounds.
    pub fn with_timeouts(mut self, launch: Duration, close: Duration) -> Self {
        self.launch_timeout = launch;
        self.close_timeout = close;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of sessions successfully started so far.
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Start a fresh session, tearing down any stale one first.
    ///
    /// A failure to close the stale session is logged and the session is
    /// discarded anyway. Launch failures are retried up to the configured
    /// attempt count before surfacing as [`AcquisitionError::Session`].
    pub async fn start(&mut self) -> AcquisitionResult<&mut Session> {
        if self.current.is_some() {
            warn!("stale browser session still held; closing before start");
            self.stop().await;
        }

        self.state = SessionState::Starting;
        let mut last_error = String::new();

        for attempt in 1..=self.launch_attempts {
            let launch = self.renderer.launch(&self.profile);
            match bounded(self.launch_timeout, "browser launch", launch).await {
                Ok(context) => {
                    self.launches += 1;
                    let session = Session {
                        id: self.launches,
                        context,
                        started_at: Utc::now(),
                        started: Instant::now(),
                    };
                    info!(
                        session = session.id,
                        renderer = self.renderer.name(),
                        attempt,
                        "browser session started"
                    );
                    self.state = SessionState::Active;
                    return Ok(self.current.insert(session));
                }
                Err(e) => {
                    warn!(attempt, error = %format!("{e:#}"), "browser launch failed");
                    last_error = format!("{e:#}");
                }
            }
        }

        self.state = SessionState::Absent;
        Err(AcquisitionError::Session(format!(
            "launch failed after {} attempt(s): {last_error}",
            self.launch_attempts
        )))
    }

    /// Get the running session, if any.
    pub fn current_mut(&mut self) -> Option<&mut Session> {
        self.current.as_mut()
    }

    /// Close the current session. Idempotent; close failures are logged only.
    pub async fn stop(&mut self) {
        let Some(session) = self.current.take() else {
            self.state = SessionState::Absent;
            return;
        };

        self.state = SessionState::Closing;
        let id = session.id;
        let age = session.age();
        match bounded(self.close_timeout, "session close", session.context.close()).await {
            Ok(()) => debug!(session = id, age_ms = age.as_millis() as u64, "browser session closed"),
            Err(e) => warn!(session = id, error = %format!("{e:#}"), "browser session did not close cleanly; discarded"),
        }
        self.state = SessionState::Absent;
    }
}
