// src/services/session_store.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    task::{AbortHandle, JoinHandle},
    time::{Instant, interval, interval_at},
};
use uuid::Uuid;

use crate::{
    config::{PRUNE_INTERVAL_SECS, TICK_INTERVAL_SECS},
    error::AppError,
    models::exam_session::{ExamSession, TickOutcome},
};

/// Handle on a session's tick task. Dropping it aborts the task.
#[derive(Debug)]
pub struct Ticker {
    handle: AbortHandle,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct SessionEntry {
    session: ExamSession,
    ticker: Option<Ticker>,
}

impl SessionEntry {
    /// The ticker only lives while the session is active.
    fn release_ticker_if_inactive(&mut self) {
        if !self.session.is_active() && self.ticker.take().is_some() {
            tracing::debug!("Session {}: tick task released", self.session.id());
        }
    }
}

type Sessions = HashMap<Uuid, SessionEntry>;

/// Process-local registry of exam sessions.
///
/// Cloning is cheap and every clone sees the same sessions. The lock is
/// only taken inside synchronous methods, never across an await.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Sessions>>,
    tick_period: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_tick_period(Duration::from_secs(TICK_INTERVAL_SECS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick_period(tick_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            tick_period,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>, AppError> {
        self.inner.lock().map_err(|e| {
            AppError::InternalServerError(format!("Failed to lock session store: {}", e))
        })
    }

    /// Stores a session and, if it is active, starts its tick task.
    ///
    /// An owner runs at most one active session per test: an earlier active
    /// session of the same owner on the same test is dropped together with
    /// its ticker. Submitted sessions stay readable.
    ///
    /// Must be called from within a tokio runtime.
    pub fn insert(&self, session: ExamSession) -> Result<Uuid, AppError> {
        let id = session.id();
        let mut sessions = self.lock()?;

        sessions.retain(|other_id, entry| {
            let superseded = entry.session.is_active()
                && entry.session.owner() == session.owner()
                && entry.session.test().id == session.test().id;
            if superseded {
                tracing::info!("Session {} superseded by {}", other_id, id);
            }
            !superseded
        });

        let ticker = session.is_active().then(|| self.spawn_ticker(id));
        sessions.insert(id, SessionEntry { session, ticker });
        Ok(id)
    }

    /// Runs `f` against the session `id` owned by `owner`.
    ///
    /// Sessions of other owners are reported as missing. If `f` moves the
    /// session out of the active phase, its tick task is released.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        owner: &str,
        f: impl FnOnce(&mut ExamSession) -> R,
    ) -> Result<R, AppError> {
        let mut sessions = self.lock()?;
        let entry = sessions
            .get_mut(&id)
            .filter(|e| e.session.owner() == owner)
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", id)))?;

        let out = f(&mut entry.session);
        entry.release_ticker_if_inactive();
        Ok(out)
    }

    /// Advances the clock of one session. Unknown sessions are ignored.
    pub fn tick(&self, id: Uuid) -> Result<TickOutcome, AppError> {
        let mut sessions = self.lock()?;
        let Some(entry) = sessions.get_mut(&id) else {
            return Ok(TickOutcome::Ignored);
        };

        let outcome = entry.session.tick(Utc::now());
        entry.release_ticker_if_inactive();
        Ok(outcome)
    }

    /// Drops a session, releasing its tick task.
    pub fn remove(&self, id: Uuid, owner: &str) -> Result<(), AppError> {
        let mut sessions = self.lock()?;
        match sessions.get(&id) {
            Some(entry) if entry.session.owner() == owner => {}
            _ => return Err(AppError::NotFound(format!("Session '{}' not found", id))),
        }

        sessions.remove(&id);
        tracing::info!("Session {} abandoned", id);
        Ok(())
    }

    /// Removes sessions submitted more than `retention` before `now`.
    /// Returns how many were removed.
    pub fn prune(&self, now: DateTime<Utc>, retention: chrono::Duration) -> Result<usize, AppError> {
        let mut sessions = self.lock()?;
        let before = sessions.len();

        sessions.retain(|_, entry| match entry.session.result() {
            Some(result) => now - result.submitted_at < retention,
            None => true,
        });

        Ok(before - sessions.len())
    }

    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_empty())
    }

    /// Number of sessions that currently own a tick task.
    pub fn active_tickers(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.values().filter(|e| e.ticker.is_some()).count())
    }

    fn spawn_ticker(&self, id: Uuid) -> Ticker {
        let store: Weak<Mutex<Sessions>> = Arc::downgrade(&self.inner);
        let period = self.tick_period;

        let handle = tokio::spawn(async move {
            // The first tick fires one period after the session starts.
            let mut interval = interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;

                let Some(inner) = store.upgrade() else {
                    break;
                };
                let sessions = SessionStore {
                    inner,
                    tick_period: period,
                };

                match sessions.tick(id) {
                    Ok(TickOutcome::Running(_)) => {}
                    Ok(_) => break,
                    Err(e) => {
                        tracing::error!("Session {}: tick failed: {}", id, e);
                        break;
                    }
                }
            }
        });

        Ticker {
            handle: handle.abort_handle(),
        }
    }

    /// Background task that periodically prunes old submitted sessions.
    pub fn spawn_sweeper(&self, retention: Duration) -> JoinHandle<()> {
        let sessions = self.clone();

        tokio::spawn(async move {
            tracing::info!(
                "Starting session sweeper (retention {}s)",
                retention.as_secs()
            );
            let retention = chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::MAX);
            let mut interval = interval(Duration::from_secs(PRUNE_INTERVAL_SECS));

            loop {
                interval.tick().await;
                match sessions.prune(Utc::now(), retention) {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!("Pruned {} submitted sessions", removed),
                    Err(e) => tracing::error!("Session sweep failed: {}", e),
                }
            }
        })
    }
}
