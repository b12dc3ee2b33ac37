//! Session control: cancellation tokens and a registry of live sessions.
//!
//! Each poll session owns a [`CancelToken`]. Cancelling only stops the local
//! observer; the remote job keeps running. A [`SessionRegistry`] lets one
//! signal (e.g. Ctrl-C in the CLI) abandon every live session at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation flag that can also wake a sleeping poll loop.
///
/// Clones share the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call repeatedly or after the session ended.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `delay` unless cancelled first. Returns `false` on cancellation.
    pub async fn sleep(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => false,
            _ = tokio::time::sleep(delay) => !self.is_cancelled(),
        }
    }
}

/// Identifier handed out by [`SessionRegistry::register`].
pub type SessionKey = u64;

/// Shared registry of live sessions -> cancel tokens.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next: AtomicU64,
    sessions: RwLock<HashMap<SessionKey, CancelToken>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session's token; returns the key to unregister it with.
    pub fn register(&self, token: CancelToken) -> SessionKey {
        let key = self.next.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, token);
        key
    }

    /// Stop tracking a session (call when it reaches a terminal state).
    pub fn unregister(&self, key: SessionKey) {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
    }

    /// Cancel one session. Unknown keys are ignored.
    pub fn cancel(&self, key: SessionKey) {
        if let Some(token) = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            token.cancel();
        }
    }

    /// Cancel every tracked session; returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        for token in sessions.values() {
            token.cancel();
        }
        sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
