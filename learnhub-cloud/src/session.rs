//! Session context: process-wide holder of the authenticated identity.
//!
//! Owner-scoped operations must re-read the session at call time (via
//! [`SessionContext::current`] or [`SessionContext::require`]) rather than
//! keeping an identity around, so a sign-out elsewhere in the process is
//! seen immediately. Subscribers get every auth-state change (sign-in,
//! sign-out, token restore) through a `watch` channel whose value is the
//! latest session.

use crate::error::{RemoteError, RemoteResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

/// An authenticated session with the hosted backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// Shared holder of the current session.
pub struct SessionContext {
    inner: RwLock<Option<Session>>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: RwLock::new(None),
            tx,
        }
    }

    /// Current session, read fresh on every call.
    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Current session, or [`RemoteError::AuthRequired`] for operations
    /// that need one.
    pub async fn require(&self) -> RemoteResult<Session> {
        self.current().await.ok_or(RemoteError::AuthRequired)
    }

    /// Installs a session and notifies subscribers.
    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session.clone());
        let _ = self.tx.send(Some(session));
    }

    /// Clears the session and notifies subscribers.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
        let _ = self.tx.send(None);
    }

    /// Subscribes to auth-state changes. The receiver always holds the
    /// latest identity (or `None` when signed out).
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "at".to_string(),
            user_id: Uuid::nil(),
            email: "ana@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn set_then_clear_is_observable() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.current().await, None);

        ctx.set(session()).await;
        assert!(ctx.require().await.is_ok());

        ctx.clear().await;
        assert!(matches!(
            ctx.require().await.unwrap_err(),
            RemoteError::AuthRequired
        ));
    }

    #[tokio::test]
    async fn subscribers_see_auth_changes() {
        let ctx = SessionContext::new();
        let mut rx = ctx.subscribe();

        ctx.set(session()).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        ctx.clear().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
