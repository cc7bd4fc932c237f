//! Session cache.
//!
//! Single source of truth for "is there a signed-in user, and are they
//! paid". Every screen shares one `Arc<SessionCache>` and calls
//! [`SessionCache::ensure_fresh`] before talking to the backend; the identity
//! provider is only consulted when the cached session is older than the
//! cooldown window.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::billing::SubscriptionProvider;
use super::identity::{IdentityProvider, IdentitySession};
use super::store::{PersistedSession, SessionStore};
use crate::api::error::ApiError;
use crate::api::AuthContext;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Point-in-time copy of the cached session.
///
/// After any revalidation `session_token`, `user_id` and `email` are either
/// all present or all absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub customer_id: Option<String>,
    pub is_paid_user: bool,
    /// `None` until the first revalidation
    pub last_refresh: Option<DateTime<Utc>>,
    /// A revalidation is in flight
    pub is_loading: bool,
}

impl SessionSnapshot {
    pub fn is_signed_in(&self) -> bool {
        self.session_token.is_some() && self.user_id.is_some()
    }

    /// Identity to attach to backend calls
    pub fn auth(&self) -> AuthContext {
        AuthContext {
            token: self.session_token.clone(),
            user_id: self.user_id.clone(),
        }
    }

    fn signed_out(at: DateTime<Utc>) -> Self {
        Self {
            last_refresh: Some(at),
            ..Self::default()
        }
    }
}

pub struct SessionCache {
    state: RwLock<SessionSnapshot>,
    /// Held for the whole of a revalidation so only one runs at a time
    refresh_lock: tokio::sync::Mutex<()>,
    /// Bumped after every completed revalidation or sign-out
    generation: AtomicU64,
    identity: Arc<dyn IdentityProvider>,
    billing: Arc<dyn SubscriptionProvider>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl SessionCache {
    /// Build the cache, restoring whatever the store holds
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        billing: Arc<dyn SubscriptionProvider>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
    ) -> Self {
        let restored = match store.load() {
            Ok(Some(persisted)) => persisted.into_snapshot(),
            Ok(None) => SessionSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable session store");
                SessionSnapshot::default()
            }
        };

        Self {
            state: RwLock::new(restored),
            refresh_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            identity,
            billing,
            store,
            clock,
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    /// Identity of the cached session, without revalidating
    pub fn auth(&self) -> AuthContext {
        self.read().auth()
    }

    /// Return the cached session, revalidating first if it is stale.
    ///
    /// Never fails: provider errors are logged and leave the cache signed out.
    pub async fn ensure_fresh(&self) -> SessionSnapshot {
        let seen = self.generation.load(Ordering::SeqCst);
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != seen {
            debug!("session refreshed by a concurrent caller");
            return self.snapshot();
        }
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        self.refresh_locked().await
    }

    /// Revalidate now, ignoring the cooldown
    pub async fn revalidate(&self) -> SessionSnapshot {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Replace the token field only, as after an explicit sign-in
    pub fn set_session(&self, token: Option<String>) {
        let snapshot = {
            let mut state = self.write();
            state.session_token = token;
            state.clone()
        };
        self.persist(&snapshot);
    }

    /// Sign in with email and password, then revalidate the new session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionSnapshot, ApiError> {
        let session = self.identity.sign_in(email, password).await?;
        let token = session
            .access_token
            .ok_or_else(|| ApiError::parse("identity", "sign-in returned no access token"))?;

        self.set_session(Some(token));
        let snapshot = self.revalidate().await;
        if snapshot.is_signed_in() {
            info!(email = snapshot.email.as_deref().unwrap_or_default(), "signed in");
            Ok(snapshot)
        } else {
            Err(ApiError::NotSignedIn)
        }
    }

    /// Revoke the session with the provider (best effort) and clear every field
    pub async fn sign_out(&self) -> SessionSnapshot {
        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = self.snapshot().session_token {
            if let Err(e) = self.identity.sign_out(&token).await {
                warn!(error = %e, "identity provider sign-out failed");
            }
        }
        self.commit(SessionSnapshot::default())
    }

    fn fresh_snapshot(&self) -> Option<SessionSnapshot> {
        let state = self.read();
        let last_refresh = state.last_refresh?;
        if state.session_token.is_some() && self.clock.now() - last_refresh < self.cooldown {
            Some(state.clone())
        } else {
            None
        }
    }

    /// Caller must hold `refresh_lock`
    async fn refresh_locked(&self) -> SessionSnapshot {
        let previous = {
            let mut state = self.write();
            state.is_loading = true;
            state.clone()
        };
        // Cleared again if this future is dropped before committing
        let _loading = LoadingGuard { cache: self };
        let now = self.clock.now();

        let next = match self
            .identity
            .current_session(previous.session_token.as_deref())
            .await
        {
            Ok(Some(session)) if session.is_complete() => {
                self.signed_in(&previous, session, now).await
            }
            Ok(Some(_)) => {
                info!("identity provider returned an incomplete session; clearing");
                SessionSnapshot::signed_out(now)
            }
            Ok(None) => {
                debug!("no active session");
                SessionSnapshot::signed_out(now)
            }
            Err(e) => {
                warn!(error = %e, "session revalidation failed; treating as signed out");
                SessionSnapshot::signed_out(now)
            }
        };

        self.commit(next)
    }

    async fn signed_in(
        &self,
        previous: &SessionSnapshot,
        session: IdentitySession,
        now: DateTime<Utc>,
    ) -> SessionSnapshot {
        let mut next = SessionSnapshot {
            session_token: session.access_token,
            user_id: session.user_id,
            email: session.email,
            customer_id: previous.customer_id.clone(),
            is_paid_user: previous.is_paid_user,
            last_refresh: Some(now),
            is_loading: false,
        };

        let first_fetch = previous.user_id != next.user_id;
        let cooled_down = previous
            .last_refresh
            .map_or(true, |at| now - at >= self.cooldown);
        if !(first_fetch || cooled_down) {
            return next;
        }

        match self.billing.subscription(&next.auth()).await {
            Ok(subscription) => {
                next.is_paid_user = subscription.is_active();
                next.customer_id = subscription.customer_id;
            }
            Err(e) => {
                warn!(error = %e, "subscription lookup failed; treating as unpaid");
                next.is_paid_user = false;
            }
        }
        next
    }

    fn commit(&self, mut next: SessionSnapshot) -> SessionSnapshot {
        next.is_loading = false;
        *self.write() = next.clone();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.persist(&next);
        next
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        if let Err(e) = self.store.save(&PersistedSession::from_snapshot(snapshot)) {
            warn!(error = %e, "failed to persist session");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets `is_loading` when a revalidation ends, committed or cancelled
struct LoadingGuard<'a> {
    cache: &'a SessionCache,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.cache.write().is_loading = false;
    }
}
