//! Sign-in state: identity provider, subscription lookup and the shared
//! session cache built on top of them.

use std::sync::Arc;

pub mod billing;
pub mod identity;
pub mod session;
pub mod store;

pub use billing::{StaticBilling, Subscription, SubscriptionProvider};
pub use identity::{IdentityProvider, IdentitySession, SupabaseIdentity};
pub use session::{Clock, ManualClock, SessionCache, SessionSnapshot, SystemClock};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

use crate::api::BackendClient;
use crate::config::Config;

/// Wire the session cache from configuration, persisting under the state dir
pub fn session_cache_from_config(config: &Config, client: Arc<BackendClient>) -> Arc<SessionCache> {
    let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseIdentity::from_config(&config.identity));
    let billing = billing::from_config(&config.billing, client);
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.state_path()));

    Arc::new(SessionCache::new(
        identity,
        billing,
        store,
        Arc::new(SystemClock),
        config.session.cooldown(),
    ))
}
