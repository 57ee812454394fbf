//! Session registry - the in-memory home of live sessions.
//!
//! One session exists per (buyer, listing) key. The registry owns the
//! canonical map from key to session cell, creates sessions on first
//! contact after resolving the listing through the catalog, and evicts
//! them on idle timeout or explicit close. Everything downstream shares
//! `Arc<SessionCell>` handles; an evicted session disappears from the
//! map, but holders of the old handle find it closed and their pending
//! results are discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::foundation::SessionKey;
use crate::domain::foundation::Timestamp;
use crate::domain::session::Session;
use crate::ports::{CatalogError, ListingCatalog, SessionEvent, SessionEventPublisher};

/// A live session together with its coordination locks.
///
/// The session mutex guards all session state and is held only for short
/// mutations, never across an external call. The dispatch gate serializes
/// autopilot dispatches so at most one inference call runs per session; the
/// capture gate does the same for lead capture.
///
/// # Lock order
///
/// A gate is always acquired before the session mutex, never while holding
/// it.
#[derive(Debug)]
pub struct SessionCell {
    session: Mutex<Session>,
    dispatch_gate: Mutex<()>,
    capture_gate: Mutex<()>,
}

impl SessionCell {
    /// Wraps a session in its coordination locks.
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            dispatch_gate: Mutex::new(()),
            capture_gate: Mutex::new(()),
        }
    }

    /// The session state.
    pub fn session(&self) -> &Mutex<Session> {
        &self.session
    }

    /// Serializes autopilot dispatches for this session.
    pub fn dispatch_gate(&self) -> &Mutex<()> {
        &self.dispatch_gate
    }

    /// Serializes lead captures for this session.
    pub fn capture_gate(&self) -> &Mutex<()> {
        &self.capture_gate
    }
}

/// Handle returned by [`SessionRegistry::get_or_create`].
#[derive(Debug, Clone)]
pub struct Acquired {
    /// The live session cell.
    pub cell: Arc<SessionCell>,
    /// True when this call created the session.
    pub created: bool,
}

/// Registry of live sessions keyed by (buyer, listing).
///
/// Uses `RwLock` over the map since lookups vastly outnumber creations
/// and evictions.
pub struct SessionRegistry {
    cells: RwLock<HashMap<SessionKey, Arc<SessionCell>>>,
    catalog: Arc<dyn ListingCatalog>,
    events: Arc<dyn SessionEventPublisher>,
}

impl SessionRegistry {
    pub fn new(
        catalog: Arc<dyn ListingCatalog>,
        events: Arc<dyn SessionEventPublisher>,
    ) -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
            catalog,
            events,
        }
    }

    /// Returns the session for a key, creating it on first contact.
    ///
    /// Creation resolves the listing through the catalog first; a failed
    /// lookup leaves no session behind. Two concurrent callers for the same
    /// key both get the same cell, and exactly one of them sees
    /// `created == true`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError`] if the listing cannot be resolved
    pub async fn get_or_create(&self, key: &SessionKey) -> Result<Acquired, CatalogError> {
        if let Some(cell) = self.cells.read().await.get(key) {
            return Ok(Acquired {
                cell: cell.clone(),
                created: false,
            });
        }

        // Resolve outside the write lock; the fetch may be slow.
        let listing = self.catalog.fetch(key.listing()).await?;

        let mut cells = self.cells.write().await;
        // Another caller may have created the session during the fetch.
        if let Some(cell) = cells.get(key) {
            return Ok(Acquired {
                cell: cell.clone(),
                created: false,
            });
        }

        let cell = Arc::new(SessionCell::new(Session::new(key.clone(), listing)));
        cells.insert(key.clone(), cell.clone());
        tracing::info!(session = %key, "session created");
        Ok(Acquired {
            cell,
            created: true,
        })
    }

    /// Returns the session for a key, if it is live.
    pub async fn get(&self, key: &SessionKey) -> Option<Arc<SessionCell>> {
        self.cells.read().await.get(key).cloned()
    }

    /// Returns every live session cell.
    pub async fn all(&self) -> Vec<Arc<SessionCell>> {
        self.cells.read().await.values().cloned().collect()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.cells.read().await.len()
    }

    /// True when no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.cells.read().await.is_empty()
    }

    /// Removes a session from the registry and closes it.
    ///
    /// Removal happens before the close so a message racing in on the same
    /// key recreates a fresh session instead of hitting a closed one.
    /// Returns `None` when the key is not live.
    pub async fn evict(&self, key: &SessionKey) -> Option<Arc<SessionCell>> {
        let cell = self.cells.write().await.remove(key)?;
        cell.session().lock().await.close();
        self.events.publish(SessionEvent::SessionClosed {
            session: key.clone(),
        });
        tracing::info!(session = %key, "session evicted");
        Some(cell)
    }

    /// Evicts every session that has seen no activity for `idle_secs`.
    ///
    /// Returns the keys that were evicted. The idleness check and the map
    /// removal happen under the session lock, so activity arriving during
    /// the sweep either lands before the check or recreates the session.
    pub async fn evict_idle(&self, now: &Timestamp, idle_secs: u64) -> Vec<SessionKey> {
        let cells: Vec<(SessionKey, Arc<SessionCell>)> = {
            let map = self.cells.read().await;
            map.iter().map(|(k, c)| (k.clone(), c.clone())).collect()
        };

        let mut evicted = Vec::new();
        for (key, cell) in cells {
            let mut session = cell.session().lock().await;
            if !session.is_idle(now, idle_secs) {
                continue;
            }

            let removed = {
                let mut map = self.cells.write().await;
                match map.get(&key) {
                    // An explicit evict plus recreate may have swapped the
                    // entry; only remove the cell we inspected.
                    Some(current) if Arc::ptr_eq(current, &cell) => {
                        map.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if removed {
                session.close();
                drop(session);
                self.events.publish(SessionEvent::SessionClosed {
                    session: key.clone(),
                });
                evicted.push(key);
            }
        }

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "idle sessions evicted");
        }
        evicted
    }

    /// Spawns the background task that sweeps idle sessions.
    pub fn spawn_idle_sweeper(
        self: &Arc<Self>,
        idle_secs: u64,
        sweep_interval_secs: u64,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let period = Duration::from_secs(sweep_interval_secs.max(1));
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.evict_idle(&Timestamp::now(), idle_secs).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::foundation::{BuyerId, ListingId};
    use crate::domain::listing::ListingRef;
    use crate::domain::session::SessionMode;

    struct StaticCatalog;

    #[async_trait]
    impl ListingCatalog for StaticCatalog {
        async fn fetch(&self, id: &ListingId) -> Result<ListingRef, CatalogError> {
            Ok(ListingRef::new(
                id.clone(),
                "Seaview Apartment",
                "Lisbon",
                420_000.0,
                "Two bedrooms overlooking the bay",
            )
            .unwrap())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl ListingCatalog for FailingCatalog {
        async fn fetch(&self, _id: &ListingId) -> Result<ListingRef, CatalogError> {
            Err(CatalogError::Unavailable("catalog offline".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: std::sync::Mutex<Vec<SessionEvent>>,
    }

    impl RecordingPublisher {
        fn events(&self) -> Vec<SessionEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SessionEventPublisher for RecordingPublisher {
        fn publish(&self, event: SessionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn test_key(buyer: &str) -> SessionKey {
        SessionKey::new(
            BuyerId::new(buyer).unwrap(),
            ListingId::new("listing-9").unwrap(),
        )
    }

    fn registry() -> (Arc<SessionRegistry>, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(StaticCatalog),
            publisher.clone(),
        ));
        (registry, publisher)
    }

    #[tokio::test]
    async fn creates_session_on_first_contact() {
        let (registry, _) = registry();
        let key = test_key("buyer-1");

        let acquired = registry.get_or_create(&key).await.unwrap();

        assert!(acquired.created);
        let session = acquired.cell.session().lock().await;
        assert_eq!(session.mode(), SessionMode::Initializing);
        assert_eq!(session.key(), &key);
        assert_eq!(session.listing().title(), "Seaview Apartment");
    }

    #[tokio::test]
    async fn second_acquire_returns_the_same_cell() {
        let (registry, _) = registry();
        let key = test_key("buyer-1");

        let first = registry.get_or_create(&key).await.unwrap();
        let second = registry.get_or_create(&key).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert!(Arc::ptr_eq(&first.cell, &second.cell));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn catalog_failure_leaves_no_session_behind() {
        let publisher = Arc::new(RecordingPublisher::default());
        let registry = SessionRegistry::new(Arc::new(FailingCatalog), publisher);
        let key = test_key("buyer-1");

        let result = registry.get_or_create(&key).await;

        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn evict_closes_and_removes_the_session() {
        let (registry, publisher) = registry();
        let key = test_key("buyer-1");
        let acquired = registry.get_or_create(&key).await.unwrap();

        let evicted = registry.evict(&key).await.unwrap();

        assert!(Arc::ptr_eq(&acquired.cell, &evicted));
        assert_eq!(evicted.session().lock().await.mode(), SessionMode::Closed);
        assert!(registry.get(&key).await.is_none());
        assert!(matches!(
            publisher.events().last(),
            Some(SessionEvent::SessionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn evicting_an_unknown_key_is_a_no_op() {
        let (registry, publisher) = registry();

        assert!(registry.evict(&test_key("ghost")).await.is_none());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn recreating_after_evict_yields_a_fresh_session() {
        let (registry, _) = registry();
        let key = test_key("buyer-1");

        let first = registry.get_or_create(&key).await.unwrap();
        first
            .cell
            .session()
            .lock()
            .await
            .submit_buyer_message("is this still available?")
            .unwrap();
        registry.evict(&key).await.unwrap();

        let second = registry.get_or_create(&key).await.unwrap();

        assert!(second.created);
        assert!(!Arc::ptr_eq(&first.cell, &second.cell));
        let session = second.cell.session().lock().await;
        assert_eq!(session.mode(), SessionMode::Initializing);
        assert!(session.log().is_empty());
    }

    #[tokio::test]
    async fn evict_idle_skips_recently_active_sessions() {
        let (registry, publisher) = registry();
        let key = test_key("buyer-1");
        registry.get_or_create(&key).await.unwrap();

        let soon = Timestamp::now().plus_secs(10);
        let evicted = registry.evict_idle(&soon, 3600).await;

        assert!(evicted.is_empty());
        assert_eq!(registry.len().await, 1);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn evict_idle_collects_sessions_past_the_timeout() {
        let (registry, publisher) = registry();
        let key_a = test_key("buyer-1");
        let key_b = test_key("buyer-2");
        registry.get_or_create(&key_a).await.unwrap();
        registry.get_or_create(&key_b).await.unwrap();

        let later = Timestamp::now().plus_secs(7200);
        let mut evicted = registry.evict_idle(&later, 3600).await;
        evicted.sort_by_key(|k| k.to_string());

        assert_eq!(evicted, vec![key_a, key_b]);
        assert!(registry.is_empty().await);
        assert_eq!(publisher.events().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_idle_sessions_in_the_background() {
        let (registry, _) = registry();
        let key = test_key("buyer-1");
        registry.get_or_create(&key).await.unwrap();

        // Zero idle threshold so the first sweep collects the session.
        let sweeper = registry.spawn_idle_sweeper(0, 30);
        tokio::time::sleep(Duration::from_secs(35)).await;
        tokio::task::yield_now().await;

        assert!(registry.get(&key).await.is_none());
        sweeper.abort();
    }
}
