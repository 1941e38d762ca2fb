//! Per-session state and the registry of live sessions

use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

use crate::core::config::GatewayConfig;
use crate::core::models::{
    HistoryEntry, Language, LanguagePair, QuotaStatus, SourceLanguage, TranslationRequest,
    TranslationResult,
};
use crate::core::quota::QuotaTracker;

/// Mutable state owned by one session
#[derive(Debug)]
pub struct SessionState {
    pub quota: QuotaTracker,
    /// Current selector values, kept so the presentation layer can restore them
    pub selection: LanguagePair,
    history: Vec<HistoryEntry>,
    max_history: usize,
}

impl SessionState {
    /// Append a successful translation, dropping the oldest past the cap
    pub fn push_history(
        &mut self,
        request: &TranslationRequest,
        result: &TranslationResult,
        at: DateTime<Utc>,
    ) {
        self.history.push(HistoryEntry::new(request, result, at));
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

/// One user session.
///
/// All state sits behind a single async mutex; the gateway holds it from the
/// quota check through `record`, so check-then-record cannot interleave.
#[derive(Debug)]
pub struct Session {
    id: String,
    /// Last access as unix milliseconds
    last_seen: AtomicI64,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session with the default English → Hindi selection
    pub fn new(id: impl Into<String>, config: &GatewayConfig) -> Self {
        Self::new_at(id, config, Utc::now())
    }

    fn new_at(id: impl Into<String>, config: &GatewayConfig, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            last_seen: AtomicI64::new(now.timestamp_millis()),
            state: Mutex::new(SessionState {
                quota: QuotaTracker::new(config.free_limit, config.window_hours),
                selection: LanguagePair::new(Language::English, Language::Hindi),
                history: Vec::new(),
                max_history: config.max_history,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mark the session as used at `now`. Never moves the mark backwards.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_seen.fetch_max(now.timestamp_millis(), Ordering::Relaxed);
    }

    /// True once the session has gone unused for at least `ttl`
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        let last_seen = self.last_seen.load(Ordering::Relaxed);
        now.timestamp_millis() - last_seen >= ttl.num_milliseconds()
    }

    /// Exclusive access to the session state
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Quota snapshot. Waits for a translation in flight on this session,
    /// so the result already counts it.
    pub async fn status(&self, now: DateTime<Utc>) -> QuotaStatus {
        self.lock().await.quota.status(now)
    }

    /// Snapshot of past translations, oldest first. Waits like `status`.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.lock().await.history().to_vec()
    }

    pub async fn select(&self, pair: LanguagePair) {
        self.lock().await.selection = pair;
    }

    /// Swap source and target. No-op while the source is auto-detect.
    pub async fn swap_languages(&self) -> LanguagePair {
        let mut state = self.lock().await;
        if let SourceLanguage::Language(source) = state.selection.source {
            state.selection = LanguagePair::new(state.selection.target, source);
        }
        state.selection
    }
}

/// Live sessions keyed by id. Sessions never share state with each other.
///
/// A session unused for `idle_ttl` is dropped on the next insert or sweep.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    idle_ttl: TimeDelta,
}

impl SessionStore {
    pub fn new(idle_ttl: TimeDelta) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Store whose sessions expire after one quota window without use.
    /// By then every recorded request has expired as well.
    pub fn for_config(config: &GatewayConfig) -> Self {
        Self::new(TimeDelta::hours(i64::from(config.window_hours)))
    }

    /// Return the session for `id`, creating it on first contact
    pub async fn get_or_create(&self, id: &str, config: &GatewayConfig) -> Arc<Session> {
        self.get_or_create_at(id, config, Utc::now()).await
    }

    pub async fn get_or_create_at(
        &self,
        id: &str,
        config: &GatewayConfig,
        now: DateTime<Utc>,
    ) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(id) {
            session.touch(now);
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        Self::sweep(&mut sessions, now, self.idle_ttl);
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                info!("Created session {}", id);
                Arc::new(Session::new_at(id, config, now))
            })
            .clone();
        // Another caller may have inserted it between the two locks
        session.touch(now);
        session
    }

    /// Existing session for `id`; never creates one
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        session.touch(Utc::now());
        Some(session)
    }

    /// End a session, discarding its quota and history
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Ended session {}", id);
        }
        removed
    }

    /// Drop every session idle at `now`, returning how many went
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::sweep(&mut sessions, now, self.idle_ttl)
    }

    fn sweep(
        sessions: &mut HashMap<String, Arc<Session>>,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::EngineKind;

    fn result(text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: text.to_string(),
            engine_used: EngineKind::Primary,
            source_language: "English".to_string(),
            detected_language: None,
        }
    }

    #[tokio::test]
    async fn test_swap_languages() {
        let session = Session::new("s1", &GatewayConfig::default());
        let swapped = session.swap_languages().await;
        assert_eq!(swapped, LanguagePair::new(Language::Hindi, Language::English));
    }

    #[tokio::test]
    async fn test_swap_is_noop_for_auto_detect() {
        let session = Session::new("s1", &GatewayConfig::default());
        session.select(LanguagePair::auto(Language::Tamil)).await;
        assert_eq!(
            session.swap_languages().await,
            LanguagePair::auto(Language::Tamil)
        );
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let config = GatewayConfig {
            max_history: 2,
            ..Default::default()
        };
        let session = Session::new("s1", &config);
        let pair = LanguagePair::new(Language::English, Language::Hindi);

        {
            let mut state = session.lock().await;
            for text in ["one", "two", "three"] {
                let request = TranslationRequest::new(text, pair).unwrap();
                state.push_history(&request, &result(text), Utc::now());
            }
        }

        let history = session.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].original, "two");
        assert_eq!(history[1].original, "three");
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let config = GatewayConfig::default();
        let store = SessionStore::for_config(&config);

        let a = store.get_or_create("a", &config).await;
        let again = store.get_or_create("a", &config).await;
        let b = store.get_or_create("b", &config).await;
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(store.len().await, 2);

        a.lock().await.quota.record(Utc::now());
        assert_eq!(a.status(Utc::now()).await.remaining, 19);
        assert_eq!(b.status(Utc::now()).await.remaining, 20);

        assert!(store.remove("a").await);
        assert!(store.get("a").await.is_none());
        assert!(!store.remove("a").await);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let config = GatewayConfig::default();
        let store = SessionStore::new(TimeDelta::hours(24));
        let start = Utc::now();

        store.get_or_create_at("idle", &config, start).await;
        store.get_or_create_at("busy", &config, start).await;
        store
            .get_or_create_at("busy", &config, start + TimeDelta::hours(20))
            .await;

        assert_eq!(store.evict_idle(start + TimeDelta::hours(23)).await, 0);
        assert_eq!(store.evict_idle(start + TimeDelta::hours(24)).await, 1);
        assert!(store.get("idle").await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_sweeps_idle_sessions() {
        let config = GatewayConfig::default();
        let store = SessionStore::new(TimeDelta::hours(1));
        let start = Utc::now();

        for id in ["a", "b", "c"] {
            store.get_or_create_at(id, &config, start).await;
        }
        store
            .get_or_create_at("d", &config, start + TimeDelta::hours(2))
            .await;

        assert_eq!(store.len().await, 1);
        assert!(store.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_status_waits_for_in_flight_translation() {
        let session = Arc::new(Session::new("s1", &GatewayConfig::default()));
        let now = Utc::now();

        let mut state = session.lock().await;
        let reader = {
            let session = session.clone();
            tokio::spawn(async move { session.status(now).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!reader.is_finished());

        state.quota.record(now);
        drop(state);

        assert_eq!(reader.await.unwrap().remaining, 19);
    }
}
