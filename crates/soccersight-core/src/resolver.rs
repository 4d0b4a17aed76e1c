//! Team context resolution.
//!
//! Every view that needs "my team" goes through `TeamContextResolver`. Reads
//! prefer the session cache, fall back to the backend's get/set team
//! endpoints, and finally to the plain team list with the configured default
//! team. Team switches go to the backend and refresh the cache.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::DEFAULT_TEAM_ID;
use crate::models::{team_name, Match, SetTeamResponse, Team};
use crate::session::{SessionContext, SessionStore};

/// The backend calls the resolver depends on.
#[async_trait]
pub trait TeamBackend: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>>;

    /// Id of the team the backend session considers ours
    async fn get_my_team(&self) -> Result<String>;

    async fn set_my_team(&self, team_id: &str) -> Result<SetTeamResponse>;
}

#[async_trait]
impl TeamBackend for ApiClient {
    async fn list_teams(&self) -> Result<Vec<Team>> {
        ApiClient::list_teams(self).await
    }

    async fn get_my_team(&self) -> Result<String> {
        Ok(ApiClient::get_my_team(self).await?.my_team_id)
    }

    async fn set_my_team(&self, team_id: &str) -> Result<SetTeamResponse> {
        ApiClient::set_my_team(self, team_id).await
    }
}

/// Where a resolved context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// A fresh session cache entry
    Cache,
    /// The backend's get/set team endpoints; the cache was refreshed
    Backend,
    /// Team list plus the default team; nothing was cached
    Fallback,
    /// A team switch the backend did not confirm
    Optimistic,
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextSource::Cache => write!(f, "cache"),
            ContextSource::Backend => write!(f, "backend"),
            ContextSource::Fallback => write!(f, "fallback"),
            ContextSource::Optimistic => write!(f, "optimistic"),
        }
    }
}

/// Team context as handed to views.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamContext {
    pub teams: Vec<Team>,
    pub my_team_id: String,
    pub my_team_name: String,
    pub matches: Vec<Match>,
    pub source: ContextSource,
    /// When the cached entry was written. Only set for cache hits.
    pub cached_at: Option<DateTime<Utc>>,
}

impl TeamContext {
    fn from_session(session: SessionContext) -> Self {
        Self {
            teams: session.teams,
            my_team_id: session.my_team_id,
            my_team_name: session.my_team_name,
            matches: session.matches,
            source: ContextSource::Cache,
            cached_at: Some(session.timestamp),
        }
    }

    fn build(teams: Vec<Team>, my_team_id: String, matches: Vec<Match>, source: ContextSource) -> Self {
        let my_team_name = team_name(&teams, &my_team_id).unwrap_or_default().to_string();
        Self {
            teams,
            my_team_id,
            my_team_name,
            matches,
            source,
            cached_at: None,
        }
    }

    pub fn my_team(&self) -> Option<&Team> {
        self.teams.iter().find(|t| t.team_id == self.my_team_id)
    }

    /// Every team except ours, for opponent pickers.
    pub fn opponents(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().filter(move |t| t.team_id != self.my_team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchStatus {
    /// Backend confirmed and the cache now holds the new team
    Synced,
    /// A later switch started before this one finished; its response was not cached
    Superseded,
    /// Backend call failed; only the in-memory selection changed
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SwitchOutcome {
    pub context: TeamContext,
    pub status: SwitchStatus,
}

pub struct TeamContextResolver<B> {
    backend: B,
    store: SessionStore,
    default_team_id: String,
    active_team_id: RwLock<Option<String>>,
    switch_generation: AtomicU64,
}

impl<B: TeamBackend> TeamContextResolver<B> {
    pub fn new(backend: B, store: SessionStore) -> Self {
        Self {
            backend,
            store,
            default_team_id: DEFAULT_TEAM_ID.to_string(),
            active_team_id: RwLock::new(None),
            switch_generation: AtomicU64::new(0),
        }
    }

    pub fn with_default_team(mut self, team_id: impl Into<String>) -> Self {
        self.default_team_id = team_id.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The team selected in memory, which may be ahead of the backend after a failed switch.
    pub async fn active_team_id(&self) -> Option<String> {
        self.active_team_id.read().await.clone()
    }

    /// Resolve the current team context. Never fails; degrades to the fallback path.
    ///
    /// A switch that starts while this is in flight takes precedence: the
    /// backend result is then neither cached nor made the active team.
    pub async fn resolve(&self) -> TeamContext {
        let generation = self.switch_generation.load(Ordering::SeqCst);
        let context = match self.store.load() {
            Some(session) => {
                debug!(team_id = %session.my_team_id, "Team context served from cache");
                TeamContext::from_session(session)
            }
            None => match self.fetch().await {
                Ok(context) => context,
                Err(e) => {
                    warn!(error = %e, "Team context fetch failed, falling back to team list");
                    self.fallback().await
                }
            },
        };

        self.settle(generation, context).await
    }

    async fn fetch(&self) -> Result<TeamContext> {
        let my_team_id = self
            .backend
            .get_my_team()
            .await
            .context("Failed to get current team")?;

        let response = self
            .backend
            .set_my_team(&my_team_id)
            .await
            .with_context(|| format!("Failed to load context for team {}", my_team_id))?;

        let context = Self::context_from_response(&my_team_id, response, ContextSource::Backend);
        info!(team_id = %context.my_team_id, teams = context.teams.len(), "Team context loaded from backend");
        Ok(context)
    }

    // Commit a resolved context unless a switch started after `generation`.
    // The fallback path is never cached so the next resolve retries the backend.
    async fn settle(&self, generation: u64, context: TeamContext) -> TeamContext {
        let mut active = self.active_team_id.write().await;
        if self.switch_generation.load(Ordering::SeqCst) != generation {
            debug!(
                team_id = %context.my_team_id,
                "Team switched during resolve, keeping the switched team"
            );
            return match self.store.load() {
                Some(session) => TeamContext::from_session(session),
                None => context,
            };
        }

        if context.source == ContextSource::Backend {
            self.save(&context);
        }
        *active = Some(context.my_team_id.clone());
        context
    }

    async fn fallback(&self) -> TeamContext {
        let teams = match self.backend.list_teams().await {
            Ok(teams) => teams,
            Err(e) => {
                warn!(error = %e, "Team list fetch failed, continuing without teams");
                Vec::new()
            }
        };
        TeamContext::build(
            teams,
            self.default_team_id.clone(),
            Vec::new(),
            ContextSource::Fallback,
        )
    }

    /// Switch the active team. The in-memory selection changes immediately;
    /// the cache is refreshed once the backend confirms.
    pub async fn switch_team(&self, team_id: &str) -> SwitchOutcome {
        let generation = {
            let mut active = self.active_team_id.write().await;
            *active = Some(team_id.to_string());
            self.switch_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        match self.backend.set_my_team(team_id).await {
            Ok(response) => {
                let context = Self::context_from_response(team_id, response, ContextSource::Backend);
                // Held across the check and the save so no other switch lands in between
                let _active = self.active_team_id.write().await;
                if self.switch_generation.load(Ordering::SeqCst) != generation {
                    debug!(team_id, "Team switch superseded by a later switch, not caching");
                    return SwitchOutcome {
                        context,
                        status: SwitchStatus::Superseded,
                    };
                }
                self.save(&context);
                info!(team_id, "Switched active team");
                SwitchOutcome {
                    context,
                    status: SwitchStatus::Synced,
                }
            }
            Err(e) => {
                warn!(error = %e, team_id, "Team switch failed, keeping local selection");
                let teams = self.store.load().map(|s| s.teams).unwrap_or_default();
                SwitchOutcome {
                    context: TeamContext::build(
                        teams,
                        team_id.to_string(),
                        Vec::new(),
                        ContextSource::Optimistic,
                    ),
                    status: SwitchStatus::Failed(e.to_string()),
                }
            }
        }
    }

    /// Drop the cached context and resolve again.
    pub async fn refresh(&self) -> TeamContext {
        self.store.clear();
        self.resolve().await
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    fn context_from_response(
        requested_id: &str,
        response: SetTeamResponse,
        source: ContextSource,
    ) -> TeamContext {
        let my_team_id = response
            .my_team_id
            .unwrap_or_else(|| requested_id.to_string());
        TeamContext::build(response.teams, my_team_id, response.matches, source)
    }

    fn save(&self, context: &TeamContext) {
        self.store.save(
            &context.teams,
            &context.my_team_id,
            &context.my_team_name,
            &context.matches,
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, TimeZone};
    use tokio::sync::Notify;

    use crate::session::{ManualClock, MemoryStorage, SessionStorage, SESSION_KEY};

    fn league() -> Vec<Team> {
        vec![
            Team::new("9", "울산 현대 FC"),
            Team::new("10", "전북 현대 모터스"),
            Team::new("12", "포항 스틸러스"),
        ]
    }

    /// Holds a set-team call for one id until released.
    struct Gate {
        team_id: String,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[derive(Default)]
    struct FakeBackend {
        my_team: Option<String>,
        fail_set: bool,
        fail_list: bool,
        gate: Option<Gate>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with_my_team(team_id: &str) -> Self {
            Self {
                my_team: Some(team_id.to_string()),
                ..Default::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TeamBackend for FakeBackend {
        async fn list_teams(&self) -> Result<Vec<Team>> {
            self.record("list".to_string());
            if self.fail_list {
                anyhow::bail!("teams endpoint down");
            }
            Ok(league())
        }

        async fn get_my_team(&self) -> Result<String> {
            self.record("get".to_string());
            self.my_team
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no backend session"))
        }

        async fn set_my_team(&self, team_id: &str) -> Result<SetTeamResponse> {
            self.record(format!("set:{}", team_id));
            if let Some(gate) = &self.gate {
                if gate.team_id == team_id {
                    gate.entered.notify_one();
                    gate.release.notified().await;
                }
            }
            if self.fail_set {
                anyhow::bail!("set team failed");
            }
            Ok(SetTeamResponse {
                teams: league(),
                matches: vec![Match {
                    match_date: "2026-02-22".to_string(),
                    opponent: 12,
                    result: None,
                    score_us: 1,
                    score_opponent: 1,
                    is_home: false,
                }],
                my_team_id: Some(team_id.to_string()),
            })
        }
    }

    struct Harness {
        resolver: TeamContextResolver<FakeBackend>,
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
    }

    fn harness(backend: FakeBackend) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap(),
        ));
        let store = SessionStore::with_clock(storage.clone(), clock.clone());
        Harness {
            resolver: TeamContextResolver::new(backend, store),
            storage,
            clock,
        }
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_and_caches() {
        let h = harness(FakeBackend::with_my_team("9"));

        let context = h.resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Backend);
        assert_eq!(context.my_team_id, "9");
        assert_eq!(context.my_team_name, "울산 현대 FC");
        assert_eq!(context.matches.len(), 1);
        assert_eq!(h.resolver.backend().calls(), vec!["get", "set:9"]);

        let cached = h.resolver.store().load().unwrap();
        assert_eq!(cached.my_team_id, "9");
        assert_eq!(cached.teams, league());
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_backend_call() {
        let h = harness(FakeBackend::with_my_team("9"));
        h.resolver
            .store()
            .save(&league(), "10", "전북 현대 모터스", &[]);

        let context = h.resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Cache);
        assert_eq!(context.my_team_id, "10");
        assert!(context.cached_at.is_some());
        assert!(h.resolver.backend().calls().is_empty());
        assert_eq!(h.resolver.active_team_id().await.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_expired_cache_goes_to_backend() {
        let h = harness(FakeBackend::with_my_team("12"));
        h.resolver
            .store()
            .save(&league(), "10", "전북 현대 모터스", &[]);
        h.clock.advance(Duration::minutes(31));

        let context = h.resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Backend);
        assert_eq!(context.my_team_id, "12");
    }

    #[tokio::test]
    async fn test_get_failure_falls_back_without_caching() {
        let h = harness(FakeBackend::default());

        let context = h.resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Fallback);
        assert_eq!(context.my_team_id, DEFAULT_TEAM_ID);
        assert_eq!(context.my_team_name, "전북 현대 모터스");
        assert_eq!(context.teams.len(), 3);
        assert!(h.storage.get_item(SESSION_KEY).unwrap().is_none());

        // Next resolve retries the full path
        h.resolver.resolve().await;
        assert_eq!(
            h.resolver.backend().calls(),
            vec!["get", "list", "get", "list"]
        );
    }

    #[tokio::test]
    async fn test_set_failure_falls_back() {
        let h = harness(FakeBackend {
            my_team: Some("9".to_string()),
            fail_set: true,
            ..Default::default()
        });

        let context = h.resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Fallback);
        assert_eq!(context.my_team_id, DEFAULT_TEAM_ID);
        assert_eq!(h.resolver.backend().calls(), vec!["get", "set:9", "list"]);
        assert!(!h.resolver.store().is_valid());
    }

    #[tokio::test]
    async fn test_total_failure_uses_default_team_without_teams() {
        let h = harness(FakeBackend {
            fail_list: true,
            ..Default::default()
        });
        let resolver = h.resolver.with_default_team("12");

        let context = resolver.resolve().await;
        assert_eq!(context.source, ContextSource::Fallback);
        assert_eq!(context.my_team_id, "12");
        assert!(context.teams.is_empty());
        assert_eq!(context.my_team_name, "");
    }

    #[tokio::test]
    async fn test_switch_refreshes_cache() {
        let h = harness(FakeBackend::with_my_team("10"));
        h.resolver.resolve().await;

        let outcome = h.resolver.switch_team("12").await;
        assert_eq!(outcome.status, SwitchStatus::Synced);
        assert_eq!(outcome.context.my_team_name, "포항 스틸러스");
        assert_eq!(h.resolver.store().load().unwrap().my_team_id, "12");
        assert_eq!(h.resolver.active_team_id().await.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_failed_switch_is_optimistic() {
        let h = harness(FakeBackend {
            my_team: Some("10".to_string()),
            fail_set: true,
            ..Default::default()
        });
        h.resolver
            .store()
            .save(&league(), "10", "전북 현대 모터스", &[]);

        let outcome = h.resolver.switch_team("9").await;
        assert!(matches!(outcome.status, SwitchStatus::Failed(_)));
        assert_eq!(outcome.context.source, ContextSource::Optimistic);
        assert_eq!(outcome.context.my_team_name, "울산 현대 FC");
        assert_eq!(h.resolver.active_team_id().await.as_deref(), Some("9"));
        // Cache still holds the last confirmed team
        assert_eq!(h.resolver.store().load().unwrap().my_team_id, "10");
    }

    #[tokio::test]
    async fn test_stale_switch_response_is_not_cached() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let h = harness(FakeBackend {
            my_team: Some("10".to_string()),
            gate: Some(Gate {
                team_id: "9".to_string(),
                entered: entered.clone(),
                release: release.clone(),
            }),
            ..Default::default()
        });

        let slow = h.resolver.switch_team("9");
        let fast = async {
            // Start only once the slow switch is waiting on the backend
            entered.notified().await;
            let outcome = h.resolver.switch_team("12").await;
            release.notify_one();
            outcome
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(fast.status, SwitchStatus::Synced);
        assert_eq!(slow.status, SwitchStatus::Superseded);
        assert_eq!(h.resolver.store().load().unwrap().my_team_id, "12");
        assert_eq!(h.resolver.active_team_id().await.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_switch_during_resolve_wins() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let h = harness(FakeBackend {
            my_team: Some("9".to_string()),
            gate: Some(Gate {
                team_id: "9".to_string(),
                entered: entered.clone(),
                release: release.clone(),
            }),
            ..Default::default()
        });

        let resolve = h.resolver.resolve();
        let switch = async {
            // Switch while the resolve is waiting on set:9
            entered.notified().await;
            let outcome = h.resolver.switch_team("12").await;
            release.notify_one();
            outcome
        };
        let (resolved, switched) = tokio::join!(resolve, switch);

        assert_eq!(switched.status, SwitchStatus::Synced);
        assert_eq!(resolved.my_team_id, "12");
        assert_eq!(h.resolver.store().load().unwrap().my_team_id, "12");
        assert_eq!(h.resolver.active_team_id().await.as_deref(), Some("12"));
        assert_eq!(h.resolver.backend().calls(), vec!["get", "set:9", "set:12"]);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let h = harness(FakeBackend::with_my_team("9"));
        h.resolver
            .store()
            .save(&league(), "10", "전북 현대 모터스", &[]);

        let context = h.resolver.refresh().await;
        assert_eq!(context.source, ContextSource::Backend);
        assert_eq!(context.my_team_id, "9");
        assert_eq!(h.resolver.backend().calls(), vec!["get", "set:9"]);
    }

    #[test]
    fn test_opponents_exclude_my_team() {
        let context = TeamContext::build(
            league(),
            "10".to_string(),
            Vec::new(),
            ContextSource::Fallback,
        );
        let ids: Vec<&str> = context.opponents().map(|t| t.team_id.as_str()).collect();
        assert_eq!(ids, vec!["9", "12"]);
        assert_eq!(context.my_team().map(|t| t.team_name.as_str()), Some("전북 현대 모터스"));
    }
}
