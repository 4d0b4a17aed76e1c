use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::clock::{Clock, SystemClock};
use super::storage::{SessionStorage, StorageError};
use crate::models::{Match, Team};

/// Storage key for the team session. Shared with the web dashboard's local storage slot.
pub const SESSION_KEY: &str = "bigdata_team_session";

/// A team session is discarded once it is this old.
pub const SESSION_EXPIRY_MINUTES: i64 = 30;

/// The cached "my team" context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionContext {
    pub teams: Vec<Team>,
    pub my_team_id: String,
    pub my_team_name: String,
    #[serde(default)]
    pub matches: Vec<Match>,
    /// Unix epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub timestamp: DateTime<Utc>,
}

impl SessionContext {
    pub fn expiry() -> Duration {
        Duration::minutes(SESSION_EXPIRY_MINUTES)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.timestamp + Self::expiry()
    }

    /// Expired once the age reaches the expiry. A future timestamp counts as fresh.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp >= Self::expiry()
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).max(Duration::zero())
    }

    pub fn age_minutes_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_minutes()
    }

    pub fn age_display_at(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age_minutes_at(now);
        if minutes < 1 {
            // Covers clock skew as well
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else {
            format!("{}h ago", minutes / 60)
        }
    }
}

/// Expiring single-slot cache for the team session.
///
/// Every storage failure is logged and treated as a cache miss. The backend
/// stays the source of truth, so nothing here is surfaced to callers.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Replace the stored session. Failures are logged and leave the previous value in place.
    pub fn save(&self, teams: &[Team], team_id: &str, team_name: &str, matches: &[Match]) {
        let context = SessionContext {
            teams: teams.to_vec(),
            my_team_id: team_id.to_string(),
            my_team_name: team_name.to_string(),
            matches: matches.to_vec(),
            // Millisecond precision is all the stored format keeps
            timestamp: self.clock.now().trunc_subsecs(3),
        };

        match self.write(&context) {
            Ok(()) => debug!(
                team_id,
                teams = context.teams.len(),
                matches = context.matches.len(),
                "Team session saved"
            ),
            Err(e) => error!(error = %e, team_id, "Failed to save team session"),
        }
    }

    fn write(&self, context: &SessionContext) -> Result<(), StorageError> {
        let contents = serde_json::to_string(context)?;
        self.storage.set_item(SESSION_KEY, &contents)
    }

    /// Read the stored session, purging it if it is corrupt or expired.
    pub fn load(&self) -> Option<SessionContext> {
        let stored = match self.storage.get_item(SESSION_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No team session stored");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read team session, treating as missing");
                self.purge();
                return None;
            }
        };

        let context: SessionContext = match serde_json::from_str(&stored) {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Stored team session is corrupt, purging");
                self.purge();
                return None;
            }
        };

        let now = self.clock.now();
        if context.is_expired_at(now) {
            debug!(
                age_minutes = context.age_minutes_at(now),
                "Team session expired, purging"
            );
            self.purge();
            return None;
        }

        Some(context)
    }

    /// Remove the stored session. Safe to call when nothing is stored.
    pub fn clear(&self) {
        match self.storage.remove_item(SESSION_KEY) {
            Ok(()) => debug!("Team session cleared"),
            Err(e) => error!(error = %e, "Failed to clear team session"),
        }
    }

    /// Whether `load` would return a session. Purges expired or corrupt data as a side effect.
    pub fn is_valid(&self) -> bool {
        self.load().is_some()
    }

    fn purge(&self) {
        if let Err(e) = self.storage.remove_item(SESSION_KEY) {
            warn!(error = %e, "Failed to purge team session");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
