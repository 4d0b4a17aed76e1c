//! Command handlers.
//!
//! Each handler resolves whatever team context it needs, calls the backend
//! and hands the result to `render`. Team context commands never fail; the
//! simulation and log commands return backend errors to the caller.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use futures::future;
use tracing::{debug, warn};

use soccersight_core::models::{
    player_name, Formation, GrowthMetric, GrowthQuery, LineupRequest, LogKind, NewSimulationLog,
    PlayerFilter, RosterAction, SimulationLog, SortOrder, StrategyRequest, TradeRequest,
    TradeResult, TransferRequest, TransferType,
};
use soccersight_core::{ApiClient, Config, SwitchStatus, TeamContextResolver};

use crate::render;

pub struct App {
    client: ApiClient,
    resolver: TeamContextResolver<ApiClient>,
}

impl App {
    pub fn new(client: ApiClient, resolver: TeamContextResolver<ApiClient>) -> Self {
        Self { client, resolver }
    }

    /// Use the explicit team if one was given, otherwise the active team.
    async fn team_or_mine(&self, team: Option<String>) -> String {
        match explicit_team(team) {
            Some(team) => team,
            None => self.resolver.resolve().await.my_team_id,
        }
    }

    // ===== Team context =====

    pub async fn show_team(&self) -> Result<()> {
        let context = self.resolver.resolve().await;
        render::team_context(&context, self.resolver.store().now());
        Ok(())
    }

    pub async fn switch_team(&self, team_id: &str) -> Result<()> {
        let outcome = self.resolver.switch_team(team_id).await;
        render::switch_outcome(&outcome);
        if let SwitchStatus::Failed(ref reason) = outcome.status {
            debug!(reason = %reason, "Switch not confirmed by backend");
        }
        Ok(())
    }

    pub async fn refresh_team(&self) -> Result<()> {
        let context = self.resolver.refresh().await;
        render::team_context(&context, self.resolver.store().now());
        Ok(())
    }

    pub fn clear_team(&self) {
        self.resolver.clear();
        println!("Team session cleared");
    }

    pub fn team_status(&self) {
        let store = self.resolver.store();
        render::session_status(store.load().as_ref(), store.now());
    }

    // ===== Reference data =====

    pub async fn list_teams(&self) -> Result<()> {
        let (teams, context) =
            future::join(self.client.list_teams(), self.resolver.resolve()).await;
        let teams = teams.context("Failed to load teams")?;
        render::teams(&teams, Some(&context.my_team_id));
        Ok(())
    }

    pub async fn list_players(&self, team: Option<String>, position: Option<String>) -> Result<()> {
        let filter = PlayerFilter {
            team_id: team,
            position: position.map(|p| p.to_uppercase()),
        };
        let players = self
            .client
            .list_players(&filter)
            .await
            .context("Failed to load players")?;
        render::players(&players);
        Ok(())
    }

    pub async fn player_growth(
        &self,
        team: Option<String>,
        position: Option<String>,
        metric: GrowthMetric,
        ascending: bool,
    ) -> Result<()> {
        let query = GrowthQuery {
            team_id: self.team_or_mine(team).await,
            position: position.map(|p| p.to_uppercase()),
            metric,
            sort: if ascending { SortOrder::Asc } else { SortOrder::Desc },
        };
        let players = self
            .client
            .player_growth(&query)
            .await
            .context("Failed to load player growth")?;
        render::growth(&players, metric);
        Ok(())
    }

    pub async fn team_ranking(&self, season_id: i32, teams: Vec<String>) -> Result<()> {
        let team_ids = if teams.is_empty() {
            vec![self.team_or_mine(None).await]
        } else {
            teams
        };

        let rankings = future::try_join_all(
            team_ids
                .iter()
                .map(|team_id| self.client.team_ranking(season_id, team_id)),
        )
        .await
        .context("Failed to load team rankings")?;

        for ranking in &rankings {
            render::ranking(ranking);
        }
        Ok(())
    }

    // ===== Simulations =====

    pub async fn recommend_lineup(
        &self,
        formation: Formation,
        opponent: &str,
        team: Option<String>,
    ) -> Result<()> {
        let request = LineupRequest {
            team_id: self.team_or_mine(team).await,
            formation,
            opponent_team_id: opponent.to_string(),
        };
        let recommendation = self
            .client
            .recommend_lineup(&request)
            .await
            .context("Failed to get lineup recommendation")?;
        render::lineup(&request, &recommendation);
        Ok(())
    }

    pub async fn predict_match(
        &self,
        opponent: &str,
        date: &str,
        strategy: &str,
        away: bool,
    ) -> Result<()> {
        let match_date = parse_match_date(date)?;

        let context = self.resolver.resolve().await;
        let (home_team_id, away_team_id) = home_and_away(&context.my_team_id, opponent, away);

        let request = StrategyRequest {
            match_date,
            home_team_id,
            away_team_id,
            strategy: strategy.to_string(),
        };
        let prediction = self
            .client
            .predict_match(&request)
            .await
            .context("Failed to predict match")?;
        render::strategy(&request, &prediction, &context.teams);
        Ok(())
    }

    pub async fn simulate_trade(
        &self,
        team: Option<String>,
        other_team: &str,
        give: Vec<String>,
        get: Vec<String>,
    ) -> Result<()> {
        let context = self.resolver.resolve().await;
        let team_a_id = explicit_team(team).unwrap_or_else(|| context.my_team_id.clone());
        let request = trade_request(team_a_id, other_team, give, get)?;
        let result = self
            .client
            .simulate_trade(&request)
            .await
            .context("Trade simulation failed")?;

        let log_id = match trade_log_entry(&request, &result) {
            None => result.log_id,
            Some(entry) => match self.client.create_simulation_log(&entry).await {
                Ok(created) => Some(created.log_id),
                Err(e) => {
                    warn!(error = %e, "Failed to record trade in simulation log");
                    None
                }
            },
        };

        render::trade(&result, &context.teams, log_id);
        Ok(())
    }

    pub async fn simulate_transfer(
        &self,
        team: Option<String>,
        player: &str,
        kind: TransferType,
    ) -> Result<()> {
        let request = TransferRequest {
            team_id: self.team_or_mine(team).await,
            player_in_id: player.to_string(),
            kind,
        };
        let result = self
            .client
            .simulate_transfer(&request)
            .await
            .context("Transfer simulation failed")?;
        render::transfer(&request, &result);
        Ok(())
    }

    // ===== Simulation log =====

    pub async fn list_logs(&self, filter: LogFilter) -> Result<()> {
        let all_players = PlayerFilter::default();
        let (teams, players, logs) = future::join3(
            self.client.list_teams(),
            self.client.list_players(&all_players),
            self.client.list_simulation_logs(),
        )
        .await;

        let logs = logs.context("Failed to load simulation log")?;
        // Names are cosmetic; fall back to raw ids when lookups fail
        let teams = teams.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load teams for log display");
            Vec::new()
        });
        let players = players.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load players for log display");
            Vec::new()
        });

        let shown: Vec<_> = logs.iter().filter(|log| filter.keeps(log)).collect();

        render::logs(&shown, &teams, |id| player_name(&players, id));
        Ok(())
    }

    pub async fn delete_log(&self, log_id: i64) -> Result<()> {
        self.client
            .delete_simulation_log(log_id)
            .await
            .with_context(|| format!("Failed to delete log {}", log_id))?;
        println!("Deleted simulation log {}", log_id);
        Ok(())
    }

    // ===== Dashboard stats =====

    pub async fn goal_stats(&self, season_id: i32) -> Result<()> {
        let (stats, context) =
            future::join(self.client.goal_stats(season_id), self.resolver.resolve()).await;
        let stats = stats.context("Failed to load goal statistics")?;
        render::goal_stats(season_id, &stats, &context.my_team_name);
        Ok(())
    }

    // ===== Roster management =====

    pub async fn update_roster(&self, action: RosterAction, player_id: &str) -> Result<()> {
        let player_id = player_id.trim();
        if player_id.is_empty() {
            bail!("Player id must not be empty");
        }

        self.client
            .update_roster(action, player_id)
            .await
            .with_context(|| format!("Failed to {} player {}", action, player_id))?;
        render::roster_updated(action, player_id);

        // Show the squad as it now stands; a failed reload is not worth an error
        let my_team_id = self.team_or_mine(None).await;
        match self.client.list_players(&PlayerFilter::for_team(my_team_id)).await {
            Ok(players) => render::players(&players),
            Err(e) => warn!(error = %e, "Failed to reload roster after update"),
        }
        Ok(())
    }
}

// ===== Configuration =====

/// Settings `config set` may change. Unset fields are left alone.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub api_url: Option<String>,
    pub default_team: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigUpdate {
    /// Apply to `config`, returning whether anything was set.
    fn apply(self, config: &mut Config) -> bool {
        let mut changed = false;
        if let Some(url) = self.api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            config.api_base_url = url;
            changed = true;
        }
        if let Some(team) = explicit_team(self.default_team) {
            config.default_team_id = team;
            changed = true;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
            changed = true;
        }
        changed
    }
}

pub fn show_config(config: &Config) -> Result<()> {
    render::config(config, &Config::config_path()?);
    Ok(())
}

/// Write settings to the config file. Environment overrides are not persisted.
pub fn update_config(update: ConfigUpdate) -> Result<()> {
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;
    if !update.apply(&mut config) {
        bail!("Nothing to change; pass --url, --default-team or --timeout");
    }
    config.save()?;
    render::config(&config, &path);
    Ok(())
}

// ===== Helpers =====

/// Which simulation log entries to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilter {
    All,
    Trades,
    Transfers,
}

impl LogFilter {
    pub fn from_flags(trades: bool, transfers: bool) -> Self {
        if trades {
            LogFilter::Trades
        } else if transfers {
            LogFilter::Transfers
        } else {
            LogFilter::All
        }
    }

    /// Unknown entry kinds are never shown; trades need both sides.
    fn keeps(self, log: &SimulationLog) -> bool {
        match self {
            LogFilter::All => log.kind != LogKind::Unknown,
            LogFilter::Trades => log.is_complete_trade(),
            LogFilter::Transfers => log.is_transfer(),
        }
    }
}

/// An explicitly requested team id, or `None` when absent or blank.
fn explicit_team(team: Option<String>) -> Option<String> {
    team.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn parse_match_date(date: &str) -> Result<String> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid match date '{}', expected YYYY-MM-DD", date))?;
    Ok(parsed.format("%Y-%m-%d").to_string())
}

/// (home, away) team ids for a match against `opponent`.
fn home_and_away(my_team_id: &str, opponent: &str, away: bool) -> (String, String) {
    if away {
        (opponent.to_string(), my_team_id.to_string())
    } else {
        (my_team_id.to_string(), opponent.to_string())
    }
}

fn trade_request(
    team_a_id: String,
    other_team: &str,
    give: Vec<String>,
    get: Vec<String>,
) -> Result<TradeRequest> {
    let team_b_id = other_team.trim().to_string();
    if team_a_id == team_b_id {
        bail!("A team cannot trade with itself");
    }
    Ok(TradeRequest {
        team_a_id,
        team_b_id,
        players_a: give,
        players_b: get,
    })
}

/// Log entry for a trade the backend did not record itself.
fn trade_log_entry(request: &TradeRequest, result: &TradeResult) -> Option<NewSimulationLog> {
    if result.log_id.is_some() {
        return None;
    }
    Some(NewSimulationLog::Trade {
        team_a_id: request.team_a_id.clone(),
        team_b_id: request.team_b_id.clone(),
        players_a: request.players_a.clone(),
        players_b: request.players_b.clone(),
        delta: result.delta.clone(),
    })
}
