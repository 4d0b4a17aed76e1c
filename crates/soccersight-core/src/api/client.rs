//! API client for the league simulator backend.
//!
//! This module provides the `ApiClient` struct for the session, roster and
//! simulation endpoints. The backend is a set of PHP scripts, usually exposed
//! through an ngrok tunnel, so every request carries the header that skips
//! ngrok's browser warning page.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{
    dedup_teams, CreatedLog, GoalStats, GrowthQuery, GrowthResponse, LineupRecommendation,
    LineupRequest, MyTeamResponse, NewSimulationLog, OlapResponse, Player, PlayerFilter,
    PlayerGrowth, RosterAction, RosterRequest, RosterResponse, SetTeamResponse, SimulationLog,
    StrategyPrediction, StrategyRequest, Team, TeamRanking, TradeRequest, TradeResult,
    TransferRequest, TransferResult,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const TEAMS_PATH: &str = "api/meta/teams.php";
const PLAYERS_PATH: &str = "api/meta/players.php";
const GET_TEAM_PATH: &str = "api/session/get_team.php";
const SET_TEAM_PATH: &str = "api/session/set_team.php";
const PLAYER_GROWTH_PATH: &str = "api/player.php";
const TEAM_RANKING_PATH: &str = "api/team.php";
const LINEUP_PATH: &str = "api/lineup/recommendation.php";
const MATCH_PATH: &str = "api/simulations/match.php";
const TRADE_PATH: &str = "api/simulations/trade.php";
const TRANSFER_PATH: &str = "api/simulations/transfer.php";
const LOG_PATH: &str = "api/simulations/log.php";
const GOAL_STATS_PATH: &str = "api/analysis/olap.php";
const ACQUIRE_PATH: &str = "api/myteam/acquire/";
const RELEASE_PATH: &str = "api/myteam/release/";

const NGROK_SKIP_HEADER: &str = "ngrok-skip-browser-warning";
const NGROK_SKIP_VALUE: &str = "69420";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the league backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(NGROK_SKIP_HEADER, header::HeaderValue::from_static(NGROK_SKIP_VALUE));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, keeping transport failures typed as `ApiError::NetworkError`.
    async fn send(request: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Decode a JSON body. A misrouted tunnel answers with an HTML page and a 200,
    /// so that case gets its own error instead of a serde message.
    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if text.trim_start().starts_with('<') {
            return Err(ApiError::InvalidResponse(format!(
                "expected JSON from {} but received HTML: {}",
                url,
                ApiError::truncate_body(text.trim())
            ))
            .into());
        }

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, ?query, "GET");

        let response = Self::send(self.client.get(&url).query(query), "GET", &url).await?;
        Self::parse_json(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = Self::send(self.client.post(&url).json(body), "POST", &url).await?;
        Self::parse_json(response, &url).await
    }

    // ===== Team session =====

    /// Fetch every league team, de-duplicated by id
    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let teams: Vec<Team> = self.get(TEAMS_PATH, &[]).await?;
        Ok(dedup_teams(teams))
    }

    /// Ask the backend which team is currently ours
    pub async fn get_my_team(&self) -> Result<MyTeamResponse> {
        self.get(GET_TEAM_PATH, &[]).await
    }

    /// Make `team_id` our team. The response carries the full team list and recent matches.
    pub async fn set_my_team(&self, team_id: &str) -> Result<SetTeamResponse> {
        let mut response: SetTeamResponse = self
            .get(SET_TEAM_PATH, &[("team_id", team_id.to_string())])
            .await?;
        response.teams = dedup_teams(std::mem::take(&mut response.teams));
        Ok(response)
    }

    // ===== Players =====

    pub async fn list_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>> {
        self.get(PLAYERS_PATH, &filter.query_pairs()).await
    }

    pub async fn player_growth(&self, query: &GrowthQuery) -> Result<Vec<PlayerGrowth>> {
        let response: GrowthResponse = self.get(PLAYER_GROWTH_PATH, &query.query_pairs()).await?;
        Ok(response.players)
    }

    pub async fn team_ranking(&self, season_id: i32, team_id: &str) -> Result<TeamRanking> {
        self.get(
            TEAM_RANKING_PATH,
            &[
                ("season_id", season_id.to_string()),
                ("team_id", team_id.to_string()),
            ],
        )
        .await
    }

    // ===== Simulations =====

    pub async fn recommend_lineup(&self, request: &LineupRequest) -> Result<LineupRecommendation> {
        self.post(LINEUP_PATH, request).await
    }

    pub async fn predict_match(&self, request: &StrategyRequest) -> Result<StrategyPrediction> {
        self.post(MATCH_PATH, request).await
    }

    pub async fn simulate_trade(&self, request: &TradeRequest) -> Result<TradeResult> {
        self.post(TRADE_PATH, request).await
    }

    pub async fn simulate_transfer(&self, request: &TransferRequest) -> Result<TransferResult> {
        self.post(TRANSFER_PATH, request).await
    }

    // ===== Simulation log =====

    pub async fn list_simulation_logs(&self) -> Result<Vec<SimulationLog>> {
        self.get(LOG_PATH, &[]).await
    }

    pub async fn create_simulation_log(&self, log: &NewSimulationLog) -> Result<CreatedLog> {
        self.post(LOG_PATH, log).await
    }

    /// Delete a log entry. Any 2xx, including 204 with no body, is success.
    pub async fn delete_simulation_log(&self, log_id: i64) -> Result<()> {
        let url = self.url(LOG_PATH);
        debug!(url = %url, log_id, "DELETE");

        Self::send(
            self.client.delete(&url).query(&[("log_id", log_id)]),
            "DELETE",
            &url,
        )
        .await?;
        Ok(())
    }

    // ===== Dashboard stats =====

    /// League, team, midfielder and forward goal totals for a season
    pub async fn goal_stats(&self, season_id: i32) -> Result<GoalStats> {
        let response: OlapResponse = self
            .get(GOAL_STATS_PATH, &[("season_id", season_id.to_string())])
            .await?;
        let stats = GoalStats::from_rows(&response.data)
            .with_context(|| format!("Incomplete goal statistics for season {}", season_id))?;
        Ok(stats)
    }

    // ===== Roster management =====

    /// Add a player to, or drop one from, our team's roster.
    /// A response without `success: true` is an error.
    pub async fn update_roster(&self, action: RosterAction, player_id: &str) -> Result<()> {
        let path = match action {
            RosterAction::Acquire => ACQUIRE_PATH,
            RosterAction::Release => RELEASE_PATH,
        };
        let request = RosterRequest {
            player_id: player_id.trim().to_string(),
        };
        let response: RosterResponse = self.post(path, &request).await?;

        if !response.success {
            let reason = response
                .message
                .unwrap_or_else(|| "backend reported failure".to_string());
            anyhow::bail!("Could not {} player {}: {}", action, request.player_id, reason);
        }
        debug!(%action, player_id = %request.player_id, "Roster updated");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
