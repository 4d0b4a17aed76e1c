//! SoccerSight CLI - a terminal dashboard for the league simulator.
//!
//! Shows the active team's context, rosters and rankings, and runs the
//! lineup, match-strategy, trade and transfer simulations against the
//! backend.

mod commands;
mod render;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use soccersight_core::models::{Formation, GrowthMetric, RosterAction, TransferType};
use soccersight_core::session::{FileStorage, MemoryStorage, SessionStorage};
use soccersight_core::{ApiClient, Config, SessionStore, TeamContextResolver};

use commands::{App, ConfigUpdate, LogFilter};

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "soccersight.log";

#[derive(Parser, Debug)]
#[command(name = "soccersight", version, about = "League simulator dashboard")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "SOCCERSIGHT_API_URL")]
    api_url: Option<String>,

    /// Also write logs to a daily file in the cache directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change the active team
    Team {
        #[command(subcommand)]
        action: Option<TeamAction>,
    },
    /// List league teams
    Teams,
    /// List players, optionally filtered by team and position
    Players {
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        position: Option<String>,
    },
    /// Player growth analysis for a team (defaults to the active team)
    Growth {
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long, default_value = "offense")]
        metric: GrowthMetric,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },
    /// Predicted monthly ranking for one or more teams
    Ranking {
        #[arg(long, default_value_t = soccersight_core::models::DEFAULT_SEASON_ID)]
        season: i32,
        /// Team ids (defaults to the active team)
        teams: Vec<String>,
    },
    /// Recommend a lineup against an opponent
    Lineup {
        #[arg(long)]
        formation: Formation,
        #[arg(long)]
        opponent: String,
        #[arg(long)]
        team: Option<String>,
    },
    /// Predict a match outcome for a strategy
    Strategy(StrategyArgs),
    /// Simulate a player trade between two teams
    Trade(TradeArgs),
    /// Simulate acquiring or releasing a player
    Transfer {
        #[arg(long)]
        player: String,
        #[arg(long = "type", default_value = "acquire")]
        kind: TransferType,
        #[arg(long)]
        team: Option<String>,
    },
    /// Show or manage the simulation log
    Logs {
        #[command(subcommand)]
        action: Option<LogAction>,
        /// Only show trades
        #[arg(long, conflicts_with = "transfers")]
        trades: bool,
        /// Only show acquisitions and releases
        #[arg(long)]
        transfers: bool,
    },
    /// Season goal totals for the league, our team, midfielders and forwards
    Stats {
        #[arg(long, default_value_t = soccersight_core::models::DEFAULT_SEASON_ID)]
        season: i32,
    },
    /// Add players to or drop them from our squad
    Roster {
        #[command(subcommand)]
        action: RosterCommand,
    },
    /// Show or edit the config file
    #[command(name = "config")]
    Settings {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Sign a player
    Acquire { player_id: String },
    /// Release a player
    Release { player_id: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Save settings to the config file
    Set {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        default_team: Option<String>,
        /// Request timeout in seconds
        #[arg(long = "timeout")]
        timeout_secs: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum TeamAction {
    /// Show the active team context (default)
    Show,
    /// Make another team the active team
    Switch { team_id: String },
    /// Drop the cached context and reload it from the backend
    Refresh,
    /// Drop the cached context
    Clear,
    /// Report whether a cached context exists and when it expires
    Status,
}

#[derive(Subcommand, Debug)]
enum LogAction {
    /// Delete a log entry
    Delete { log_id: i64 },
}

#[derive(Args, Debug)]
struct StrategyArgs {
    #[arg(long)]
    opponent: String,
    /// Match date (YYYY-MM-DD)
    #[arg(long)]
    date: String,
    #[arg(long, default_value = soccersight_core::models::DEFAULT_STRATEGY)]
    strategy: String,
    /// Play the match away from home
    #[arg(long)]
    away: bool,
}

#[derive(Args, Debug)]
struct TradeArgs {
    /// Team on the other side of the trade
    #[arg(long = "with")]
    other_team: String,
    /// Player ids leaving our team
    #[arg(long = "give", required = true)]
    give: Vec<String>,
    /// Player ids joining our team
    #[arg(long = "get", required = true)]
    get: Vec<String>,
    /// Trade on behalf of this team instead of the active team
    #[arg(long)]
    team: Option<String>,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

fn open_storage(config: &Config) -> Arc<dyn SessionStorage> {
    let storage = config
        .cache_dir()
        .and_then(|dir| FileStorage::new(dir).map_err(anyhow::Error::from));
    match storage {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = %e, "Cache directory unavailable, session will not persist");
            Arc::new(MemoryStorage::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = Config::default();
            config.apply_env(|key| std::env::var(key).ok());
            (config, Some(e))
        }
    };
    if let Some(url) = cli.api_url.clone() {
        config.api_base_url = url;
    }

    let log_dir = if cli.log_file {
        config.cache_dir().ok()
    } else {
        None
    };
    let _log_guard = init_tracing(log_dir.as_deref());

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(api = %config.api_base_url, "SoccerSight starting");

    let client = ApiClient::from_config(&config)?;
    let store = SessionStore::new(open_storage(&config));
    let resolver = TeamContextResolver::new(client.clone(), store)
        .with_default_team(config.default_team_id.clone());
    let app = App::new(client, resolver);

    match cli.command {
        Command::Team { action } => match action.unwrap_or(TeamAction::Show) {
            TeamAction::Show => app.show_team().await,
            TeamAction::Switch { team_id } => app.switch_team(&team_id).await,
            TeamAction::Refresh => app.refresh_team().await,
            TeamAction::Clear => {
                app.clear_team();
                Ok(())
            }
            TeamAction::Status => {
                app.team_status();
                Ok(())
            }
        },
        Command::Teams => app.list_teams().await,
        Command::Players { team, position } => app.list_players(team, position).await,
        Command::Growth {
            team,
            position,
            metric,
            asc,
        } => app.player_growth(team, position, metric, asc).await,
        Command::Ranking { season, teams } => app.team_ranking(season, teams).await,
        Command::Lineup {
            formation,
            opponent,
            team,
        } => app.recommend_lineup(formation, &opponent, team).await,
        Command::Strategy(args) => {
            app.predict_match(&args.opponent, &args.date, &args.strategy, args.away)
                .await
        }
        Command::Trade(args) => {
            app.simulate_trade(args.team, &args.other_team, args.give, args.get)
                .await
        }
        Command::Transfer { player, kind, team } => {
            app.simulate_transfer(team, &player, kind).await
        }
        Command::Logs {
            action,
            trades,
            transfers,
        } => match action {
            Some(LogAction::Delete { log_id }) => app.delete_log(log_id).await,
            None => app.list_logs(LogFilter::from_flags(trades, transfers)).await,
        },
        Command::Stats { season } => app.goal_stats(season).await,
        Command::Roster { action } => match action {
            RosterCommand::Acquire { player_id } => {
                app.update_roster(RosterAction::Acquire, &player_id).await
            }
            RosterCommand::Release { player_id } => {
                app.update_roster(RosterAction::Release, &player_id).await
            }
        },
        Command::Settings { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::show_config(&config),
            ConfigAction::Set {
                url,
                default_team,
                timeout_secs,
            } => commands::update_config(ConfigUpdate {
                api_url: url,
                default_team,
                timeout_secs,
            }),
        },
    }
}
