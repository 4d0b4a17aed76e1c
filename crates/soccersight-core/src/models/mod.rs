//! Data models for the league backend.
//!
//! - `Team`, `Match`: reference data and the active team's recent results
//! - `Player`, `PlayerGrowth`: roster entries and growth analysis
//! - `TeamRanking`: monthly rank predictions
//! - `GoalStats`: season goal rollup; roster acquire/release bodies
//! - Simulation types: lineup, match strategy, trade, transfer and the log

pub mod player;
pub mod ranking;
pub mod simulation;
pub mod stats;
pub mod team;

pub use player::{
    player_name, GrowthMetric, GrowthQuery, GrowthResponse, Player, PlayerFilter, PlayerGrowth,
    SortOrder,
};
pub use ranking::{MonthlyRank, TeamRanking, DEFAULT_SEASON_ID};
pub use simulation::{
    CreatedLog, Formation, LineupRecommendation, LineupRequest, LineupSlot, LogKind,
    NewSimulationLog, SimulationLog, StrategyImpact, StrategyPrediction, StrategyRequest,
    TeamDelta, TradeRequest, TradeResult, TransferRequest, TransferResult, TransferType,
    DEFAULT_STRATEGY,
};
pub use stats::{
    GoalStats, OlapResponse, OlapRow, RosterAction, RosterRequest, RosterResponse, StatsError,
};
pub use team::{dedup_teams, team_name, Match, MatchOutcome, MyTeamResponse, SetTeamResponse, Team};
