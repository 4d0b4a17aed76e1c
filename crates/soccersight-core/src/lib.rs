//! SoccerSight core library.
//!
//! Typed client for the league simulator backend plus the team session
//! cache that every view shares:
//!
//! - `api`: HTTP client for teams, players, rankings and simulations
//! - `session`: 30-minute expiring cache of the active team context
//! - `resolver`: cache-first resolution and switching of the active team
//! - `models`: request and response types
//! - `config`: backend URL, default team and cache location

pub mod api;
pub mod config;
pub mod models;
pub mod resolver;
pub mod session;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use resolver::{
    ContextSource, SwitchOutcome, SwitchStatus, TeamBackend, TeamContext, TeamContextResolver,
};
pub use session::{FileStorage, MemoryStorage, SessionContext, SessionStorage, SessionStore};
