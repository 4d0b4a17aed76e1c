//! REST client for the league simulator backend.
//!
//! This module provides the `ApiClient` for the team session endpoints,
//! roster lookups, and the lineup, match-strategy, trade and transfer
//! simulations, plus the simulation log.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
