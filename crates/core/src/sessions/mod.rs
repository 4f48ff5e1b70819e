//! Trading sessions module - market table, session clock, and regional aggregation.

mod market_definitions;
mod regions;
mod session_clock;
mod sessions_model;
mod sessions_service;

#[cfg(test)]
mod sessions_tests;

pub use market_definitions::{builtin_definition, builtin_definitions, MarketTable};
pub use regions::{aggregate_status, Region, RegionalLabel, RegionalStatus};
pub use session_clock::compute_status;
pub use sessions_model::{
    MarketDefinition, MarketId, NextEvent, SessionHours, SessionState, SessionStatus,
};
pub use sessions_service::{MarketSessionService, MarketSessionServiceTrait};
