//! # TWAMM Simulator
//!
//! Loads a scenario from TOML, replays it step by step against a pool backed
//! by an in-memory ledger and a manual block clock, and reports every step
//! together with the final pool state.

pub mod config;
pub mod error;
pub mod scenario;

pub use config::{create_example_config, AccountFunding, PoolSettings, SimConfig, Step};
pub use error::{SimError, SimResult};
pub use scenario::{ScenarioRunner, SimReport, StepReport};
