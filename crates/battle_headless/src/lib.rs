//! Headless battle runner for scenario testing and CI verification.
//!
//! Loads a RON scenario, runs the match with a fixed step and reports the
//! result as JSON. This enables:
//!
//! - **Scenario testing**: Check how a lineup plays out without a renderer
//! - **CI verification**: Automated determinism checks via state hashes
//!
//! # Output
//!
//! - **stdout**: JSON report
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a scenario
//! cargo run -p battle_headless -- run --scenario crates/battle_headless/scenarios/duel.ron
//!
//! # Verify determinism
//! cargo run -p battle_headless -- verify --scenario crates/battle_headless/scenarios/duel.ron --runs 8
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, verify_scenario, RunConfig, RunReport, VerifyReport};
pub use scenario::{Scenario, ScenarioError, UnitPlacement};
