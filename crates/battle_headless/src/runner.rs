//! Fixed-step battle runner.
//!
//! Drives a scenario's match with a constant step until it ends or hits the
//! tick limit, and summarises the result as a serializable report.

use battle_core::math::Fixed;
use battle_core::roster::{Team, UnitId};
use battle_core::simulation::{GamePhase, MatchOutcome};
use battle_core::view::MatchView;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scenario::{Scenario, ScenarioError};

/// Default step: 50 ms.
pub const DEFAULT_STEP_MS: u32 = 50;

/// Default tick limit: 20 000 ticks of 50 ms is a little over 16 minutes.
pub const DEFAULT_MAX_TICKS: u64 = 20_000;

/// How to drive a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Milliseconds of simulated time per tick.
    pub step_ms: u32,
    /// Give up after this many ticks.
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_STEP_MS,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl RunConfig {
    /// The step as seconds.
    #[must_use]
    pub fn step(&self) -> Fixed {
        // whole seconds first so large millis cannot overflow the integer part
        Fixed::from_num(self.step_ms / 1000) + Fixed::from_num(self.step_ms % 1000) / 1000
    }
}

/// A unit death and the tick it happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    /// Tick on which the unit died.
    pub tick: u64,
    /// The unit.
    pub unit: UnitId,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// How the match ended, `None` on timeout.
    pub outcome: Option<MatchOutcome>,
    /// Winning team, if any.
    pub winner: Option<Team>,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub simulated_seconds: f64,
    /// Attacks that landed.
    pub attacks: usize,
    /// Cosmetic effects emitted.
    pub effects: usize,
    /// Deaths in order.
    pub deaths: Vec<DeathRecord>,
    /// Final state hash.
    pub state_hash: u64,
    /// Final snapshot.
    pub final_state: MatchView,
}

impl RunReport {
    /// Whether the run ended without a result.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Run a scenario to completion.
pub fn run_scenario(scenario: &Scenario, config: &RunConfig) -> Result<RunReport, ScenarioError> {
    let mut sim = scenario.build_simulation()?;
    let step = config.step();

    tracing::info!(
        scenario = %scenario.name,
        step_ms = config.step_ms,
        max_ticks = config.max_ticks,
        "running scenario"
    );

    let mut attacks = 0;
    let mut effects = 0;
    let mut deaths = Vec::new();

    // a zero step never advances the match
    while step > Fixed::ZERO
        && sim.phase() == GamePhase::Battle
        && sim.get_tick() < config.max_ticks
    {
        let events = sim.tick(step);
        attacks += events.damage_events.len();
        effects += events.effects.len();
        deaths.extend(events.deaths.iter().map(|&unit| DeathRecord {
            tick: sim.get_tick(),
            unit,
        }));
    }

    if sim.phase() == GamePhase::Battle {
        tracing::warn!(ticks = sim.get_tick(), "scenario hit the tick limit");
    } else {
        tracing::info!(ticks = sim.get_tick(), outcome = ?sim.outcome(), "scenario finished");
    }

    Ok(RunReport {
        scenario: scenario.name.clone(),
        outcome: sim.outcome(),
        winner: sim.winner(),
        ticks: sim.get_tick(),
        simulated_seconds: sim.get_tick() as f64 * f64::from(config.step_ms) / 1000.0,
        attacks,
        effects,
        deaths,
        state_hash: sim.state_hash(),
        final_state: sim.view(),
    })
}

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Final hash of every run.
    pub hashes: Vec<u64>,
    /// Whether every run agreed.
    pub deterministic: bool,
}

/// Fewest runs a determinism check compares.
pub const MIN_VERIFY_RUNS: u32 = 2;

/// Run a scenario `runs` times in parallel and compare final hashes.
///
/// At least [`MIN_VERIFY_RUNS`] runs are made, since fewer would agree
/// trivially.
pub fn verify_scenario(
    scenario: &Scenario,
    config: &RunConfig,
    runs: u32,
) -> Result<VerifyReport, ScenarioError> {
    let runs = runs.max(MIN_VERIFY_RUNS);
    let hashes = (0..runs)
        .into_par_iter()
        .map(|run| -> Result<u64, ScenarioError> {
            let report = run_scenario(scenario, config)?;
            tracing::debug!(run, hash = report.state_hash, ticks = report.ticks, "run complete");
            Ok(report.state_hash)
        })
        .collect::<Result<Vec<u64>, ScenarioError>>()?;

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    Ok(VerifyReport {
        scenario: scenario.name.clone(),
        hashes,
        deterministic,
    })
}
