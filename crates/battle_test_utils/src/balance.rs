//! Battle outcome helpers for headless simulation.
//!
//! Runs matches to completion with a fixed step and summarises how they
//! ended, so tests and balance sweeps can compare matchups.

use battle_core::math::Fixed;
use battle_core::roster::Team;
use battle_core::simulation::{GamePhase, MatchOutcome, Simulation};
use serde::{Deserialize, Serialize};

/// Result of a simulated battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    /// How the match ended (`None` on timeout).
    pub outcome: Option<MatchOutcome>,
    /// Simulation ticks elapsed.
    pub ticks: u64,
    /// Starting unit count for RED.
    pub red_units: usize,
    /// Starting unit count for BLUE.
    pub blue_units: usize,
    /// Surviving RED units.
    pub red_survivors: usize,
    /// Surviving BLUE units.
    pub blue_survivors: usize,
    /// Final state hash.
    pub state_hash: u64,
}

impl BattleResult {
    /// The winning team, if any.
    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        self.outcome.and_then(MatchOutcome::winner)
    }

    /// Whether the tick limit ran out first.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Tick `sim` with `step` until the match ends or `max_ticks` have passed.
///
/// The simulation must already be in BATTLE.
pub fn run_to_completion(sim: &mut Simulation, step: Fixed, max_ticks: u64) -> BattleResult {
    let red_units = sim.roster().living(Team::Red).count();
    let blue_units = sim.roster().living(Team::Blue).count();

    let mut ticks = 0;
    while sim.phase() == GamePhase::Battle && ticks < max_ticks {
        sim.tick(step);
        ticks += 1;
    }

    if sim.phase() == GamePhase::Battle {
        tracing::debug!(max_ticks, "battle hit the tick limit");
    }

    BattleResult {
        outcome: sim.outcome(),
        ticks,
        red_units,
        blue_units,
        red_survivors: sim.living_count(Team::Red),
        blue_survivors: sim.living_count(Team::Blue),
        state_hash: sim.state_hash(),
    }
}

/// Statistics for a set of battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Wins for RED.
    pub wins_red: u32,
    /// Wins for BLUE.
    pub wins_blue: u32,
    /// Draws and timeouts.
    pub draws: u32,
    /// Average ticks to resolution.
    pub avg_ticks: f64,
}

impl BattleStats {
    /// Aggregate a set of results.
    #[must_use]
    pub fn from_results(results: &[BattleResult]) -> Self {
        let mut stats = Self::default();
        let mut total_ticks = 0u64;
        for result in results {
            stats.total_battles += 1;
            total_ticks += result.ticks;
            match result.winner() {
                Some(Team::Red) => stats.wins_red += 1,
                Some(Team::Blue) => stats.wins_blue += 1,
                None => stats.draws += 1,
            }
        }
        if stats.total_battles > 0 {
            stats.avg_ticks = total_ticks as f64 / f64::from(stats.total_battles);
        }
        stats
    }

    /// Calculate win rate for RED (0.0 to 1.0).
    pub fn win_rate_red(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.wins_red) / f64::from(self.total_battles)
    }

    /// Calculate win rate for BLUE (0.0 to 1.0).
    pub fn win_rate_blue(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.wins_blue) / f64::from(self.total_battles)
    }

    /// Check if matchup is balanced (within acceptable range).
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_red();
        rate >= min_rate && rate <= max_rate
    }

    /// Pretty RON dump for balance reports.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}
