//! Match controller and tick pipeline.
//!
//! A [`Simulation`] owns everything one match needs: the catalog, the match
//! config, the roster, both budgets and the phase state machine:
//!
//! ```text
//! SETUP --start_battle--> BATTLE --(a team is wiped out)--> GAME_OVER
//!   ^                                                          |
//!   +------------------------- reset --------------------------+
//! ```
//!
//! # Determinism
//!
//! All state is fixed-point and every phase walks the roster in placement
//! order, so two simulations given the same placements and the same
//! sequence of `elapsed` values stay bit-identical. The clock is supplied by
//! the caller; a fixed-step driver is a legitimate substitute for a
//! rendering loop.
//!
//! # Example
//!
//! ```
//! use battle_core::prelude::*;
//!
//! let mut sim = Simulation::default();
//! sim.place_unit(Team::Red, "foot_soldier", Vec2Fixed::from_ints(-5, 0)).unwrap();
//! sim.place_unit(Team::Blue, "foot_soldier", Vec2Fixed::from_ints(5, 0)).unwrap();
//! sim.start_battle().unwrap();
//!
//! let step = Fixed::from_num(0.05);
//! while sim.phase() == GamePhase::Battle {
//!     sim.tick(step);
//! }
//! assert!(sim.outcome().is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::catalog::UnitCatalog;
use crate::combat::{combat_system, DamageEvent, EffectRecord};
use crate::config::MatchConfig;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::movement_system;
use crate::roster::{Roster, Team, UnitId};
use crate::targeting::targeting_system;
use crate::view::MatchView;

/// Phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Teams are placing units.
    Setup,
    /// The simulation is running.
    Battle,
    /// A result has been recorded. Terminal until reset.
    GameOver,
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One team still has living units.
    Victory(Team),
    /// Both teams were wiped out on the same tick.
    Draw,
}

impl MatchOutcome {
    /// The winning team, if there is one.
    #[must_use]
    pub const fn winner(self) -> Option<Team> {
        match self {
            MatchOutcome::Victory(team) => Some(team),
            MatchOutcome::Draw => None,
        }
    }
}

/// Events generated during a simulation tick.
///
/// Advisory output for renderers and logs. The simulation never reads
/// them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Cosmetic attack effects, in firing order.
    pub effects: Vec<EffectRecord>,
    /// Attacks that landed, in firing order.
    pub damage_events: Vec<DamageEvent>,
    /// Units that died this tick.
    pub deaths: Vec<UnitId>,
    /// Set on the tick the match ended.
    pub outcome: Option<MatchOutcome>,
}

impl TickEvents {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
            && self.damage_events.is_empty()
            && self.deaths.is_empty()
            && self.outcome.is_none()
    }
}

/// One autobattler match.
///
/// # Tick order
///
/// 1. **Targeting** - every living unit validates or re-acquires its target
/// 2. **Combat** - cooldowns, attacks and approach intents
/// 3. **Movement** - steering, integration, clamping and separation
/// 4. **Win check** - at most once per match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    config: MatchConfig,
    catalog: UnitCatalog,
    roster: Roster,
    phase: GamePhase,
    red_budget: u32,
    blue_budget: u32,
    outcome: Option<MatchOutcome>,
    tick: u64,
}

impl Simulation {
    /// Create a match in SETUP with full budgets.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the config fails validation.
    pub fn new(config: MatchConfig, catalog: UnitCatalog) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            red_budget: config.initial_budget,
            blue_budget: config.initial_budget,
            config,
            catalog,
            roster: Roster::new(),
            phase: GamePhase::Setup,
            outcome: None,
            tick: 0,
        })
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Remaining placement budget of a team.
    #[must_use]
    pub const fn budget(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red_budget,
            Team::Blue => self.blue_budget,
        }
    }

    fn budget_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Red => &mut self.red_budget,
            Team::Blue => &mut self.blue_budget,
        }
    }

    /// Result of the match, once it is over.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Winning team. `None` while the match runs and on a draw.
    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        self.outcome.and_then(MatchOutcome::winner)
    }

    /// Number of ticks that advanced the battle.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// All placed units.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Archetypes available for placement.
    #[must_use]
    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Match settings.
    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Living units of a team.
    #[must_use]
    pub fn living_count(&self, team: Team) -> usize {
        self.roster.living_count(team)
    }

    /// Read-only snapshot for display.
    #[must_use]
    pub fn view(&self) -> MatchView {
        MatchView::capture(self)
    }

    /// Place a unit for `team`.
    ///
    /// The position must lie inside the arena and on the team's own half.
    /// It is clamped into the playable area before the unit is created.
    ///
    /// # Errors
    ///
    /// Rejects the placement, leaving the match untouched, when the match
    /// is not in SETUP, the archetype is unknown, the position is outside
    /// the arena or on the wrong half, or the team cannot afford the unit.
    pub fn place_unit(
        &mut self,
        team: Team,
        archetype_id: &str,
        position: Vec2Fixed,
    ) -> Result<UnitId> {
        let result = self.try_place(team, archetype_id, position);
        match &result {
            Ok(id) => tracing::debug!(
                unit = %id,
                ?team,
                archetype = archetype_id,
                budget = self.budget(team),
                "placed unit"
            ),
            Err(err) => tracing::debug!(?team, archetype = archetype_id, %err, "placement rejected"),
        }
        result
    }

    fn try_place(&mut self, team: Team, archetype_id: &str, position: Vec2Fixed) -> Result<UnitId> {
        self.expect_phase(GamePhase::Setup)?;

        let archetype = self
            .catalog
            .get(archetype_id)
            .ok_or_else(|| GameError::UnknownArchetype(archetype_id.to_string()))?;

        if !position.within(self.config.arena_half_extent) {
            return Err(GameError::OutOfBounds);
        }
        if !team.owns_x(position.x) {
            return Err(GameError::WrongSide { team });
        }

        let cost = archetype.cost();
        let available = self.budget(team);
        if available < cost {
            return Err(GameError::InsufficientBudget {
                team,
                required: cost,
                available,
            });
        }

        let position = position.clamp_axes(self.config.playable_bound());
        let id = self.roster.spawn(archetype, team, position);
        *self.budget_mut(team) -= cost;
        Ok(id)
    }

    /// Leave SETUP and start the battle.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::WrongPhase`] outside SETUP and
    /// [`GameError::TeamsNotReady`] unless both teams field a living unit.
    pub fn start_battle(&mut self) -> Result<()> {
        self.expect_phase(GamePhase::Setup)?;

        let red = self.living_count(Team::Red);
        let blue = self.living_count(Team::Blue);
        if red == 0 || blue == 0 {
            tracing::debug!(red, blue, "battle start rejected");
            return Err(GameError::TeamsNotReady { red, blue });
        }

        self.phase = GamePhase::Battle;
        tracing::info!(red, blue, "battle started");
        Ok(())
    }

    /// Advance the battle by `elapsed` seconds.
    ///
    /// Does nothing outside BATTLE. A non-positive `elapsed` means no time
    /// passed: nothing fires or moves and the tick counter stays put.
    pub fn tick(&mut self, elapsed: Fixed) -> TickEvents {
        if self.phase != GamePhase::Battle || elapsed <= Fixed::ZERO {
            return TickEvents::default();
        }

        // 1. Targeting
        targeting_system(&mut self.roster);

        // 2. Combat, on positions from before this tick's movement
        let combat = combat_system(&mut self.roster, &self.catalog, elapsed);

        // 3. Movement and collision
        movement_system(
            &mut self.roster,
            &combat.intents,
            elapsed,
            self.config.playable_bound(),
        );

        self.tick += 1;

        // 4. Win check
        let outcome = self.check_win_condition();

        #[cfg(feature = "debug-validation")]
        self.assert_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        TickEvents {
            effects: combat.effects,
            damage_events: combat.damage_events,
            deaths: combat.deaths,
            outcome,
        }
    }

    fn check_win_condition(&mut self) -> Option<MatchOutcome> {
        let red = self.living_count(Team::Red);
        let blue = self.living_count(Team::Blue);
        let outcome = match (red, blue) {
            (0, 0) => MatchOutcome::Draw,
            (0, _) => MatchOutcome::Victory(Team::Blue),
            (_, 0) => MatchOutcome::Victory(Team::Red),
            _ => return None,
        };

        self.phase = GamePhase::GameOver;
        self.outcome = Some(outcome);
        tracing::info!(tick = self.tick, ?outcome, "battle over");
        Some(outcome)
    }

    /// Return to SETUP with an empty roster and full budgets.
    ///
    /// The catalog and config are kept.
    pub fn reset(&mut self) {
        self.roster.clear();
        self.phase = GamePhase::Setup;
        self.red_budget = self.config.initial_budget;
        self.blue_budget = self.config.initial_budget;
        self.outcome = None;
        self.tick = 0;
        tracing::debug!("match reset");
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Calculate a hash of the current match state.
    ///
    /// Two simulations with identical state produce identical hashes, which
    /// is what the determinism harness compares.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.red_budget.hash(&mut hasher);
        self.blue_budget.hash(&mut hasher);

        self.roster.len().hash(&mut hasher);
        for unit in self.roster.iter() {
            unit.id.hash(&mut hasher);
            unit.team.hash(&mut hasher);
            unit.archetype_id.hash(&mut hasher);

            unit.position.x.to_bits().hash(&mut hasher);
            unit.position.z.to_bits().hash(&mut hasher);
            unit.velocity.x.to_bits().hash(&mut hasher);
            unit.velocity.z.to_bits().hash(&mut hasher);

            unit.stats.hp.to_bits().hash(&mut hasher);
            unit.cooldown.current.to_bits().hash(&mut hasher);
            unit.target.hash(&mut hasher);
            unit.is_dead.hash(&mut hasher);
        }

        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn assert_invariants(&self) {
        let bound = self.config.playable_bound();
        for unit in self.roster.iter() {
            assert!(
                unit.stats.hp <= unit.stats.max_hp,
                "unit {} has hp above max",
                unit.id
            );
            assert!(
                unit.cooldown.current <= unit.cooldown.max,
                "unit {} cooldown exceeds its period",
                unit.id
            );
            if unit.is_alive() {
                assert!(
                    unit.position.within(bound),
                    "unit {} left the playable area",
                    unit.id
                );
            }
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            config: MatchConfig::default(),
            catalog: UnitCatalog::builtin(),
            roster: Roster::new(),
            phase: GamePhase::Setup,
            red_budget: crate::config::INITIAL_BUDGET,
            blue_budget: crate::config::INITIAL_BUDGET,
            outcome: None,
            tick: 0,
        }
    }
}
