//! Read-only snapshots for renderers and reports.
//!
//! A view copies out exactly what a display needs and nothing that could be
//! used to mutate the match.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, Fixed, Vec2Fixed};
use crate::roster::{Team, UnitId, UnitInstance};
use crate::simulation::{GamePhase, MatchOutcome, Simulation};

/// Display state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owning team.
    pub team: Team,
    /// Archetype id, for choosing a model.
    pub archetype_id: String,
    /// Ground-plane position.
    pub position: Vec2Fixed,
    /// Displacement applied on the last tick.
    pub velocity: Vec2Fixed,
    /// Current hit points.
    #[serde(with = "fixed_decimal")]
    pub hp: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_decimal")]
    pub max_hp: Fixed,
    /// Current target.
    pub target: Option<UnitId>,
    /// Whether the unit has died.
    pub is_dead: bool,
    /// Remaining cooldown as a fraction of the full period, in `[0, 1]`.
    #[serde(with = "fixed_decimal")]
    pub cooldown_ratio: Fixed,
}

impl From<&UnitInstance> for UnitView {
    fn from(unit: &UnitInstance) -> Self {
        Self {
            id: unit.id,
            team: unit.team,
            archetype_id: unit.archetype_id.clone(),
            position: unit.position,
            velocity: unit.velocity,
            hp: unit.stats.hp,
            max_hp: unit.stats.max_hp,
            target: unit.target,
            is_dead: unit.is_dead,
            cooldown_ratio: unit.cooldown.ratio(),
        }
    }
}

/// Display state of a whole match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    /// Current phase.
    pub phase: GamePhase,
    /// RED's remaining budget.
    pub red_budget: u32,
    /// BLUE's remaining budget.
    pub blue_budget: u32,
    /// Result, once the match is over.
    pub outcome: Option<MatchOutcome>,
    /// Ticks advanced so far.
    pub tick: u64,
    /// Every unit in placement order, dead ones included.
    pub units: Vec<UnitView>,
}

impl MatchView {
    /// Snapshot a simulation.
    #[must_use]
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            phase: sim.phase(),
            red_budget: sim.budget(Team::Red),
            blue_budget: sim.budget(Team::Blue),
            outcome: sim.outcome(),
            tick: sim.get_tick(),
            units: sim.roster().iter().map(UnitView::from).collect(),
        }
    }

    /// Living units of one team.
    pub fn living(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.units
            .iter()
            .filter(move |u| u.team == team && !u.is_dead)
    }
}
