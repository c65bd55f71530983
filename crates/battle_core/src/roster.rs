//! Live unit instances.
//!
//! The roster is the only mutable collection in a match. Units are kept in
//! placement order, which is also the order every tick phase walks them in;
//! targeting tie-breaks and collision relaxation depend on it.
//!
//! Dead units stay in the roster as inert records so that ids held by other
//! units never point at a reused slot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::UnitArchetype;
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};

/// Unique identifier for a unit within one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Places on the negative-x half.
    Red,
    /// Places on the positive-x half.
    Blue,
}

impl Team {
    /// Both teams, RED first.
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Whether `x` lies on this team's half of the arena.
    ///
    /// The centre line belongs to both halves.
    #[must_use]
    pub fn owns_x(self, x: Fixed) -> bool {
        match self {
            Team::Red => x <= Fixed::ZERO,
            Team::Blue => x >= Fixed::ZERO,
        }
    }
}

/// Live stat snapshot of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Current hit points. May drop below zero on the killing blow.
    #[serde(with = "fixed_decimal")]
    pub hp: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_decimal")]
    pub max_hp: Fixed,
    /// Attack value.
    #[serde(with = "fixed_decimal")]
    pub atk: Fixed,
    /// Defense value.
    #[serde(with = "fixed_decimal")]
    pub def: Fixed,
    /// Attack range.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Attacks per second.
    #[serde(with = "fixed_decimal")]
    pub attack_speed: Fixed,
    /// Arena units per second.
    #[serde(with = "fixed_decimal")]
    pub move_speed: Fixed,
}

/// Attack cooldown in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Seconds left before the next attack. Ready at or below zero.
    #[serde(with = "fixed_decimal")]
    pub current: Fixed,
    /// Full cooldown, `1 / attack_speed`.
    #[serde(with = "fixed_decimal")]
    pub max: Fixed,
}

impl Cooldown {
    /// A ready cooldown with the given period.
    #[must_use]
    pub const fn ready(max: Fixed) -> Self {
        Self {
            current: Fixed::ZERO,
            max,
        }
    }

    /// Count down by `elapsed` seconds while still cooling.
    pub fn advance(&mut self, elapsed: Fixed) {
        if self.current > Fixed::ZERO {
            self.current = self.current.saturating_sub(elapsed);
        }
    }

    /// Whether an attack may fire.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current <= Fixed::ZERO
    }

    /// Restart the cooldown after firing.
    pub fn restart(&mut self) {
        self.current = self.max;
    }

    /// Fraction of the cooldown still remaining, in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        if self.max <= Fixed::ZERO || self.current <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        (self.current / self.max).clamp(Fixed::ZERO, Fixed::ONE)
    }
}

/// A placed unit with live combat state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInstance {
    /// Match-unique id.
    pub id: UnitId,
    /// Archetype this unit was created from.
    pub archetype_id: String,
    /// Owning team.
    pub team: Team,
    /// Ground-plane position.
    pub position: Vec2Fixed,
    /// Displacement applied this tick. Recomputed every tick.
    pub velocity: Vec2Fixed,
    /// Live stats.
    pub stats: UnitStats,
    /// Collision diameter, copied from the archetype.
    #[serde(with = "fixed_decimal")]
    pub footprint: Fixed,
    /// Current target. Must be re-validated before every use.
    pub target: Option<UnitId>,
    /// Set once hp reaches zero; the unit is inert afterwards.
    pub is_dead: bool,
    /// Attack cooldown.
    pub cooldown: Cooldown,
}

impl UnitInstance {
    /// Create a fresh instance of `archetype`.
    #[must_use]
    pub fn new(id: UnitId, archetype: &UnitArchetype, team: Team, position: Vec2Fixed) -> Self {
        let base = &archetype.stats;
        Self {
            id,
            archetype_id: archetype.id.clone(),
            team,
            position,
            velocity: Vec2Fixed::ZERO,
            stats: UnitStats {
                hp: base.max_hp,
                max_hp: base.max_hp,
                atk: base.atk,
                def: base.def,
                range: base.range,
                attack_speed: base.attack_speed,
                move_speed: base.move_speed,
            },
            footprint: archetype.width,
            target: None,
            is_dead: false,
            cooldown: Cooldown::ready(archetype.attack_interval()),
        }
    }

    /// Whether the unit still takes part in the battle.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Subtract `amount` hit points. Returns `true` if this blow killed the unit.
    pub fn apply_damage(&mut self, amount: Fixed) -> bool {
        self.stats.hp -= amount;
        if self.stats.hp <= Fixed::ZERO && !self.is_dead {
            self.is_dead = true;
            self.velocity = Vec2Fixed::ZERO;
            return true;
        }
        false
    }
}

/// All units of a match, in placement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<UnitInstance>,
    next_id: u32,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a new instance of `archetype` and return its id.
    pub fn spawn(&mut self, archetype: &UnitArchetype, team: Team, position: Vec2Fixed) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units
            .push(UnitInstance::new(id, archetype, team, position));
        id
    }

    /// Remove every unit and restart id assignment.
    pub fn clear(&mut self) {
        self.units.clear();
        self.next_id = 1;
    }

    /// Slot index of a unit.
    #[must_use]
    pub fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitInstance> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Get a mutable unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut UnitInstance> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Resolve a weak target reference.
    ///
    /// Returns the slot of `target` only if it exists, is alive, and fights
    /// for the team opposing `team`.
    #[must_use]
    pub fn living_enemy_slot(&self, target: Option<UnitId>, team: Team) -> Option<usize> {
        let slot = self.index_of(target?)?;
        let unit = &self.units[slot];
        (unit.is_alive() && unit.team != team).then_some(slot)
    }

    /// All units in placement order.
    #[must_use]
    pub fn units(&self) -> &[UnitInstance] {
        &self.units
    }

    /// All units, mutable, in placement order.
    pub fn units_mut(&mut self) -> &mut [UnitInstance] {
        &mut self.units
    }

    /// Iterate all units in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitInstance> {
        self.units.iter()
    }

    /// Iterate living units of one team.
    pub fn living(&self, team: Team) -> impl Iterator<Item = &UnitInstance> {
        self.units
            .iter()
            .filter(move |u| u.team == team && u.is_alive())
    }

    /// Number of living units on a team.
    #[must_use]
    pub fn living_count(&self, team: Team) -> usize {
        self.living(team).count()
    }

    /// Total number of units, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;

    fn trooper() -> UnitArchetype {
        UnitCatalog::builtin().get("foot_soldier").unwrap().clone()
    }

    #[test]
    fn test_spawn_copies_archetype_stats() {
        let mut roster = Roster::new();
        let archetype = trooper();
        let id = roster.spawn(&archetype, Team::Red, Vec2Fixed::from_ints(-5, 3));

        assert_eq!(id, UnitId(1));
        let unit = roster.get(id).unwrap();
        assert_eq!(unit.stats.hp, unit.stats.max_hp);
        assert_eq!(unit.stats.max_hp, Fixed::from_num(8000));
        assert_eq!(unit.footprint, archetype.width);
        assert_eq!(unit.target, None);
        assert!(unit.is_alive());
        assert!(unit.cooldown.is_ready());
        assert_eq!(unit.cooldown.max, archetype.attack_interval());
    }

    #[test]
    fn test_ids_are_sequential_and_reset_on_clear() {
        let mut roster = Roster::new();
        let archetype = trooper();
        let a = roster.spawn(&archetype, Team::Red, Vec2Fixed::ZERO);
        let b = roster.spawn(&archetype, Team::Blue, Vec2Fixed::ZERO);
        assert_eq!((a, b), (UnitId(1), UnitId(2)));

        roster.clear();
        assert!(roster.is_empty());
        assert_eq!(
            roster.spawn(&archetype, Team::Red, Vec2Fixed::ZERO),
            UnitId(1)
        );
    }

    #[test]
    fn test_apply_damage_marks_death_once() {
        let mut roster = Roster::new();
        let id = roster.spawn(&trooper(), Team::Red, Vec2Fixed::ZERO);
        let unit = roster.get_mut(id).unwrap();

        assert!(!unit.apply_damage(Fixed::from_num(7990)));
        assert!(unit.is_alive());
        assert!(unit.apply_damage(Fixed::from_num(140)));
        assert!(unit.is_dead);
        // hp is not clamped at zero
        assert_eq!(unit.stats.hp, Fixed::from_num(-130));
        assert!(!unit.apply_damage(Fixed::from_num(10)));
    }

    #[test]
    fn test_living_enemy_slot_rejects_invalid_targets() {
        let mut roster = Roster::new();
        let archetype = trooper();
        let red = roster.spawn(&archetype, Team::Red, Vec2Fixed::ZERO);
        let blue = roster.spawn(&archetype, Team::Blue, Vec2Fixed::ZERO);

        assert_eq!(roster.living_enemy_slot(Some(blue), Team::Red), Some(1));
        assert_eq!(roster.living_enemy_slot(Some(red), Team::Red), None);
        assert_eq!(roster.living_enemy_slot(Some(UnitId(99)), Team::Red), None);
        assert_eq!(roster.living_enemy_slot(None, Team::Red), None);

        roster.get_mut(blue).unwrap().is_dead = true;
        assert_eq!(roster.living_enemy_slot(Some(blue), Team::Red), None);
        assert_eq!(roster.living_count(Team::Blue), 0);
        assert_eq!(roster.living_count(Team::Red), 1);
    }

    #[test]
    fn test_cooldown_advance_and_ratio() {
        let mut cooldown = Cooldown::ready(Fixed::from_num(2));
        assert!(cooldown.is_ready());
        assert_eq!(cooldown.ratio(), Fixed::ZERO);

        cooldown.restart();
        assert_eq!(cooldown.ratio(), Fixed::ONE);

        cooldown.advance(Fixed::from_num(0.5));
        assert_eq!(cooldown.current, Fixed::from_num(1.5));
        assert!(!cooldown.is_ready());

        cooldown.advance(Fixed::from_num(2));
        assert!(cooldown.is_ready());
        assert_eq!(cooldown.ratio(), Fixed::ZERO);

        // A spent cooldown does not keep draining.
        let drained = cooldown.current;
        cooldown.advance(Fixed::from_num(5));
        assert_eq!(cooldown.current, drained);
    }

    #[test]
    fn test_cooldown_ratio_with_tiny_period() {
        let mut cooldown = Cooldown::ready(Fixed::from_bits(1));
        cooldown.restart();
        cooldown.advance(Fixed::MAX);
        assert!(cooldown.is_ready());
        assert_eq!(cooldown.ratio(), Fixed::ZERO);
    }

    #[test]
    fn test_team_halves() {
        assert!(Team::Red.owns_x(Fixed::from_num(-1)));
        assert!(Team::Red.owns_x(Fixed::ZERO));
        assert!(!Team::Red.owns_x(Fixed::from_num(1)));
        assert!(Team::Blue.owns_x(Fixed::ZERO));
        assert!(!Team::Blue.owns_x(Fixed::from_num(-1)));
        assert_eq!(Team::Red.opponent(), Team::Blue);
    }
}
