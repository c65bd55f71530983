//! Target acquisition.
//!
//! Targets are sticky: a unit keeps its target until that target dies or
//! disappears, even if a closer enemy walks past. Only then does it pick the
//! nearest living enemy, with ties going to whichever enemy comes first in
//! roster order.

use crate::math::Fixed;
use crate::roster::{Roster, UnitId};

/// Nearest living enemy of the unit in `slot`, by ground-plane distance.
#[must_use]
pub fn nearest_living_enemy(roster: &Roster, slot: usize) -> Option<UnitId> {
    let units = roster.units();
    let seeker = &units[slot];

    let mut best: Option<(Fixed, UnitId)> = None;
    for enemy in units
        .iter()
        .filter(|u| u.team != seeker.team && u.is_alive())
    {
        let dist_sq = seeker.position.distance_squared(enemy.position);
        // Strict comparison keeps the first of several equidistant enemies.
        if best.map_or(true, |(closest, _)| dist_sq < closest) {
            best = Some((dist_sq, enemy.id));
        }
    }

    best.map(|(_, id)| id)
}

/// Make sure the unit in `slot` holds a valid target.
///
/// Keeps the current target if it is still a living enemy, otherwise
/// acquires the nearest one (or clears the target when none is left).
/// Returns the slot of the resulting target.
pub fn ensure_target(roster: &mut Roster, slot: usize) -> Option<usize> {
    let (current, team) = {
        let unit = &roster.units()[slot];
        (unit.target, unit.team)
    };

    if let Some(target_slot) = roster.living_enemy_slot(current, team) {
        return Some(target_slot);
    }

    let acquired = nearest_living_enemy(roster, slot);
    roster.units_mut()[slot].target = acquired;
    if let Some(id) = acquired {
        tracing::trace!(unit = %roster.units()[slot].id, target = %id, "acquired target");
    }
    roster.living_enemy_slot(acquired, team)
}

/// Run target resolution for every living unit, in roster order.
pub fn targeting_system(roster: &mut Roster) {
    for slot in 0..roster.len() {
        if roster.units()[slot].is_alive() {
            ensure_target(roster, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;
    use crate::math::Vec2Fixed;
    use crate::roster::Team;

    fn roster_with(units: &[(Team, i32, i32)]) -> Roster {
        let catalog = UnitCatalog::builtin();
        let archetype = catalog.get("foot_soldier").unwrap();
        let mut roster = Roster::new();
        for &(team, x, z) in units {
            roster.spawn(archetype, team, Vec2Fixed::from_ints(x, z));
        }
        roster
    }

    #[test]
    fn test_picks_nearest_enemy() {
        let mut roster = roster_with(&[
            (Team::Red, -10, 0),
            (Team::Blue, 20, 0),
            (Team::Blue, 5, 0),
            (Team::Red, -1, 0),
        ]);
        targeting_system(&mut roster);

        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(3)));
        assert_eq!(roster.get(UnitId(2)).unwrap().target, Some(UnitId(4)));
        assert_eq!(roster.get(UnitId(3)).unwrap().target, Some(UnitId(4)));
    }

    #[test]
    fn test_ties_go_to_roster_order() {
        let mut roster = roster_with(&[
            (Team::Red, 0, 0),
            (Team::Blue, 3, 4),
            (Team::Blue, 4, 3),
            (Team::Blue, 0, 5),
        ]);
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(2)));
    }

    #[test]
    fn test_target_is_sticky() {
        let mut roster = roster_with(&[(Team::Red, -10, 0), (Team::Blue, 10, 0)]);
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(2)));

        // A closer enemy arrives later.
        let catalog = UnitCatalog::builtin();
        roster.spawn(
            catalog.get("sniper").unwrap(),
            Team::Blue,
            Vec2Fixed::from_ints(-9, 0),
        );
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(2)));
    }

    #[test]
    fn test_retargets_when_target_dies() {
        let mut roster = roster_with(&[
            (Team::Red, 0, 0),
            (Team::Blue, 2, 0),
            (Team::Blue, 8, 0),
        ]);
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(2)));

        roster.get_mut(UnitId(2)).unwrap().is_dead = true;
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(3)));
    }

    #[test]
    fn test_dead_units_are_never_chosen() {
        let mut roster = roster_with(&[(Team::Red, 0, 0), (Team::Blue, 1, 0), (Team::Blue, 30, 0)]);
        roster.get_mut(UnitId(2)).unwrap().is_dead = true;
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(3)));
        // dead units do not look for targets either
        assert_eq!(roster.get(UnitId(2)).unwrap().target, None);
    }

    #[test]
    fn test_no_enemies_clears_target() {
        let mut roster = roster_with(&[(Team::Red, 0, 0), (Team::Blue, 5, 0)]);
        targeting_system(&mut roster);
        roster.get_mut(UnitId(2)).unwrap().is_dead = true;

        let slot = roster.index_of(UnitId(1)).unwrap();
        assert_eq!(ensure_target(&mut roster, slot), None);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, None);
    }

    #[test]
    fn test_dangling_target_id_is_replaced() {
        let mut roster = roster_with(&[(Team::Red, 0, 0), (Team::Blue, 5, 0)]);
        roster.get_mut(UnitId(1)).unwrap().target = Some(UnitId(42));
        targeting_system(&mut roster);
        assert_eq!(roster.get(UnitId(1)).unwrap().target, Some(UnitId(2)));
    }
}
