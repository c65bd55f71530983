//! Movement and collision resolution.
//!
//! Runs after combat so that every attack decision was made on positions
//! from before this tick's movement. The phase is:
//!
//! 1. Steering: approaching units head straight for their target.
//! 2. Integration: `position += velocity`.
//! 3. Boundary clamp.
//! 4. One pairwise separation pass over living units.
//! 5. Boundary clamp again, so separation never pushes a unit off the ground.
//!
//! Separation is a single relaxation pass, not an exact solve. It is O(n²),
//! which is fine for the few dozen units a match holds.

use crate::combat::MovementIntent;
use crate::math::{Fixed, Vec2Fixed};
use crate::roster::Roster;

/// Pairs closer than this are treated as exactly overlapping and skipped.
#[must_use]
pub fn separation_epsilon() -> Fixed {
    Fixed::ONE / Fixed::from_num(10_000)
}

/// Set each unit's velocity for this tick from its movement intent.
///
/// Velocity is a per-tick displacement: direction × move speed × elapsed.
pub fn steering_system(roster: &mut Roster, intents: &[MovementIntent], elapsed: Fixed) {
    for (slot, unit) in roster.units_mut().iter_mut().enumerate() {
        unit.velocity = match intents.get(slot) {
            Some(MovementIntent::Approach(goal)) if unit.is_alive() => {
                let direction = (*goal - unit.position).normalize();
                direction.scale(unit.stats.move_speed.saturating_mul(elapsed))
            }
            _ => Vec2Fixed::ZERO,
        };
    }
}

/// Apply velocities to positions of living units.
pub fn integration_system(roster: &mut Roster) {
    for unit in roster.units_mut().iter_mut().filter(|u| u.is_alive()) {
        unit.position += unit.velocity;
    }
}

/// Clamp living units into `[-bound, bound]` on both axes.
pub fn boundary_system(roster: &mut Roster, bound: Fixed) {
    for unit in roster.units_mut().iter_mut().filter(|u| u.is_alive()) {
        unit.position = unit.position.clamp_axes(bound);
    }
}

/// Push overlapping living units apart.
///
/// For every unordered pair closer than the mean of their footprints, each
/// unit moves away from the other by half the overlap. Pairs are visited in
/// roster order and later pairs see the result of earlier pushes.
pub fn separation_system(roster: &mut Roster) {
    let epsilon = separation_epsilon();
    let units = roster.units_mut();

    for i in 0..units.len() {
        if !units[i].is_alive() {
            continue;
        }
        for j in (i + 1)..units.len() {
            if !units[j].is_alive() {
                continue;
            }

            let delta = units[i].position - units[j].position;
            let dist = delta.length();
            let min_gap = units[i].footprint.saturating_add(units[j].footprint) / 2;

            if dist <= epsilon || dist >= min_gap {
                continue;
            }

            let push = (min_gap - dist) / 2;
            let offset = Vec2Fixed::new(delta.x / dist, delta.z / dist).scale(push);
            units[i].position += offset;
            units[j].position -= offset;
        }
    }
}

/// Run the full movement phase.
pub fn movement_system(
    roster: &mut Roster,
    intents: &[MovementIntent],
    elapsed: Fixed,
    bound: Fixed,
) {
    steering_system(roster, intents, elapsed);
    integration_system(roster);
    boundary_system(roster, bound);
    separation_system(roster);
    boundary_system(roster, bound);
}
