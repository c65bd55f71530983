//! Combat resolution.
//!
//! Each living unit, in roster order, counts down its cooldown, checks
//! whether its target is in range, and either attacks or asks the movement
//! phase to close the distance. Damage uses a flat defense reduction with a
//! hard floor:
//!
//! ```text
//! damage = max(10, attacker.atk - target.def × 0.05)
//! ```
//!
//! The floor guarantees every attack makes progress, so two heavily armoured
//! units can never stalemate.

use serde::{Deserialize, Serialize};

use crate::catalog::{EffectKind, UnitCatalog};
use crate::math::{fixed_decimal, Fixed, Vec2Fixed};
use crate::roster::{Roster, UnitId};
use crate::targeting::ensure_target;

/// Minimum damage any attack deals.
pub const MIN_DAMAGE: i32 = 10;

/// Defense is divided by this before being subtracted from attack (× 0.05).
pub const DEFENSE_DIVISOR: i64 = 20;

/// Damage one attack deals.
#[must_use]
pub fn calculate_damage(atk: Fixed, def: Fixed) -> Fixed {
    let reduced = atk.saturating_sub(def / DEFENSE_DIVISOR);
    reduced.max(Fixed::from_num(MIN_DAMAGE))
}

/// What the movement phase should do with a unit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementIntent {
    /// Stand still: attacking, cooling down in range, idle or dead.
    Hold,
    /// Walk toward the target's position as seen before this tick's movement.
    Approach(Vec2Fixed),
}

/// Cosmetic record of an attack for the renderer.
///
/// Carries no simulation state; dropping it changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRecord {
    /// Visual kind.
    pub kind: EffectKind,
    /// Attacker position when firing.
    pub from: Vec2Fixed,
    /// Target position when hit.
    pub to: Vec2Fixed,
    /// Attacker archetype colour.
    pub color: String,
}

/// Damage dealt by a single attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Unit that took the damage.
    pub target: UnitId,
    /// Amount subtracted from the target's hp.
    #[serde(with = "fixed_decimal")]
    pub damage: Fixed,
    /// Whether this attack killed the target.
    pub killed: bool,
}

/// Everything the combat phase produced.
#[derive(Debug, Clone, Default)]
pub struct CombatOutcome {
    /// One intent per roster slot.
    pub intents: Vec<MovementIntent>,
    /// Attacks that landed, in order.
    pub damage_events: Vec<DamageEvent>,
    /// Cosmetic effects, in order.
    pub effects: Vec<EffectRecord>,
    /// Units killed this phase, in order of death.
    pub deaths: Vec<UnitId>,
}

/// Run combat for every living unit.
///
/// A unit killed earlier in the pass does not act. A unit whose target was
/// killed earlier in the pass re-acquires before deciding.
pub fn combat_system(roster: &mut Roster, catalog: &UnitCatalog, elapsed: Fixed) -> CombatOutcome {
    let mut outcome = CombatOutcome {
        intents: vec![MovementIntent::Hold; roster.len()],
        ..CombatOutcome::default()
    };

    for slot in 0..roster.len() {
        if !roster.units()[slot].is_alive() {
            continue;
        }

        roster.units_mut()[slot].cooldown.advance(elapsed);

        let Some(target_slot) = ensure_target(roster, slot) else {
            continue;
        };

        let attacker = &roster.units()[slot];
        let target = &roster.units()[target_slot];
        let range_sq = attacker.stats.range.saturating_mul(attacker.stats.range);
        let dist_sq = attacker.position.distance_squared(target.position);

        if dist_sq > range_sq {
            outcome.intents[slot] = MovementIntent::Approach(target.position);
            continue;
        }

        if !attacker.cooldown.is_ready() {
            continue;
        }

        let attacker_id = attacker.id;
        let target_id = target.id;
        let from = attacker.position;
        let to = target.position;
        let damage = calculate_damage(attacker.stats.atk, target.stats.def);
        let effect = catalog.get(&attacker.archetype_id).and_then(|archetype| {
            archetype.effect.map(|kind| EffectRecord {
                kind,
                from,
                to,
                color: archetype.color.clone(),
            })
        });

        roster.units_mut()[slot].cooldown.restart();
        let killed = roster.units_mut()[target_slot].apply_damage(damage);

        tracing::trace!(
            attacker = %attacker_id,
            target = %target_id,
            damage = %damage,
            killed,
            "attack"
        );

        outcome.damage_events.push(DamageEvent {
            attacker: attacker_id,
            target: target_id,
            damage,
            killed,
        });
        outcome.effects.extend(effect);
        if killed {
            outcome.deaths.push(target_id);
        }
    }

    outcome
}
