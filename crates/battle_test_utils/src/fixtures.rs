//! Test fixtures and helpers.
//!
//! Pre-built archetypes, catalogs and match setups for consistent testing.

use battle_core::catalog::{AttackType, BaseStats, CostRule, EffectKind, UnitArchetype, UnitCatalog};
use battle_core::config::MatchConfig;
use battle_core::math::{Fixed, Vec2Fixed};
use battle_core::roster::Team;
use battle_core::simulation::Simulation;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The step used by tests and the headless runner: 50 ms.
#[must_use]
pub fn default_step() -> Fixed {
    Fixed::ONE / 20
}

/// Position from integer coordinates.
#[must_use]
pub fn pos(x: i32, z: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, z)
}

/// Builder for archetypes with test-friendly defaults.
///
/// Defaults: 100 hp, 10 atk, 0 def, range 4, one attack per second,
/// speed 3, footprint 1, derived cost, no effect.
#[derive(Debug, Clone)]
pub struct ArchetypeBuilder {
    archetype: UnitArchetype,
}

impl ArchetypeBuilder {
    /// Start building an archetype with the given id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            archetype: UnitArchetype {
                id: id.to_string(),
                name: id.to_string(),
                stats: BaseStats {
                    max_hp: fixed(100),
                    atk: fixed(10),
                    def: Fixed::ZERO,
                    range: fixed(4),
                    attack_speed: Fixed::ONE,
                    move_speed: fixed(3),
                },
                attack_type: AttackType::Physical,
                color: "#ffffff".to_string(),
                height: Fixed::ONE,
                width: Fixed::ONE,
                effect: None,
                cost_rule: CostRule::Derived,
            },
        }
    }

    /// Set hp, atk and def.
    #[must_use]
    pub fn stats(mut self, max_hp: i32, atk: i32, def: i32) -> Self {
        self.archetype.stats.max_hp = fixed(max_hp);
        self.archetype.stats.atk = fixed(atk);
        self.archetype.stats.def = fixed(def);
        self
    }

    /// Set attack range.
    #[must_use]
    pub fn range(mut self, range: Fixed) -> Self {
        self.archetype.stats.range = range;
        self
    }

    /// Set attacks per second.
    #[must_use]
    pub fn attack_speed(mut self, attack_speed: Fixed) -> Self {
        self.archetype.stats.attack_speed = attack_speed;
        self
    }

    /// Set movement speed.
    #[must_use]
    pub fn move_speed(mut self, move_speed: Fixed) -> Self {
        self.archetype.stats.move_speed = move_speed;
        self
    }

    /// Set collision footprint.
    #[must_use]
    pub fn width(mut self, width: Fixed) -> Self {
        self.archetype.width = width;
        self
    }

    /// Pin the cost instead of deriving it.
    #[must_use]
    pub fn cost(mut self, cost: u32) -> Self {
        self.archetype.cost_rule = CostRule::Override(cost);
        self
    }

    /// Emit an effect on attack.
    #[must_use]
    pub fn effect(mut self, effect: EffectKind) -> Self {
        self.archetype.effect = Some(effect);
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> UnitArchetype {
        self.archetype
    }
}

/// Catalog of small, fast-dying archetypes so battles finish in a few
/// hundred ticks.
///
/// - `grunt`: 200 hp, 30 atk, range 2, speed 4
/// - `archer`: 120 hp, 25 atk, range 10, speed 3
/// - `wall`: 600 hp, 10 atk, 400 def, range 2, speed 1, footprint 2
#[must_use]
pub fn duel_catalog() -> UnitCatalog {
    UnitCatalog::new(vec![
        ArchetypeBuilder::new("grunt")
            .stats(200, 30, 0)
            .range(fixed(2))
            .move_speed(fixed(4))
            .build(),
        ArchetypeBuilder::new("archer")
            .stats(120, 25, 0)
            .range(fixed(10))
            .effect(EffectKind::Bullet)
            .build(),
        ArchetypeBuilder::new("wall")
            .stats(600, 10, 400)
            .range(fixed(2))
            .move_speed(Fixed::ONE)
            .width(fixed(2))
            .build(),
    ])
    .expect("duel catalog is valid")
}

/// A match in SETUP using `catalog` and default config.
///
/// # Panics
///
/// Panics if the default config is rejected.
#[must_use]
pub fn simulation_with(catalog: UnitCatalog) -> Simulation {
    Simulation::new(MatchConfig::default(), catalog).expect("default config is valid")
}

/// Place every `(team, archetype, position)` and start the battle.
///
/// # Panics
///
/// Panics if any placement or the battle start is rejected.
#[must_use]
pub fn battle(catalog: UnitCatalog, placements: &[(Team, &str, Vec2Fixed)]) -> Simulation {
    let mut sim = simulation_with(catalog);
    for &(team, archetype, position) in placements {
        sim.place_unit(team, archetype, position)
            .unwrap_or_else(|err| panic!("placing {archetype} for {team:?}: {err}"));
    }
    sim.start_battle().expect("both teams placed");
    sim
}

/// Three-on-three skirmish on the duel catalog, started and ready to tick.
#[must_use]
pub fn skirmish() -> Simulation {
    battle(
        duel_catalog(),
        &[
            (Team::Red, "wall", pos(-6, 0)),
            (Team::Red, "grunt", pos(-8, 3)),
            (Team::Red, "archer", pos(-14, -2)),
            (Team::Blue, "grunt", pos(7, -1)),
            (Team::Blue, "grunt", pos(7, 2)),
            (Team::Blue, "archer", pos(15, 0)),
        ],
    )
}
