//! Unit archetype catalog.
//!
//! Archetypes are immutable templates. Placing a unit copies the
//! archetype's stats into a fresh [`UnitInstance`](crate::roster::UnitInstance);
//! nothing in the catalog changes once a match is running.
//!
//! # Example RON
//!
//! ```ron
//! [
//!     UnitArchetype(
//!         id: "foot_soldier",
//!         name: "Tactical Trooper",
//!         stats: BaseStats(
//!             max_hp: 8000.0, atk: 60.0, def: 200.0,
//!             range: 4.0, attack_speed: 1.2, move_speed: 4.0,
//!         ),
//!         attack_type: Physical,
//!         color: "#94a3b8",
//!         height: 1.5,
//!         width: 0.8,
//!         effect: Some(Bullet),
//!     ),
//! ]
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, Fixed};

/// Lowest cost a derived price can reach.
pub const MIN_DERIVED_COST: u32 = 50;

/// Highest cost a derived price can reach.
pub const MAX_DERIVED_COST: u32 = 3000;

/// Longest accepted attack range and collision footprint. Their squares
/// stay well inside `I32F32`.
pub const MAX_REACH: i32 = 16384;

/// Fastest accepted attack speed, in attacks per second.
pub const MAX_ATTACK_SPEED: i32 = 1000;

/// Longest accepted gap between attacks, in seconds. Bounds the slowest
/// attack speed at one attack per this many seconds.
pub const MAX_ATTACK_INTERVAL: i32 = 1000;

/// Flavour of an archetype's attack.
///
/// Only the renderer cares about this; damage math ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttackType {
    /// Guns, blades, shells.
    #[default]
    Physical,
    /// Holy light.
    LightMagic,
    /// Void magic.
    DarkMagic,
}

/// Cosmetic effect the renderer plays when an archetype attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Fast tracer.
    Bullet,
    /// Slow arcing rocket.
    Missile,
    /// Instant beam.
    Laser,
    /// Glowing orb.
    Magic,
    /// Dark orb.
    Dark,
}

/// How an archetype's placement cost is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CostRule {
    /// Scored from stats, see [`derive_cost`].
    #[default]
    Derived,
    /// Explicit price, used as-is.
    Override(u32),
}

/// Base combat statistics of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Maximum hit points.
    #[serde(with = "fixed_decimal")]
    pub max_hp: Fixed,
    /// Attack value.
    #[serde(with = "fixed_decimal")]
    pub atk: Fixed,
    /// Defense value.
    #[serde(with = "fixed_decimal")]
    pub def: Fixed,
    /// Attack range in arena units.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Attacks per second.
    #[serde(with = "fixed_decimal")]
    pub attack_speed: Fixed,
    /// Arena units per second.
    #[serde(with = "fixed_decimal")]
    pub move_speed: Fixed,
}

/// Immutable unit template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitArchetype {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base stats copied into every instance.
    pub stats: BaseStats,
    /// Attack flavour (cosmetic).
    #[serde(default)]
    pub attack_type: AttackType,
    /// Display colour as a hex string.
    pub color: String,
    /// Model height (cosmetic).
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Collision footprint diameter.
    #[serde(with = "fixed_decimal")]
    pub width: Fixed,
    /// Effect played on attack, `None` for melee.
    #[serde(default)]
    pub effect: Option<EffectKind>,
    /// Pricing rule.
    #[serde(default)]
    pub cost_rule: CostRule,
}

impl UnitArchetype {
    /// Placement cost of this archetype.
    #[must_use]
    pub fn cost(&self) -> u32 {
        match self.cost_rule {
            CostRule::Derived => derive_cost(&self.stats),
            CostRule::Override(cost) => cost,
        }
    }

    /// Seconds between attacks.
    #[must_use]
    pub fn attack_interval(&self) -> Fixed {
        Fixed::ONE / self.stats.attack_speed
    }

    /// Check the archetype against catalog rules.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidArchetype`] naming the first broken rule.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| GameError::InvalidArchetype {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.stats.max_hp <= Fixed::ZERO {
            return Err(invalid("max_hp must be positive"));
        }
        if self.stats.attack_speed <= Fixed::ZERO {
            return Err(invalid("attack_speed must be positive"));
        }
        let non_negative = [
            ("atk", self.stats.atk),
            ("def", self.stats.def),
            ("range", self.stats.range),
            ("move_speed", self.stats.move_speed),
            ("width", self.width),
        ];
        if let Some((field, _)) = non_negative.iter().find(|(_, v)| *v < Fixed::ZERO) {
            return Err(invalid(&format!("{field} must not be negative")));
        }

        let reach = Fixed::from_num(MAX_REACH);
        if let Some((field, _)) = [("range", self.stats.range), ("width", self.width)]
            .iter()
            .find(|(_, v)| *v > reach)
        {
            return Err(invalid(&format!("{field} must not exceed {MAX_REACH}")));
        }
        if self.stats.attack_speed > Fixed::from_num(MAX_ATTACK_SPEED) {
            return Err(invalid(&format!(
                "attack_speed must not exceed {MAX_ATTACK_SPEED}"
            )));
        }
        if self.stats.attack_speed.saturating_mul_int(i64::from(MAX_ATTACK_INTERVAL)) < Fixed::ONE {
            return Err(invalid(&format!(
                "attack_speed must allow an attack every {MAX_ATTACK_INTERVAL} seconds"
            )));
        }
        Ok(())
    }
}

/// Price an archetype from its stats.
///
/// ```text
/// score = (max_hp × 0.2 + atk × 2.5 + def × 1.5) / 10
/// cost  = floor(clamp(score, 50, 3000))
/// ```
#[must_use]
pub fn derive_cost(stats: &BaseStats) -> u32 {
    let hp_score = stats.max_hp / 5;
    let atk_score = stats.atk.saturating_mul_int(5) / 2;
    let def_score = stats.def.saturating_mul_int(3) / 2;
    let score = hp_score.saturating_add(atk_score).saturating_add(def_score) / 10;

    let clamped = score.clamp(
        Fixed::from_num(MIN_DERIVED_COST),
        Fixed::from_num(MAX_DERIVED_COST),
    );
    clamped.floor().to_num::<u32>()
}

/// Ordered table of archetypes.
///
/// Iteration order is the order archetypes were defined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCatalog {
    archetypes: Vec<UnitArchetype>,
}

impl UnitCatalog {
    /// Build a catalog from archetype definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if any archetype is invalid or an id repeats.
    pub fn new(archetypes: Vec<UnitArchetype>) -> Result<Self> {
        let mut seen = HashSet::new();
        for archetype in &archetypes {
            archetype.validate()?;
            if !seen.insert(archetype.id.as_str()) {
                return Err(GameError::InvalidArchetype {
                    id: archetype.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(Self { archetypes })
    }

    /// Parse a catalog from a RON list of archetypes.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON or fails validation.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let archetypes: Vec<UnitArchetype> = ron::from_str(ron)?;
        Self::new(archetypes)
    }

    /// The six archetypes the game ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let archetypes = BUILTIN.iter().map(BuiltinRow::to_archetype).collect();
        Self { archetypes }
    }

    /// Look up an archetype by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UnitArchetype> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    /// Iterate archetypes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.archetypes.iter()
    }

    /// Number of archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Compact row for the built-in table. Decimal stats are in tenths.
struct BuiltinRow {
    id: &'static str,
    name: &'static str,
    max_hp: i32,
    atk: i32,
    def: i32,
    range_tenths: i32,
    attack_speed_tenths: i32,
    move_speed_tenths: i32,
    attack_type: AttackType,
    color: &'static str,
    height_tenths: i32,
    width_tenths: i32,
    effect: Option<EffectKind>,
}

impl BuiltinRow {
    fn to_archetype(&self) -> UnitArchetype {
        let tenths = |n: i32| Fixed::from_num(n) / 10;
        UnitArchetype {
            id: self.id.to_string(),
            name: self.name.to_string(),
            stats: BaseStats {
                max_hp: Fixed::from_num(self.max_hp),
                atk: Fixed::from_num(self.atk),
                def: Fixed::from_num(self.def),
                range: tenths(self.range_tenths),
                attack_speed: tenths(self.attack_speed_tenths),
                move_speed: tenths(self.move_speed_tenths),
            },
            attack_type: self.attack_type,
            color: self.color.to_string(),
            height: tenths(self.height_tenths),
            width: tenths(self.width_tenths),
            effect: self.effect,
            cost_rule: CostRule::Derived,
        }
    }
}

const BUILTIN: [BuiltinRow; 6] = [
    BuiltinRow {
        id: "foot_soldier",
        name: "Tactical Trooper",
        max_hp: 8000,
        atk: 60,
        def: 200,
        range_tenths: 40,
        attack_speed_tenths: 12,
        move_speed_tenths: 40,
        attack_type: AttackType::Physical,
        color: "#94a3b8",
        height_tenths: 15,
        width_tenths: 8,
        effect: Some(EffectKind::Bullet),
    },
    BuiltinRow {
        id: "heavy_tank",
        name: "Titan Mech",
        max_hp: 50000,
        atk: 150,
        def: 1500,
        range_tenths: 60,
        attack_speed_tenths: 5,
        move_speed_tenths: 15,
        attack_type: AttackType::Physical,
        color: "#334155",
        height_tenths: 25,
        width_tenths: 20,
        effect: Some(EffectKind::Missile),
    },
    BuiltinRow {
        id: "berserker",
        name: "Crimson Slayer",
        max_hp: 15000,
        atk: 400,
        def: 100,
        range_tenths: 15,
        attack_speed_tenths: 18,
        move_speed_tenths: 60,
        attack_type: AttackType::Physical,
        color: "#ef4444",
        height_tenths: 16,
        width_tenths: 10,
        effect: None,
    },
    BuiltinRow {
        id: "paladin",
        name: "Solar Guardian",
        max_hp: 25000,
        atk: 150,
        def: 800,
        range_tenths: 30,
        attack_speed_tenths: 10,
        move_speed_tenths: 35,
        attack_type: AttackType::LightMagic,
        color: "#facc15",
        height_tenths: 19,
        width_tenths: 12,
        effect: Some(EffectKind::Magic),
    },
    BuiltinRow {
        id: "dark_mage",
        name: "Void Sorcerer",
        max_hp: 6000,
        atk: 450,
        def: 50,
        range_tenths: 100,
        attack_speed_tenths: 7,
        move_speed_tenths: 30,
        attack_type: AttackType::DarkMagic,
        color: "#7e22ce",
        height_tenths: 14,
        width_tenths: 7,
        effect: Some(EffectKind::Dark),
    },
    BuiltinRow {
        id: "sniper",
        name: "Ghost Sniper",
        max_hp: 9000,
        atk: 350,
        def: 150,
        range_tenths: 180,
        attack_speed_tenths: 6,
        move_speed_tenths: 50,
        attack_type: AttackType::Physical,
        color: "#166534",
        height_tenths: 16,
        width_tenths: 6,
        effect: Some(EffectKind::Laser),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(max_hp: i32, atk: i32, def: i32) -> BaseStats {
        BaseStats {
            max_hp: Fixed::from_num(max_hp),
            atk: Fixed::from_num(atk),
            def: Fixed::from_num(def),
            range: Fixed::from_num(4),
            attack_speed: Fixed::ONE,
            move_speed: Fixed::from_num(3),
        }
    }

    #[test]
    fn test_builtin_costs() {
        let catalog = UnitCatalog::builtin();
        let cost = |id: &str| catalog.get(id).unwrap().cost();

        assert_eq!(cost("foot_soldier"), 205);
        assert_eq!(cost("heavy_tank"), 1262);
        assert_eq!(cost("berserker"), 415);
        assert_eq!(cost("paladin"), 657);
        assert_eq!(cost("dark_mage"), 240);
        assert_eq!(cost("sniper"), 290);
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = UnitCatalog::builtin();
        let rebuilt = UnitCatalog::new(catalog.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt, catalog);
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn test_builtin_catalog_order() {
        let ids: Vec<_> = UnitCatalog::builtin().iter().map(|a| a.id.clone()).collect();
        assert_eq!(
            ids,
            ["foot_soldier", "heavy_tank", "berserker", "paladin", "dark_mage", "sniper"]
        );
    }

    #[test]
    fn test_derived_cost_clamps() {
        assert_eq!(derive_cost(&stats(10, 1, 1)), MIN_DERIVED_COST);
        assert_eq!(derive_cost(&stats(1_000_000, 500, 500)), MAX_DERIVED_COST);
    }

    #[test]
    fn test_derived_cost_is_monotonic_in_each_stat() {
        let base = derive_cost(&stats(20000, 200, 400));
        assert!(derive_cost(&stats(21000, 200, 400)) >= base);
        assert!(derive_cost(&stats(20000, 260, 400)) >= base);
        assert!(derive_cost(&stats(20000, 200, 480)) >= base);
    }

    #[test]
    fn test_cost_override() {
        let mut archetype = UnitCatalog::builtin().get("heavy_tank").unwrap().clone();
        archetype.cost_rule = CostRule::Override(3800);
        assert_eq!(archetype.cost(), 3800);
    }

    #[test]
    fn test_attack_interval() {
        let catalog = UnitCatalog::builtin();
        let tank = catalog.get("heavy_tank").unwrap();
        assert_eq!(tank.attack_interval(), Fixed::from_num(2));
    }

    #[test]
    fn test_validate_rejects_zero_attack_speed() {
        let mut archetype = UnitCatalog::builtin().get("sniper").unwrap().clone();
        archetype.stats.attack_speed = Fixed::ZERO;
        assert!(matches!(
            archetype.validate(),
            Err(GameError::InvalidArchetype { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_width() {
        let mut archetype = UnitCatalog::builtin().get("sniper").unwrap().clone();
        archetype.width = Fixed::from_num(-1);
        let err = archetype.validate().unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_validate_rejects_excessive_range() {
        let mut archetype = UnitCatalog::builtin().get("sniper").unwrap().clone();
        archetype.stats.range = Fixed::from_num(50_000);
        let err = archetype.validate().unwrap_err();
        assert!(err.to_string().contains("range"));

        archetype.stats.range = Fixed::from_num(MAX_REACH);
        assert!(archetype.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_excessive_width() {
        let mut archetype = UnitCatalog::builtin().get("heavy_tank").unwrap().clone();
        archetype.width = Fixed::from_num(MAX_REACH + 1);
        let err = archetype.validate().unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn test_validate_bounds_attack_speed() {
        let mut archetype = UnitCatalog::builtin().get("dark_mage").unwrap().clone();

        archetype.stats.attack_speed = Fixed::from_bits(1);
        assert!(archetype.validate().is_err());

        archetype.stats.attack_speed = Fixed::from_num(MAX_ATTACK_SPEED + 1);
        assert!(archetype.validate().is_err());

        archetype.stats.attack_speed = Fixed::from_num(0.01);
        assert!(archetype.validate().is_ok());
        assert_eq!(archetype.attack_interval().round(), Fixed::from_num(100));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let catalog = UnitCatalog::builtin();
        let dup = catalog.get("paladin").unwrap().clone();
        let result = UnitCatalog::new(vec![dup.clone(), dup]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_ron_str() {
        let ron = r##"[
            UnitArchetype(
                id: "pikeman",
                name: "Pikeman",
                stats: BaseStats(
                    max_hp: 5000.0, atk: 80.0, def: 100.0,
                    range: 2.5, attack_speed: 1.5, move_speed: 3.0,
                ),
                color: "#ffffff",
                height: 1.7,
                width: 0.9,
                cost_rule: Override(120),
            ),
        ]"##;
        let catalog = UnitCatalog::from_ron_str(ron).unwrap();
        let pikeman = catalog.get("pikeman").unwrap();
        assert_eq!(pikeman.cost(), 120);
        assert_eq!(pikeman.attack_type, AttackType::Physical);
        assert_eq!(pikeman.effect, None);
        assert_eq!(pikeman.stats.range, Fixed::from_num(2.5));
    }

    #[test]
    fn test_from_ron_str_reports_parse_errors() {
        let err = UnitCatalog::from_ron_str("[ NotAnArchetype ]").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { .. }));
    }
}
