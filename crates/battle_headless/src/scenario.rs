//! Scenario loading and configuration.
//!
//! Scenarios describe a complete match setup for headless runs: the match
//! config, an optional custom catalog and every unit placement.
//!
//! ```ron
//! Scenario(
//!     name: "Mirror duel",
//!     placements: [
//!         (team: Red, archetype: "foot_soldier", position: (x: -8.0, z: 0.0)),
//!         (team: Blue, archetype: "foot_soldier", position: (x: 8.0, z: 0.0)),
//!     ],
//! )
//! ```

use std::path::Path;

use battle_core::catalog::{UnitArchetype, UnitCatalog};
use battle_core::config::MatchConfig;
use battle_core::error::GameError;
use battle_core::math::Vec2Fixed;
use battle_core::roster::Team;
use battle_core::simulation::Simulation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The match rejected the scenario's config, catalog or a placement.
    #[error("Scenario rejected: {0}")]
    Rejected(#[from] GameError),
}

/// One unit to place before the battle starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Owning team.
    pub team: Team,
    /// Archetype id in the scenario's catalog.
    pub archetype: String,
    /// Where to place it.
    pub position: Vec2Fixed,
}

impl UnitPlacement {
    /// Create a placement at integer coordinates.
    #[must_use]
    pub fn new(team: Team, archetype: &str, x: i32, z: i32) -> Self {
        Self {
            team,
            archetype: archetype.to_string(),
            position: Vec2Fixed::from_ints(x, z),
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Match settings.
    #[serde(default)]
    pub config: MatchConfig,
    /// Custom archetypes. The built-in catalog is used when absent.
    #[serde(default)]
    pub catalog: Option<Vec<UnitArchetype>>,
    /// Units to place, in placement order.
    pub placements: Vec<UnitPlacement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::mixed_skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Built-in four-on-four skirmish using every built-in archetype.
    #[must_use]
    pub fn mixed_skirmish() -> Self {
        Self {
            name: "Mixed skirmish".to_string(),
            description: "Front line, bruiser and ranged support on each side".to_string(),
            config: MatchConfig::default(),
            catalog: None,
            placements: vec![
                UnitPlacement::new(Team::Red, "heavy_tank", -10, 0),
                UnitPlacement::new(Team::Red, "berserker", -12, 6),
                UnitPlacement::new(Team::Red, "dark_mage", -20, -4),
                UnitPlacement::new(Team::Red, "foot_soldier", -14, -8),
                UnitPlacement::new(Team::Blue, "paladin", 10, 0),
                UnitPlacement::new(Team::Blue, "paladin", 10, 5),
                UnitPlacement::new(Team::Blue, "sniper", 25, 0),
                UnitPlacement::new(Team::Blue, "foot_soldier", 14, -8),
            ],
        }
    }

    /// The catalog this scenario places from.
    pub fn catalog(&self) -> Result<UnitCatalog, ScenarioError> {
        match &self.catalog {
            Some(archetypes) => Ok(UnitCatalog::new(archetypes.clone())?),
            None => Ok(UnitCatalog::builtin()),
        }
    }

    /// Build the match, place every unit and start the battle.
    ///
    /// Fails on the first rejected placement rather than skipping it, so a
    /// scenario always runs exactly as written.
    pub fn build_simulation(&self) -> Result<Simulation, ScenarioError> {
        let mut sim = Simulation::new(self.config, self.catalog()?)?;
        for placement in &self.placements {
            sim.place_unit(placement.team, &placement.archetype, placement.position)?;
        }
        sim.start_battle()?;
        tracing::debug!(
            scenario = %self.name,
            units = self.placements.len(),
            red_budget = sim.budget(Team::Red),
            blue_budget = sim.budget(Team::Blue),
            "scenario ready"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::simulation::GamePhase;
    use std::io::Write;

    const DUEL: &str = r#"
        Scenario(
            name: "Mirror duel",
            placements: [
                (team: Red, archetype: "foot_soldier", position: (x: -8.0, z: 0.0)),
                (team: Blue, archetype: "foot_soldier", position: (x: 8.0, z: 0.0)),
            ],
        )
    "#;

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_ron_str(DUEL).unwrap();
        assert_eq!(scenario.name, "Mirror duel");
        assert_eq!(scenario.config, MatchConfig::default());
        assert!(scenario.catalog.is_none());
        assert_eq!(
            scenario.placements[1],
            UnitPlacement::new(Team::Blue, "foot_soldier", 8, 0)
        );
    }

    #[test]
    fn test_build_simulation_starts_battle() {
        let sim = Scenario::from_ron_str(DUEL)
            .unwrap()
            .build_simulation()
            .unwrap();
        assert_eq!(sim.phase(), GamePhase::Battle);
        assert_eq!(sim.roster().len(), 2);
    }

    #[test]
    fn test_custom_catalog_and_config() {
        let scenario = Scenario::from_ron_str(
            r##"
            Scenario(
                name: "Tiny arena",
                config: (initial_budget: 100, arena_half_extent: 10.0, boundary_margin: 1.0),
                catalog: Some([
                    (
                        id: "pawn",
                        name: "Pawn",
                        stats: (max_hp: 50.0, atk: 10.0, def: 0.0, range: 1.5,
                                attack_speed: 1.0, move_speed: 2.0),
                        color: "#888888",
                        height: 1.0,
                        width: 0.5,
                        cost_rule: Override(40),
                    ),
                ]),
                placements: [
                    (team: Red, archetype: "pawn", position: (x: -9.5, z: 0.0)),
                    (team: Blue, archetype: "pawn", position: (x: 3.0, z: 0.0)),
                ],
            )
            "##,
        )
        .unwrap();

        let sim = scenario.build_simulation().unwrap();
        assert_eq!(sim.budget(Team::Red), 60);
        // clamped into the playable area
        assert_eq!(
            sim.roster().units()[0].position,
            Vec2Fixed::from_ints(-9, 0)
        );
    }

    #[test]
    fn test_rejected_placement_surfaces_error() {
        let mut scenario = Scenario::from_ron_str(DUEL).unwrap();
        scenario.placements[0].position = Vec2Fixed::from_ints(5, 0);
        assert!(matches!(
            scenario.build_simulation(),
            Err(ScenarioError::Rejected(GameError::WrongSide { team: Team::Red }))
        ));
    }

    #[test]
    fn test_one_sided_scenario_cannot_start() {
        let mut scenario = Scenario::from_ron_str(DUEL).unwrap();
        scenario.placements.pop();
        assert!(matches!(
            scenario.build_simulation(),
            Err(ScenarioError::Rejected(GameError::TeamsNotReady { red: 1, blue: 0 }))
        ));
    }

    #[test]
    fn test_oversized_arena_rejected() {
        let scenario = Scenario::from_ron_str(
            r#"
            Scenario(
                name: "Endless plain",
                config: (arena_half_extent: 100000.0, boundary_margin: 2.0),
                placements: [
                    (team: Red, archetype: "foot_soldier", position: (x: -50000.0, z: 0.0)),
                    (team: Blue, archetype: "foot_soldier", position: (x: 50000.0, z: 0.0)),
                ],
            )
            "#,
        )
        .unwrap();
        assert!(matches!(
            scenario.build_simulation(),
            Err(ScenarioError::Rejected(GameError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUEL.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.placements.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(matches!(
            Scenario::load(&missing),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Scenario(name: ").unwrap();
        assert!(matches!(
            Scenario::load(file.path()),
            Err(ScenarioError::ParseError(_))
        ));
    }

    #[test]
    fn test_builtin_skirmish_is_affordable() {
        let sim = Scenario::mixed_skirmish().build_simulation().unwrap();
        assert_eq!(sim.living_count(Team::Red), 4);
        assert_eq!(sim.living_count(Team::Blue), 4);
    }

    #[test]
    fn test_scenario_roundtrips_through_ron() {
        let scenario = Scenario::mixed_skirmish();
        let text = ron::to_string(&scenario).unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }
}
