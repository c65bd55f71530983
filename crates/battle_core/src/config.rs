//! Match configuration.
//!
//! Loaded from RON or built from [`MatchConfig::default`]:
//!
//! ```ron
//! MatchConfig(
//!     initial_budget: 5000,
//!     arena_half_extent: 40.0,
//!     boundary_margin: 2.0,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, Fixed};

/// Budget each team starts a match with.
pub const INITIAL_BUDGET: u32 = 5000;

/// Distance from the arena centre to its edge on each axis.
pub const ARENA_HALF_EXTENT: i32 = 40;

/// Buffer between the arena edge and the playable area.
pub const BOUNDARY_MARGIN: i32 = 2;

/// Largest accepted half extent. Two units in opposite corners are then at
/// most 2^14 apart per axis, so squared distances stay well inside `I32F32`.
pub const MAX_ARENA_HALF_EXTENT: i32 = 8192;

/// Per-match settings. Survives [`reset`](crate::simulation::Simulation::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Placement budget for each team.
    #[serde(default = "default_budget")]
    pub initial_budget: u32,
    /// Half the arena's side length.
    #[serde(with = "fixed_decimal")]
    pub arena_half_extent: Fixed,
    /// Edge buffer units are kept out of.
    #[serde(with = "fixed_decimal")]
    pub boundary_margin: Fixed,
}

const fn default_budget() -> u32 {
    INITIAL_BUDGET
}

impl MatchConfig {
    /// Parse and validate a config from RON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON or fails validation.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: MatchConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the arena geometry is usable.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the margin is negative,
    /// leaves no playable area, or the arena exceeds
    /// [`MAX_ARENA_HALF_EXTENT`].
    pub fn validate(&self) -> Result<()> {
        if self.boundary_margin < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "boundary_margin must not be negative".to_string(),
            ));
        }
        if self.arena_half_extent <= self.boundary_margin {
            return Err(GameError::InvalidConfig(
                "arena_half_extent must exceed boundary_margin".to_string(),
            ));
        }
        if self.arena_half_extent > Fixed::from_num(MAX_ARENA_HALF_EXTENT) {
            return Err(GameError::InvalidConfig(format!(
                "arena_half_extent must not exceed {MAX_ARENA_HALF_EXTENT}"
            )));
        }
        Ok(())
    }

    /// Largest coordinate magnitude a living unit may occupy.
    #[must_use]
    pub fn playable_bound(&self) -> Fixed {
        self.arena_half_extent - self.boundary_margin
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            initial_budget: INITIAL_BUDGET,
            arena_half_extent: Fixed::from_num(ARENA_HALF_EXTENT),
            boundary_margin: Fixed::from_num(BOUNDARY_MARGIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.initial_budget, 5000);
        assert_eq!(config.playable_bound(), Fixed::from_num(38));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_ron_str() {
        let config = MatchConfig::from_ron_str(
            "MatchConfig(initial_budget: 1200, arena_half_extent: 20.0, boundary_margin: 0.5)",
        )
        .unwrap();
        assert_eq!(config.initial_budget, 1200);
        assert_eq!(config.playable_bound(), Fixed::from_num(19.5));
    }

    #[test]
    fn test_budget_defaults_when_omitted() {
        let config =
            MatchConfig::from_ron_str("(arena_half_extent: 40.0, boundary_margin: 2.0)").unwrap();
        assert_eq!(config.initial_budget, INITIAL_BUDGET);
    }

    #[test]
    fn test_rejects_margin_swallowing_arena() {
        let err =
            MatchConfig::from_ron_str("(arena_half_extent: 2.0, boundary_margin: 2.0)").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_negative_margin() {
        let config = MatchConfig {
            boundary_margin: Fixed::from_num(-1),
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_arena() {
        let err = MatchConfig::from_ron_str("(arena_half_extent: 100000.0, boundary_margin: 2.0)")
            .unwrap_err();
        assert!(err.to_string().contains("arena_half_extent"));
    }

    #[test]
    fn test_largest_arena_accepted() {
        let config = MatchConfig {
            arena_half_extent: Fixed::from_num(MAX_ARENA_HALF_EXTENT),
            ..MatchConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
