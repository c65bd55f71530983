//! # Battle Core
//!
//! Deterministic battle simulation for the Arena Clash autobattler.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Determinism testing across threads
//! - Renderers that only read simulation output
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Unit archetypes and placement costs
//! - [`roster`] - Live unit instances
//! - [`targeting`] - Sticky nearest-enemy target acquisition
//! - [`combat`] - Cooldowns, damage and effect records
//! - [`movement`] - Steering, bounds and pairwise separation
//! - [`simulation`] - Match controller and tick pipeline
//! - [`view`] - Read-only snapshots
//! - [`config`] - Match configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod combat;
pub mod config;
pub mod error;
pub mod math;
pub mod movement;
pub mod roster;
pub mod simulation;
pub mod targeting;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{
        AttackType, BaseStats, CostRule, EffectKind, UnitArchetype, UnitCatalog,
    };
    pub use crate::combat::{DamageEvent, EffectRecord};
    pub use crate::config::MatchConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::roster::{Team, UnitId, UnitInstance};
    pub use crate::simulation::{GamePhase, MatchOutcome, Simulation, TickEvents};
    pub use crate::view::{MatchView, UnitView};
}
