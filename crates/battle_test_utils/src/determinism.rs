//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two matches with the same placements, driven by the same sequence of
//! `elapsed` values, must stay bit-identical. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`battle_core::math::Fixed`] throughout.
//!
//! - **Iteration order**: every phase walks the roster in placement order;
//!   nothing is keyed by a randomized hasher.
//!
//! - **Shared state**: there is none. Separate `Simulation` values may run
//!   on separate threads.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full battles are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use battle_core::math::Fixed;
use battle_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use battle_test_utils::determinism::verify_determinism;
/// use battle_test_utils::fixtures::{default_step, skirmish};
///
/// let result = verify_determinism(
///     3,   // Run 3 times
///     100, // 100 ticks each
///     skirmish,
///     |sim| { sim.tick(default_step()); },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for `Simulation`.
///
/// Runs the simulation twice with identical setup and a fixed step and
/// verifies the final state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64, step: Fixed) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick(step);
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Run N simulations in parallel using `thread::scope` and collect final
/// hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// variations or different memory layouts.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
    step: Fixed,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(step);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, step: Fixed) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick(step);
        sim2.tick(step);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use battle_core::catalog::{BaseStats, UnitCatalog};
    use battle_core::math::{Fixed, Vec2Fixed};
    use battle_core::roster::Team;
    use proptest::prelude::*;

    /// Archetype ids of the built-in catalog.
    pub fn builtin_ids() -> Vec<String> {
        UnitCatalog::builtin().iter().map(|a| a.id.clone()).collect()
    }

    /// Generate a stat value in tenths, from 0 to `max`.
    pub fn arb_stat(max: i32) -> impl Strategy<Value = Fixed> {
        (0..=max * 10).prop_map(|tenths| Fixed::from_num(tenths) / 10)
    }

    /// Generate a position on `team`'s half, inside the playable area.
    ///
    /// Range: 0 to 38 away from the centre line, -38 to 38 across.
    pub fn arb_position_for(team: Team) -> impl Strategy<Value = Vec2Fixed> {
        (0i32..=380, -380i32..=380).prop_map(move |(depth, z)| {
            let x = Fixed::from_num(depth) / 10;
            let x = match team {
                Team::Red => -x,
                Team::Blue => x,
            };
            Vec2Fixed::new(x, Fixed::from_num(z) / 10)
        })
    }

    /// Generate a position anywhere in (and a little beyond) the arena.
    pub fn arb_any_position() -> impl Strategy<Value = Vec2Fixed> {
        (-450i32..=450, -450i32..=450)
            .prop_map(|(x, z)| Vec2Fixed::new(Fixed::from_num(x) / 10, Fixed::from_num(z) / 10))
    }

    /// Generate a time step between 1 ms and 100 ms.
    pub fn arb_step() -> impl Strategy<Value = Fixed> {
        (1i32..=100).prop_map(|ms| Fixed::from_num(ms) / 1000)
    }

    /// Generate base stats for an archetype that passes validation.
    pub fn arb_base_stats() -> impl Strategy<Value = BaseStats> {
        (
            1i32..60_000,
            arb_stat(600),
            arb_stat(2_000),
            arb_stat(20),
            1i32..=30,
            arb_stat(8),
        )
            .prop_map(|(max_hp, atk, def, range, speed_tenths, move_speed)| BaseStats {
                max_hp: Fixed::from_num(max_hp),
                atk,
                def,
                range,
                attack_speed: Fixed::from_num(speed_tenths) / 10,
                move_speed,
            })
    }

    /// One placement of a built-in archetype.
    #[derive(Debug, Clone)]
    pub struct Placement {
        /// Team.
        pub team: Team,
        /// Built-in archetype id.
        pub archetype: String,
        /// Position on the team's half.
        pub position: Vec2Fixed,
    }

    /// Generate a placement of a built-in archetype for `team`.
    pub fn arb_placement_for(team: Team) -> impl Strategy<Value = Placement> {
        (
            proptest::sample::select(builtin_ids()),
            arb_position_for(team),
        )
            .prop_map(move |(archetype, position)| Placement {
                team,
                archetype,
                position,
            })
    }

    /// Generate an army: 1 to `max_per_side` placements for each team,
    /// RED first.
    pub fn arb_army(max_per_side: usize) -> impl Strategy<Value = Vec<Placement>> {
        (
            proptest::collection::vec(arb_placement_for(Team::Red), 1..=max_per_side),
            proptest::collection::vec(arb_placement_for(Team::Blue), 1..=max_per_side),
        )
            .prop_map(|(mut red, blue)| {
                red.extend(blue);
                red
            })
    }
}

/// Build a started match from generated placements.
///
/// Placements the budget rejects are skipped. Returns `None` if a team
/// ends up empty.
pub fn simulation_from_army(army: &[strategies::Placement]) -> Option<Simulation> {
    let mut sim = Simulation::default();
    for placement in army {
        let _ = sim.place_unit(placement.team, &placement.archetype, placement.position);
    }
    sim.start_battle().ok()?;
    Some(sim)
}
