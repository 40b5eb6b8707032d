//! Virtual-clock Environment implementation for deterministic testing.

use std::sync::{Arc, Mutex};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use warble_core::env::Environment;

#[derive(Debug, Clone, Copy)]
struct Clocks {
    monotonic: i64,
    wall: i64,
}

/// Simulation environment with a virtual clock and seeded RNG.
///
/// This implementation provides:
///
/// - **Virtual Time**: both clocks stand still until the test advances them
///   explicitly with [`SimEnv::advance`], so timer math is exact.
///
/// - **Seeded RNG**: `random_bytes()` uses ChaCha20Rng seeded with a fixed
///   value, ensuring reproducible test runs.
///
/// # Determinism
///
/// The RNG is seeded with a fixed value (0) by default. This ensures that:
/// - Test runs are reproducible
/// - Debugging is easier (same sequence every time)
/// - CI/CD catches regressions reliably
///
/// For testing different scenarios, create SimEnv with different seeds:
/// ```ignore
/// let env = SimEnv::with_seed(12345);
/// ```
#[derive(Clone)]
pub struct SimEnv {
    /// Shared virtual clocks, advanced manually
    ///
    /// Wrapped in Arc<Mutex<>> to allow Clone while maintaining shared state
    /// across clones. The harness is single-threaded, so this Mutex never
    /// blocks.
    clocks: Arc<Mutex<Clocks>>,
    /// Seeded RNG for deterministic random bytes, shared for the same reason
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Create a new SimEnv with default seed (0)
    ///
    /// Use this for most tests where determinism is important but the
    /// specific seed doesn't matter.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a new SimEnv with a specific seed
    ///
    /// Use this when you want to test different random scenarios while
    /// maintaining reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        let clocks = Clocks { monotonic: 0, wall: 1_700_000_000_000_000 };
        Self {
            clocks: Arc::new(Mutex::new(clocks)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }

    /// Advance both clocks by `micros` microseconds.
    pub fn advance(&self, micros: i64) {
        let mut clocks = self.lock_clocks();
        clocks.monotonic += micros;
        clocks.wall += micros;
    }

    fn lock_clocks(&self) -> std::sync::MutexGuard<'_, Clocks> {
        self.clocks.lock().unwrap_or_else(|e| {
            // The harness is single-threaded; the mutex can only be poisoned
            // if another thread panics while holding the lock.
            unreachable!("clock mutex poisoned in single-threaded context: {}", e)
        })
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn monotonic_time(&self) -> i64 {
        self.lock_clocks().monotonic
    }

    fn wall_clock_time(&self) -> i64 {
        self.lock_clocks().wall
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng
            .lock()
            .unwrap_or_else(|e| {
                unreachable!("RNG mutex poisoned in single-threaded context: {}", e)
            })
            .fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_env_time_advances() {
        let env = SimEnv::new();

        let start = env.monotonic_time();
        env.advance(5_000_000);

        assert_eq!(env.monotonic_time() - start, 5_000_000);
        assert_eq!(env.wall_clock_time(), 1_700_000_000_000_000 + 5_000_000);
    }

    #[test]
    fn sim_env_clones_share_the_clock() {
        let env1 = SimEnv::new();
        let env2 = env1.clone();

        env1.advance(250);
        assert_eq!(env2.monotonic_time(), env1.monotonic_time());
    }

    #[test]
    fn sim_env_rng_is_deterministic() {
        // Run the same test twice with same seed, verify same output
        let run_test = |seed: u64| -> Vec<u8> {
            let env = SimEnv::with_seed(seed);
            let mut bytes = vec![0u8; 64];
            env.random_bytes(&mut bytes);
            bytes
        };

        let bytes1 = run_test(12345);
        let bytes2 = run_test(12345);

        // Same seed -> same bytes
        assert_eq!(bytes1, bytes2, "RNG with same seed should produce same output");

        let bytes3 = run_test(54321);
        // Different seed -> different bytes
        assert_ne!(bytes1, bytes3, "RNG with different seed should produce different output");
    }

    #[test]
    fn sim_env_clones_share_rng_state() {
        let env1 = SimEnv::with_seed(999);
        let env2 = env1.clone();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env1.random_bytes(&mut bytes1);
        env2.random_bytes(&mut bytes2);

        // Clones share RNG state, so sequential calls produce different bytes
        assert_ne!(&bytes1[..], &bytes2[..]);
    }
}
