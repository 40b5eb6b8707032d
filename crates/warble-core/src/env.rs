//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples session logic from system resources
//! (time, randomness). This enables:
//!
//! - Deterministic Simulation: the harness provides a virtual clock and
//!   seeded RNG, allowing perfect bug reproduction.
//!
//! - Production Runtime: a driver backed by real clocks uses system resources
//!   without any code changes to the session logic.
//!
//! # Design Philosophy
//!
//! State machines in `warble-core` are pure logic. They:
//!
//! - MUST NOT read system clocks or entropy directly
//! - MUST accept an `Environment` parameter for all side effects
//! - MUST express timers as returned actions, never by sleeping
//!
//! # Why Microsecond Integers
//!
//! The wire format stamps both clocks into realtime messages as signed
//! microsecond counts, and the clock-offset echo is plain integer arithmetic
//! on those stamps (`offset = server_time - monotonic_now`). Representing
//! time as `i64` microseconds end to end keeps that arithmetic exact and
//! makes virtual clocks trivial to implement.
//!
//! # Invariants
//!
//! - Monotonicity: `monotonic_time()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

/// Abstract environment providing time and randomness.
///
/// This trait is the foundation of the sans-IO architecture. It allows
/// session logic to be completely deterministic and testable.
///
/// # Implementations
///
/// - Simulation (`warble-harness::SimEnv`): Virtual clocks that advance only
///   when told to, seeded RNG for reproducibility.
///
/// - Production: Real monotonic and wall clocks, crypto-secure RNG from the
///   OS entropy pool.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Time monotonicity: `monotonic_time()` never goes backwards
/// 2. RNG determinism in simulation: the seed fully determines the byte
///    sequence
/// 3. Minimal panics: Methods are infallible except in exceptional
///    circumstances (e.g., OS entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the monotonic clock in microseconds.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: This method MUST return values that never decrease
    ///   within a single execution context. Subsequent calls must return
    ///   times >= previous calls.
    ///
    /// The zero point is arbitrary. Only differences between readings are
    /// meaningful, which is exactly how the clock-offset echo uses them.
    fn monotonic_time(&self) -> i64;

    /// Returns the wall clock in microseconds since the Unix epoch.
    ///
    /// Used only for the `ntp_time` stamp in outbound realtime messages.
    /// This clock may jump; nothing in the session compares two readings.
    fn wall_clock_time(&self) -> i64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Determinism during simulations: Given the same RNG seed, this
    ///   produces the same sequence of bytes
    /// - Unpredictability in production: Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u32`.
    ///
    /// This is a convenience method for randomizing the realtime sequence
    /// and sample-time origins at session open.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal seeded environment for unit tests inside this crate.
    //!
    //! The full-featured simulation environment lives in `warble-harness`;
    //! this one exists so core unit tests don't depend on it.

    use std::sync::{Arc, Mutex};

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;

    #[derive(Debug)]
    struct Clocks {
        monotonic: i64,
        wall: i64,
    }

    #[derive(Clone)]
    pub(crate) struct TestEnv {
        clocks: Arc<Mutex<Clocks>>,
        rng: Arc<Mutex<ChaCha20Rng>>,
    }

    impl TestEnv {
        pub(crate) fn new() -> Self {
            Self::with_seed(0)
        }

        pub(crate) fn with_seed(seed: u64) -> Self {
            Self {
                clocks: Arc::new(Mutex::new(Clocks {
                    monotonic: 1_000_000,
                    wall: 1_700_000_000_000_000,
                })),
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            }
        }

        pub(crate) fn advance(&self, micros: i64) {
            let mut clocks = self.clocks.lock().unwrap();
            clocks.monotonic += micros;
            clocks.wall += micros;
        }
    }

    impl Environment for TestEnv {
        fn monotonic_time(&self) -> i64 {
            self.clocks.lock().unwrap().monotonic
        }

        fn wall_clock_time(&self) -> i64 {
            self.clocks.lock().unwrap().wall
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            self.rng.lock().unwrap().fill_bytes(buffer);
        }
    }
}
