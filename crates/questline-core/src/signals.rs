//! Sources of health readings for passive drift.
//!
//! The drift loop asks a [`HealthSignalSource`] for one reading per user
//! per tick. Production would wrap a wearable integration; the workspace
//! ships a random [`SimulatedSignalSource`] and a constant
//! [`FixedSignalSource`] for tests.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use questline_types::{HealthReading, UserId};

/// A source of health readings.
pub trait HealthSignalSource: Send {
    /// Produce the reading for `user` at drift tick `tick`.
    fn sample(&mut self, user: UserId, tick: u64) -> HealthReading;
}

/// Draws plausible readings from an owned random generator.
///
/// | Signal | Range |
/// |--------|-------|
/// | steps | `0..=1000` |
/// | heart rate | `55..=100` bpm |
/// | sleep | `4.0..9.0` h |
/// | focus | `0..=120` min |
#[derive(Debug, Clone)]
pub struct SimulatedSignalSource<R = SmallRng> {
    rng: R,
}

impl SimulatedSignalSource<SmallRng> {
    /// A reproducible source seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> SimulatedSignalSource<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> HealthSignalSource for SimulatedSignalSource<R> {
    fn sample(&mut self, _user: UserId, _tick: u64) -> HealthReading {
        HealthReading {
            steps: self.rng.random_range(0..=1000),
            heart_rate: self.rng.random_range(55..=100),
            sleep_hours: self.rng.random_range(4.0..9.0),
            focus_minutes: self.rng.random_range(0..=120),
        }
    }
}

/// Returns the same reading every time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSignalSource {
    reading: HealthReading,
}

impl FixedSignalSource {
    /// Always return `reading`.
    pub const fn new(reading: HealthReading) -> Self {
        Self { reading }
    }
}

impl HealthSignalSource for FixedSignalSource {
    fn sample(&mut self, _user: UserId, _tick: u64) -> HealthReading {
        self.reading
    }
}
