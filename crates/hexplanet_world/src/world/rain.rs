//! Rain state machine.
//!
//! Two states, `Dry` and `Raining`. Dry worlds roll for rain every few
//! seconds; a successful roll samples a log-normal duration and a uniform
//! peak intensity. While raining, the intensity ramps linearly over a
//! ten-second edge at both ends and is published atomically for the fire
//! loop and the renderer. The machine's PRNG state is persisted so a
//! reloaded world continues the same weather.

use hexplanet_core::LongRand;

use crate::header::RainSnapshot;

use super::{World, WorldShared, DAY_DURATION_TICKS, TICKS_PER_SECOND};

/// Ticks between rain-start attempts while dry.
pub(crate) const RAIN_TRY_START_INTERVAL_TICKS: u32 = 6 * TICKS_PER_SECOND;
/// Rain-start chance per attempt. Over N attempts the chance is
/// `1 - (1 - p)^N`.
const RAIN_START_CHANCE: u32 = LongRand::MAX_RAND / 256;

const MIDDLE_RAIN_DURATION_TICKS: u32 = DAY_DURATION_TICKS / 8;
/// Shortest rain, an eighth of a day halved.
pub(crate) const MIN_RAIN_DURATION_TICKS: u32 = DAY_DURATION_TICKS / 16;
/// Longest rain, a day and a half.
pub(crate) const MAX_RAIN_DURATION_TICKS: u32 = DAY_DURATION_TICKS * 3 / 2;

/// Intensity ramp length at each end of a rain.
pub(crate) const RAIN_EDGE_TIME_TICKS: u32 = 10 * TICKS_PER_SECOND;
const _: () = assert!(
    RAIN_EDGE_TIME_TICKS * 2 < MIN_RAIN_DURATION_TICKS,
    "rain edges must fit inside the shortest rain"
);

/// `ln`-space deviation of the duration distribution.
const DURATION_RAND_POW: f32 = 0.5;

/// The weather machine.
#[derive(Debug)]
pub struct RainMachine {
    is_raining: bool,
    start_tick: u32,
    duration: u32,
    base_intensity: f32,
    rng: LongRand,
}

impl RainMachine {
    /// Restores the machine from a header snapshot.
    #[must_use]
    pub fn restore(snapshot: &RainSnapshot) -> Self {
        Self {
            is_raining: snapshot.is_raining,
            start_tick: snapshot.start_tick,
            duration: snapshot.duration,
            base_intensity: snapshot.base_intensity,
            rng: LongRand::new(snapshot.rng_state),
        }
    }

    /// Snapshot for the world header.
    #[must_use]
    pub fn snapshot(&self) -> RainSnapshot {
        RainSnapshot {
            is_raining: self.is_raining,
            start_tick: self.start_tick,
            duration: self.duration,
            base_intensity: self.base_intensity,
            rng_state: self.rng.state(),
        }
    }

    /// True while rain is falling.
    #[must_use]
    pub const fn is_raining(&self) -> bool {
        self.is_raining
    }

    /// Planned duration of the current rain, in ticks.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Publishes the intensity as of `tick` into the shared atomics.
    pub(crate) fn publish(&self, shared: &WorldShared, tick: u32) {
        shared.store_rain_intensity(self.current_intensity_at(tick));
    }

    /// Advances the machine by one tick.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn tick(&mut self, phys_tick_count: u32, shared: &WorldShared) {
        if !self.is_raining
            && phys_tick_count % RAIN_TRY_START_INTERVAL_TICKS == 0
            && self.rng.next() < RAIN_START_CHANCE
        {
            self.is_raining = true;
            self.start_tick = phys_tick_count;

            // The distribution's mean lands on the middle duration:
            // mean = k * e^(pow²/2).
            let k = MIDDLE_RAIN_DURATION_TICKS as f32
                / (DURATION_RAND_POW * DURATION_RAND_POW * 0.5).exp();
            let sampled = (k * self.rng.next_log_normal(DURATION_RAND_POW)) as u32;
            self.duration = sampled.clamp(MIN_RAIN_DURATION_TICKS, MAX_RAIN_DURATION_TICKS);

            self.base_intensity = self.rng.next_range_f(0.3, 1.0);
            log::info!(
                "rain starting: {} ticks at intensity {:.2}",
                self.duration,
                self.base_intensity
            );
        }

        if self.is_raining {
            let since_start = phys_tick_count.wrapping_sub(self.start_tick);
            if since_start >= self.duration {
                self.is_raining = false;
                shared.store_rain_intensity(0.0);
                log::info!("rain stopped");
            } else {
                shared.store_rain_intensity(self.current_intensity_at(phys_tick_count));
            }
        }
    }

    /// Intensity at `tick`: linear edges around a flat middle.
    #[allow(clippy::cast_precision_loss)]
    fn current_intensity_at(&self, tick: u32) -> f32 {
        if !self.is_raining {
            return 0.0;
        }
        let since_start = tick.wrapping_sub(self.start_tick);
        if since_start >= self.duration {
            return 0.0;
        }
        let ramp = if since_start < RAIN_EDGE_TIME_TICKS {
            since_start as f32 / RAIN_EDGE_TIME_TICKS as f32
        } else if self.duration - since_start < RAIN_EDGE_TIME_TICKS {
            (self.duration - since_start) as f32 / RAIN_EDGE_TIME_TICKS as f32
        } else {
            1.0
        };
        self.base_intensity * ramp
    }
}

impl World {
    /// One rain tick.
    pub(crate) fn rain_tick(&mut self) {
        self.rain.tick(self.phys_tick_count, &self.shared);
    }

    /// The weather machine, read-only.
    #[must_use]
    pub const fn rain(&self) -> &RainMachine {
        &self.rain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> WorldShared {
        WorldShared::new(
            DAY_DURATION_TICKS * super::super::DAYS_IN_YEAR,
            0,
            glam::Vec3::ZERO,
            glam::Vec3::ZERO,
        )
    }

    /// Finds a PRNG state whose next draw starts rain.
    fn lucky_state() -> u64 {
        let mut probe = 1u64;
        loop {
            let mut rng = LongRand::new(probe);
            if rng.next() < RAIN_START_CHANCE {
                return probe;
            }
            probe += 1;
        }
    }

    #[test]
    fn test_rain_starts_with_clamped_duration() {
        let shared = shared();
        let mut machine = RainMachine::restore(&RainSnapshot {
            rng_state: lucky_state(),
            ..RainSnapshot::default()
        });

        machine.tick(RAIN_TRY_START_INTERVAL_TICKS, &shared);
        assert!(machine.is_raining());
        assert!(machine.duration() >= MIN_RAIN_DURATION_TICKS);
        assert!(machine.duration() <= MAX_RAIN_DURATION_TICKS);
        assert!(machine.base_intensity >= 0.3 && machine.base_intensity <= 1.0);
    }

    #[test]
    fn test_rain_only_attempts_on_interval() {
        let shared = shared();
        let mut machine = RainMachine::restore(&RainSnapshot {
            rng_state: lucky_state(),
            ..RainSnapshot::default()
        });
        // Off-interval ticks never start rain, whatever the PRNG says.
        machine.tick(RAIN_TRY_START_INTERVAL_TICKS + 1, &shared);
        assert!(!machine.is_raining());
    }

    #[test]
    fn test_intensity_ramps_and_stops() {
        let shared = shared();
        let mut machine = RainMachine::restore(&RainSnapshot {
            rng_state: lucky_state(),
            ..RainSnapshot::default()
        });

        let t0 = RAIN_TRY_START_INTERVAL_TICKS;
        machine.tick(t0, &shared);
        assert!(machine.is_raining());
        let base = machine.base_intensity;

        // Start of the ramp: zero.
        assert!(shared.rain_intensity() < 0.05 * base + 1e-6);

        // Mid-ramp grows monotonically.
        let mut last = 0.0f32;
        for dt in 1..RAIN_EDGE_TIME_TICKS {
            machine.tick(t0 + dt, &shared);
            let v = shared.rain_intensity();
            assert!(v >= last - 1e-6);
            last = v;
        }

        // Past the edge: full base intensity.
        machine.tick(t0 + RAIN_EDGE_TIME_TICKS, &shared);
        assert!((shared.rain_intensity() - base).abs() < 1e-5);

        // After the duration: dry again, intensity zeroed.
        machine.tick(t0 + machine.duration(), &shared);
        assert!(!machine.is_raining());
        assert_eq!(shared.rain_intensity(), 0.0);
    }

    #[test]
    fn test_snapshot_roundtrip_continues_sequence() {
        let shared = shared();
        let mut a = RainMachine::restore(&RainSnapshot::default());
        for t in 0..10_000 {
            a.tick(t, &shared);
        }
        let snap = a.snapshot();
        let mut b = RainMachine::restore(&snap);
        for t in 10_000..40_000 {
            a.tick(t, &shared);
            b.tick(t, &shared);
            assert_eq!(a.is_raining(), b.is_raining());
        }
    }
}
