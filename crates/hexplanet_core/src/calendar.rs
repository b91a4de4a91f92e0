//! # Planetary Calendar
//!
//! Day/season model for the simulated planet: a tilted rotation axis, a
//! short year, and the textbook declination/hour-angle relations. The
//! world asks two questions:
//!
//! - how long is the night on a given day at a given latitude, and
//! - where is the sun right now (the grass automaton only looks at the
//!   z component).

use glam::Vec3;

/// Immutable calendar parameters plus derived solar queries.
#[derive(Debug)]
pub struct Calendar {
    ticks_per_day: u32,
    days_per_year: u32,
    axial_tilt: f32,
    summer_solstice_day: u32,
}

impl Calendar {
    /// Creates a calendar.
    ///
    /// `axial_tilt` is the angle between the rotation axis and the orbital
    /// plane normal, in radians. `summer_solstice_day` is the longest day
    /// of the northern hemisphere.
    #[must_use]
    pub const fn new(
        ticks_per_day: u32,
        days_per_year: u32,
        axial_tilt: f32,
        summer_solstice_day: u32,
    ) -> Self {
        Self {
            ticks_per_day,
            days_per_year,
            axial_tilt,
            summer_solstice_day,
        }
    }

    /// Ticks in one solar day.
    #[must_use]
    pub const fn ticks_per_day(&self) -> u32 {
        self.ticks_per_day
    }

    /// Days in one year.
    #[must_use]
    pub const fn days_per_year(&self) -> u32 {
        self.days_per_year
    }

    /// Ticks in one year.
    #[must_use]
    pub const fn ticks_per_year(&self) -> u32 {
        self.ticks_per_day * self.days_per_year
    }

    /// Solar declination on `day`, in radians.
    #[allow(clippy::cast_precision_loss)]
    fn declination(&self, day: u32) -> f32 {
        let phase = (day % self.days_per_year) as f32 / self.days_per_year as f32
            - self.summer_solstice_day as f32 / self.days_per_year as f32;
        self.axial_tilt * (std::f32::consts::TAU * phase).cos()
    }

    /// Night length in ticks for `day` at `latitude` (radians).
    ///
    /// Polar night returns a full day, polar day returns zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn night_length(&self, day: u32, latitude: f32) -> u32 {
        let cos_h = (-latitude.tan() * self.declination(day).tan()).clamp(-1.0, 1.0);
        // Half day arc in radians; the day fraction is h/pi.
        let h = cos_h.acos();
        let night_fraction = 1.0 - h / std::f32::consts::PI;
        (night_fraction * self.ticks_per_day as f32).round() as u32
    }

    /// Unit sun direction at `tick_of_year` and `latitude`, in local
    /// east/north/up coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sun_direction(&self, tick_of_year: u32, latitude: f32) -> Vec3 {
        let day = tick_of_year / self.ticks_per_day;
        let day_fraction =
            (tick_of_year % self.ticks_per_day) as f32 / self.ticks_per_day as f32;
        // Midnight at fraction 0 puts the sun at the nadir.
        let hour_angle = std::f32::consts::TAU * day_fraction - std::f32::consts::PI;

        let decl = self.declination(day);
        let (sin_d, cos_d) = decl.sin_cos();
        let (sin_l, cos_l) = latitude.sin_cos();
        let (sin_h, cos_h) = hour_angle.sin_cos();

        Vec3::new(
            -cos_d * sin_h,
            cos_l * sin_d - sin_l * cos_d * cos_h,
            sin_l * sin_d + cos_l * cos_d * cos_h,
        )
    }
}
