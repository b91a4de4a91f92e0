//! # World Header
//!
//! Small fixed-layout file persisted once per world: observer position and
//! rotation, the tick counter, and a rain snapshot (including the weather
//! PRNG state, so reloading continues the same weather sequence). A
//! missing or corrupt header falls back to defaults — a fresh world starts
//! at the spring equinox, shortly after sunrise.

use std::io::Write;
use std::path::Path;

use glam::Vec3;

const HEADER_FILE: &str = "world.hdr";
const MAGIC: u32 = 0x4858_5750; // "HXWP"
const VERSION: u32 = 1;
/// Serialized size: magic, version, 6 floats, tick, rain snapshot.
const HEADER_LEN: usize = 4 + 4 + 6 * 4 + 4 + (1 + 3 + 4 + 4 + 4 + 8);

/// Persisted rain-machine state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainSnapshot {
    /// True while rain is falling.
    pub is_raining: bool,
    /// Tick the current rain started.
    pub start_tick: u32,
    /// Planned duration of the current rain, in ticks.
    pub duration: u32,
    /// Peak intensity of the current rain.
    pub base_intensity: f32,
    /// Weather PRNG state word.
    pub rng_state: u64,
}

impl Default for RainSnapshot {
    fn default() -> Self {
        Self {
            is_raining: false,
            start_tick: 0,
            duration: 0,
            base_intensity: 0.0,
            rng_state: 0x5EED_0FBA_D5EA_5011,
        }
    }
}

/// Per-world persisted header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldHeader {
    /// Observer feet position, global continuous coordinates.
    pub observer_position: Vec3,
    /// Observer view angles (pitch, roll, yaw) in radians.
    pub observer_rotation: Vec3,
    /// Simulation tick count at save time; zero means "fresh world".
    pub ticks: u32,
    /// Rain-machine snapshot.
    pub rain: RainSnapshot,
}

impl Default for WorldHeader {
    fn default() -> Self {
        Self {
            observer_position: Vec3::new(0.0, 0.0, 74.0),
            observer_rotation: Vec3::ZERO,
            ticks: 0,
            rain: RainSnapshot::default(),
        }
    }
}

impl WorldHeader {
    /// Loads the header from `world_dir`, falling back to defaults when
    /// the file is missing or unreadable.
    #[must_use]
    pub fn load(world_dir: &Path) -> Self {
        let path = world_dir.join(HEADER_FILE);
        match std::fs::read(&path) {
            Ok(bytes) => Self::decode(&bytes).unwrap_or_else(|| {
                log::warn!("corrupt world header at {}, using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Writes the header into `world_dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; the in-memory world is unaffected.
    pub fn save(&self, world_dir: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(world_dir.join(HEADER_FILE))?;
        file.write_all(&self.encode())?;
        Ok(())
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        for v in [
            self.observer_position.x,
            self.observer_position.y,
            self.observer_position.z,
            self.observer_rotation.x,
            self.observer_rotation.y,
            self.observer_rotation.z,
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&self.ticks.to_le_bytes());
        out.push(u8::from(self.rain.is_raining));
        out.extend_from_slice(&[0u8; 3]);
        out.extend_from_slice(&self.rain.start_tick.to_le_bytes());
        out.extend_from_slice(&self.rain.duration.to_le_bytes());
        out.extend_from_slice(&self.rain.base_intensity.to_le_bytes());
        out.extend_from_slice(&self.rain.rng_state.to_le_bytes());
        out
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let read_u32 =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let read_f32 = |at: usize| f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        if read_u32(0) != MAGIC || read_u32(4) != VERSION {
            return None;
        }

        let pos = Vec3::new(read_f32(8), read_f32(12), read_f32(16));
        let rot = Vec3::new(read_f32(20), read_f32(24), read_f32(28));
        let ticks = read_u32(32);
        let is_raining = bytes[36] != 0;
        let start_tick = read_u32(40);
        let duration = read_u32(44);
        let base_intensity = read_f32(48);
        let rng_state = u64::from_le_bytes([
            bytes[52], bytes[53], bytes[54], bytes[55], bytes[56], bytes[57], bytes[58], bytes[59],
        ]);

        Some(Self {
            observer_position: pos,
            observer_rotation: rot,
            ticks,
            rain: RainSnapshot {
                is_raining,
                start_tick,
                duration,
                base_intensity,
                rng_state,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("hexplanet_header_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_roundtrip() {
        let dir = temp_dir("roundtrip");
        let header = WorldHeader {
            observer_position: Vec3::new(10.5, -3.25, 80.0),
            observer_rotation: Vec3::new(0.1, 0.0, -1.5),
            ticks: 123_456,
            rain: RainSnapshot {
                is_raining: true,
                start_tick: 123_000,
                duration: 5000,
                base_intensity: 0.75,
                rng_state: 0xDEAD_BEEF_CAFE_F00D,
            },
        };
        header.save(&dir).unwrap();
        assert_eq!(WorldHeader::load(&dir), header);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = temp_dir("missing");
        let header = WorldHeader::load(&dir);
        assert_eq!(header.ticks, 0);
        assert!(!header.rain.is_raining);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = temp_dir("corrupt");
        std::fs::write(dir.join(HEADER_FILE), b"not a header").unwrap();
        let header = WorldHeader::load(&dir);
        assert_eq!(header, WorldHeader::default());
        std::fs::remove_dir_all(&dir).ok();
    }
}
