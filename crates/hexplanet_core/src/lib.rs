//! # Hexplanet Core
//!
//! Leaf utilities for the hexagonal-prism world simulation. Nothing in this
//! crate knows about chunks or blocks; it provides:
//!
//! - `math::hex`: the hex-grid coordinate system and its parity-dependent
//!   neighbor sets
//! - `math::rand`: the deterministic simulation PRNGs
//! - `math::geometry`: ray and circle tests used by picking and collision
//! - `calendar`: the planetary day/season model (night length, sun vector)
//! - `memory`: fixed-slot object pools for per-chunk block variants
//! - `compression`: length-prefixed DEFLATE helpers for persisted blobs
//!
//! ## Determinism
//!
//! Every random process in the simulation draws from the generators in
//! `math::rand`; given the same seed and the same event stream, a world
//! replays identically on one platform.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod calendar;
pub mod compression;
pub mod math;
pub mod memory;

pub use calendar::Calendar;
pub use compression::{compress_prepend_size, decompress_size_prepended, CompressionError};
pub use math::hex::{hex_center, hex_lid_vertices, hex_neighbors, world_to_hex, Direction};
pub use math::rand::{Lcg31, LongRand};
pub use memory::SlotPool;
