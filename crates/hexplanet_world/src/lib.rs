//! # Hexplanet World
//!
//! The simulation core of a voxel world built on a hexagonal-prism grid.
//! A finite window of terrain chunks slides with a moving observer while a
//! fixed-rate tick loop evolves every block inside the window's active
//! interior: water flow, grass growth, fire spread and rain weather, with
//! light propagation, a narrow collision mesh for the player, and
//! compressed chunk persistence.
//!
//! ## Threads
//!
//! - The **simulation thread** (spawned by [`Scheduler`]) is the sole
//!   mutator of world state.
//! - UI/observer threads enqueue build/destroy actions through
//!   [`WorldShared`] and read the latest physics-mesh snapshot.
//! - A render thread consumes per-chunk refresh hints through the
//!   [`WorldRenderer`] trait it implements.
//!
//! ## Out of scope
//!
//! Rendering, the UI layer, the real terrain generator (an oracle trait
//! here) and the settings store are external collaborators reached through
//! the traits in [`oracle`], [`renderer`] and [`settings`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actions;
pub mod block;
pub mod chunk;
pub mod chunk_loader;
pub mod header;
pub mod oracle;
pub mod persistence;
pub mod phys_mesh;
pub mod player;
pub mod renderer;
pub mod settings;
pub mod world;

pub use actions::{ActionQueue, WorldAction};
pub use block::{BlockKind, CellHandle, Form, LightPass, Visibility};
pub use chunk::{Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};
pub use header::{RainSnapshot, WorldHeader};
pub use oracle::{Biome, FlatOracle, HillsOracle, WorldOracle};
pub use phys_mesh::{PhysMesh, SideFace, UpperFace, WaterCell};
pub use player::Player;
pub use renderer::{NullRenderer, WorldRenderer};
pub use settings::{MemorySettings, SettingsStore, WorldConfig};
pub use world::{Scheduler, SlideDirection, World, WorldShared};
