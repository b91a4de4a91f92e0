//! # Renderer Interface
//!
//! The simulation publishes refresh hints through this narrow trait; the
//! real renderer lives in another crate (and usually another thread).
//! Chunk coordinates are matrix-relative (`0..chunk_number`). `immediate`
//! asks for a rebuild before the next presented frame — the window slide
//! uses it for near-border chunks.

/// Refresh-hint sink implemented by the rendering subsystem.
pub trait WorldRenderer: Send {
    /// The chunk's solid geometry is stale.
    fn update_chunk(&mut self, cx: i32, cy: i32, immediate: bool);

    /// The chunk's water surface is stale.
    fn update_chunk_water(&mut self, cx: i32, cy: i32, immediate: bool);

    /// The window slid to a new origin.
    fn update_world_position(&mut self, longitude: i32, latitude: i32);

    /// End-of-tick catch-all.
    fn update(&mut self);
}

/// Renderer that ignores every hint; used by tests and headless hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl WorldRenderer for NullRenderer {
    fn update_chunk(&mut self, _cx: i32, _cy: i32, _immediate: bool) {}
    fn update_chunk_water(&mut self, _cx: i32, _cy: i32, _immediate: bool) {}
    fn update_world_position(&mut self, _longitude: i32, _latitude: i32) {}
    fn update(&mut self) {}
}
