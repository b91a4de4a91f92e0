//! # Chunk Persistence
//!
//! A chunk serializes to a fixed-layout little-endian stream:
//!
//! 1. header `{water_block_count: u32, longitude: i32, latitude: i32}`
//! 2. the dense grid: 32 768 `u16` kind ordinals
//! 3. the liquid list: `count: u16`, then `{x, y, z: u8, level: u16}` each
//! 4. the non-standard-form list: `{x, y, z: u8, kind: u16, dir: u8}` each
//! 5. the fire-stone light-source list: `{x, y, z, level: u8}` each
//! 6. the fire list: `{x, y, z: u8, power: u16}` each
//! 7. the active-grass list: `{x, y, z: u8}` each
//! 8. the failing list: `{x, y, z: u8, kind: u16, velocity: f32}` each
//! 9. the raw sun and fire light maps
//!
//! The stream is DEFLATE-compressed with a 4-byte size prefix before it
//! reaches the chunk loader. Unknown kind ordinals decode as air (logged);
//! a short or inconsistent stream is an error, and the caller regenerates
//! the chunk from the oracle.

use hexplanet_core::math::hex::Direction;
use hexplanet_core::CompressionError;
use thiserror::Error;

use crate::block::{BlockKind, CellHandle};
use crate::chunk::{cell_addr, Chunk, CHUNK_VOLUME, MAX_WATER_LEVEL};

/// Failures while loading persisted world data.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Stream ended before the expected field.
    #[error("chunk stream ended short at offset {0}")]
    UnexpectedEof(usize),

    /// A list entry disagrees with the dense grid.
    #[error("chunk stream inconsistent: {0}")]
    Inconsistent(&'static str),

    /// The compressed envelope is corrupt.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// Region file I/O failed.
    #[error("region i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes `chunk` into the fixed-layout stream.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn serialize_chunk(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::with_capacity(CHUNK_VOLUME * 4 + 4096);

    out.extend_from_slice(&(chunk.water_list.len() as u32).to_le_bytes());
    out.extend_from_slice(&chunk.longitude().to_le_bytes());
    out.extend_from_slice(&chunk.latitude().to_le_bytes());

    // Dense grid of kind ordinals.
    let kinds: Vec<u16> = chunk.blocks.iter().map(|h| h.kind() as u16).collect();
    out.extend_from_slice(bytemuck::cast_slice(&kinds));

    // Liquid list.
    out.extend_from_slice(&(chunk.water_list.len() as u16).to_le_bytes());
    for &slot in &chunk.water_list {
        if let Some(b) = chunk.water_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z]);
            out.extend_from_slice(&b.level.to_le_bytes());
        }
    }

    // Non-standard forms.
    out.extend_from_slice(&(chunk.nonstandard_list.len() as u16).to_le_bytes());
    for &slot in &chunk.nonstandard_list {
        if let Some(b) = chunk.nonstandard_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z]);
            out.extend_from_slice(&(b.kind as u16).to_le_bytes());
            out.push(b.direction as u8);
        }
    }

    // Fire-stone light sources.
    out.extend_from_slice(&(chunk.light_list.len() as u16).to_le_bytes());
    for &slot in &chunk.light_list {
        if let Some(b) = chunk.light_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z, b.level]);
        }
    }

    // Fires.
    out.extend_from_slice(&(chunk.fire_list.len() as u16).to_le_bytes());
    for &slot in &chunk.fire_list {
        if let Some(b) = chunk.fire_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z]);
            out.extend_from_slice(&b.power.to_le_bytes());
        }
    }

    // Active grass.
    out.extend_from_slice(&(chunk.grass_list.len() as u16).to_le_bytes());
    for &slot in &chunk.grass_list {
        if let Some(b) = chunk.grass_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z]);
        }
    }

    // Failing blocks.
    out.extend_from_slice(&(chunk.failing_list.len() as u16).to_le_bytes());
    for &slot in &chunk.failing_list {
        if let Some(b) = chunk.failing_pool.get(slot) {
            out.extend_from_slice(&[b.x, b.y, b.z]);
            out.extend_from_slice(&(b.wrapped as u16).to_le_bytes());
            out.extend_from_slice(&b.velocity.to_le_bytes());
        }
    }

    // Light maps, verbatim; a loaded chunk needs no global relight.
    out.extend_from_slice(&chunk.sun_light);
    out.extend_from_slice(&chunk.fire_light);

    out
}

/// Rebuilds a chunk from a stream produced by [`serialize_chunk`].
///
/// # Errors
///
/// Returns [`PersistenceError`] when the stream is short or a list entry
/// does not match the dense grid.
pub fn deserialize_chunk(bytes: &[u8]) -> Result<Chunk, PersistenceError> {
    let mut r = Reader::new(bytes);

    let _water_count = r.u32()?;
    let longitude = r.i32()?;
    let latitude = r.i32()?;

    let mut chunk = Chunk::new_empty(longitude, latitude);
    chunk.needs_initial_light = false;

    // Dense grid. Unknown ordinals become air: newer worlds stay loadable
    // by older builds at the cost of those cells.
    for addr in 0..CHUNK_VOLUME {
        let v = r.u16()?;
        let kind = BlockKind::from_u16(v).unwrap_or_else(|| {
            log::warn!("unknown block kind {v} in chunk ({longitude},{latitude}), replacing with air");
            BlockKind::Air
        });
        chunk.blocks[addr] = CellHandle::normal(kind);
        chunk.transparency[addr] = kind.transparency();
    }

    // Liquid list.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        let level = r.u16()?.clamp(1, MAX_WATER_LEVEL);
        expect_kind(&chunk, x, y, z, BlockKind::Water)?;
        chunk.new_water_block(x, y, z, level);
    }

    // Non-standard forms.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        let kind = BlockKind::from_u16(r.u16()?).unwrap_or(BlockKind::Air);
        let dir = Direction::from_u8(r.u8()?).unwrap_or(Direction::Unknown);
        if kind == BlockKind::Air {
            continue; // unknown kind already replaced in the grid
        }
        expect_kind(&chunk, x, y, z, kind)?;
        chunk.new_nonstandard_block(x, y, z, kind, dir);
    }

    // Fire-stone light sources.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        let level = r.u8()?;
        expect_kind(&chunk, x, y, z, BlockKind::FireStone)?;
        chunk.new_light_source(x, y, z, level);
    }

    // Fires.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        let power = r.u16()?;
        expect_kind(&chunk, x, y, z, BlockKind::Fire)?;
        let slot = chunk.new_fire(x, y, z);
        if let Some(fire) = chunk.fire_pool.get_mut(slot) {
            fire.power = power;
        }
    }

    // Active grass.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        expect_kind(&chunk, x, y, z, BlockKind::Grass)?;
        chunk.new_active_grass(x, y, z);
    }

    // Failing blocks.
    for _ in 0..r.u16()? {
        let (x, y, z) = r.cell()?;
        let wrapped = BlockKind::from_u16(r.u16()?).unwrap_or(BlockKind::Air);
        let velocity = r.f32()?;
        if wrapped == BlockKind::Air {
            continue;
        }
        expect_kind(&chunk, x, y, z, wrapped)?;
        let slot = chunk.new_failing_block(x, y, z, wrapped);
        if let Some(b) = chunk.failing_pool.get_mut(slot) {
            b.velocity = velocity;
        }
    }

    // Light maps.
    let sun = r.take(CHUNK_VOLUME)?;
    chunk.sun_light.copy_from_slice(sun);
    let fire = r.take(CHUNK_VOLUME)?;
    chunk.fire_light.copy_from_slice(fire);

    chunk.rebuild_height_map();
    Ok(chunk)
}

fn expect_kind(
    chunk: &Chunk,
    x: u32,
    y: u32,
    z: u32,
    kind: BlockKind,
) -> Result<(), PersistenceError> {
    if chunk.blocks[cell_addr(x, y, z)].kind() == kind {
        Ok(())
    } else {
        Err(PersistenceError::Inconsistent(
            "side-list entry disagrees with the dense grid",
        ))
    }
}

/// Little-endian cursor with bounds checks.
struct Reader<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, at: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PersistenceError> {
        let end = self
            .at
            .checked_add(n)
            .filter(|&e| e <= self.bytes.len())
            .ok_or(PersistenceError::UnexpectedEof(self.at))?;
        let slice = &self.bytes[self.at..end];
        self.at = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, PersistenceError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, PersistenceError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, PersistenceError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, PersistenceError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, PersistenceError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a local cell coordinate triple, validating the range.
    fn cell(&mut self) -> Result<(u32, u32, u32), PersistenceError> {
        let b = self.take(3)?;
        let (x, y, z) = (u32::from(b[0]), u32::from(b[1]), u32::from(b[2]));
        if x < crate::chunk::CHUNK_WIDTH && y < crate::chunk::CHUNK_WIDTH && z < crate::chunk::CHUNK_HEIGHT
        {
            Ok((x, y, z))
        } else {
            Err(PersistenceError::Inconsistent("cell coordinate out of range"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FlatOracle;

    #[test]
    fn test_roundtrip_generated_chunk() {
        let chunk = Chunk::generate(3, -5, &FlatOracle { height: 50 }, 24);
        let bytes = serialize_chunk(&chunk);
        let restored = deserialize_chunk(&bytes).unwrap();

        assert_eq!(restored.longitude(), 3);
        assert_eq!(restored.latitude(), -5);
        // Double serialization is a canonical-form equality check.
        assert_eq!(serialize_chunk(&restored), bytes);
        assert!(restored.check_invariants());
    }

    #[test]
    fn test_roundtrip_full_variant_mix() {
        use hexplanet_core::math::hex::Direction;
        use hexplanet_core::{compress_prepend_size, decompress_size_prepended};

        // A chunk with every special variant populated: 37 liquids, 4
        // fires, 12 active grass, 2 plates, a fire-stone and a failing
        // sand block, through the full compressed envelope.
        let mut chunk = Chunk::new_empty(7, -2);
        for i in 0u32..37 {
            chunk.new_water_block(i % 16, i / 16, 60 + (i % 5), 100 + i as u16 * 7);
        }
        for i in 0u32..4 {
            let slot = chunk.new_fire(i, 10, 70);
            chunk.fire_pool.get_mut(slot).unwrap().power = 11 * (i as u16 + 1);
        }
        for i in 0u32..12 {
            chunk.new_active_grass(i, 12, 40);
        }
        chunk.new_nonstandard_block(3, 3, 80, BlockKind::Brick, Direction::Up);
        chunk.new_nonstandard_block(4, 3, 80, BlockKind::Brick, Direction::Down);
        chunk.new_light_source(9, 9, 90, 13);
        let slot = chunk.new_failing_block(8, 8, 50, BlockKind::Sand);
        chunk.failing_pool.get_mut(slot).unwrap().velocity = 3.25;

        let bytes = serialize_chunk(&chunk);
        let blob = compress_prepend_size(&bytes);
        let restored = deserialize_chunk(&decompress_size_prepended(&blob).unwrap()).unwrap();

        assert_eq!(restored.water_list.len(), 37);
        assert_eq!(restored.fire_list.len(), 4);
        assert_eq!(restored.grass_list.len(), 12);
        assert_eq!(restored.nonstandard_list.len(), 2);
        assert_eq!(restored.light_list.len(), 1);
        assert_eq!(restored.failing_list.len(), 1);

        let fires: Vec<_> = restored.fires().collect();
        assert_eq!(fires[2].power, 33);
        let failing: Vec<_> = restored.failing_blocks().collect();
        assert!((failing[0].velocity - 3.25).abs() < f32::EPSILON);

        assert_eq!(serialize_chunk(&restored), bytes);
        assert!(restored.check_invariants());
    }

    #[test]
    fn test_short_stream_rejected() {
        let chunk = Chunk::generate(0, 0, &FlatOracle { height: 40 }, 24);
        let bytes = serialize_chunk(&chunk);
        assert!(matches!(
            deserialize_chunk(&bytes[..bytes.len() / 2]),
            Err(PersistenceError::UnexpectedEof(_))
        ));
        assert!(deserialize_chunk(&[]).is_err());
    }

    #[test]
    fn test_unknown_kind_becomes_air() {
        let chunk = Chunk::new_empty(0, 0);
        let mut bytes = serialize_chunk(&chunk);
        // Poison one dense-grid ordinal (offset 12 is the first cell).
        bytes[12] = 0xFF;
        bytes[13] = 0xFF;
        let restored = deserialize_chunk(&bytes).unwrap();
        assert_eq!(restored.blocks[0].kind(), BlockKind::Air);
    }

    #[test]
    fn test_inconsistent_list_rejected() {
        let mut chunk = Chunk::new_empty(0, 0);
        chunk.new_water_block(1, 1, 30, 500);
        let mut bytes = serialize_chunk(&chunk);
        // Rewrite the water cell's grid ordinal to stone: the liquid list
        // now disagrees with the grid.
        let addr = cell_addr(1, 1, 30);
        let off = 12 + addr * 2;
        bytes[off] = BlockKind::Stone as u8;
        bytes[off + 1] = 0;
        assert!(matches!(
            deserialize_chunk(&bytes),
            Err(PersistenceError::Inconsistent(_))
        ));
    }
}
