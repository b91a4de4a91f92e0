//! # Chunk Loader
//!
//! On-disk store for compressed chunk blobs, bucketed into region files of
//! 24×20 chunks under the world directory. A region is read whole on first
//! touch and kept in memory while any of its chunks is referenced; when
//! the window releases the last chunk of a region, the region flushes to
//! disk and drops. Corrupt region files are logged and treated as empty —
//! the affected chunks regenerate from the oracle.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::persistence::PersistenceError;

/// Region width in chunks (longitude).
pub const REGION_SIZE_X: i32 = 24;
/// Region height in chunks (latitude).
pub const REGION_SIZE_Y: i32 = 20;

const REGION_SLOTS: usize = (REGION_SIZE_X * REGION_SIZE_Y) as usize;
const REGION_MAGIC: u32 = 0x4858_5247; // "HXRG"

struct Region {
    /// Compressed blob per slot; empty = no saved chunk.
    chunks: Vec<Vec<u8>>,
    /// Chunks of this region currently referenced by the window.
    used: u32,
    dirty: bool,
}

/// Region-file backed chunk blob store.
pub struct ChunkLoader {
    directory: PathBuf,
    regions: HashMap<(i32, i32), Region>,
}

impl ChunkLoader {
    /// Opens (creating if needed) the region store under `directory`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created.
    pub fn new(directory: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(directory)?;
        Ok(Self {
            directory: directory.to_owned(),
            regions: HashMap::new(),
        })
    }

    /// Compressed blob for chunk `(longitude, latitude)`; empty when the
    /// chunk was never saved. Takes a window reference on the chunk's
    /// region; pair every call with a later [`Self::free`].
    pub fn chunk_data(&mut self, longitude: i32, latitude: i32) -> &[u8] {
        let (key, slot) = region_slot(longitude, latitude);
        let region = self.region_mut(key);
        region.used += 1;
        &region.chunks[slot]
    }

    /// Replaces the saved blob for chunk `(longitude, latitude)`.
    pub fn store(&mut self, longitude: i32, latitude: i32, blob: Vec<u8>) {
        let (key, slot) = region_slot(longitude, latitude);
        let region = self.region_mut(key);
        region.chunks[slot] = blob;
        region.dirty = true;
    }

    /// Releases the window reference taken by [`Self::chunk_data`]. The
    /// region flushes and drops when its last reference goes away.
    pub fn free(&mut self, longitude: i32, latitude: i32) {
        let (key, _) = region_slot(longitude, latitude);
        let Some(region) = self.regions.get_mut(&key) else {
            debug_assert!(false, "free without matching chunk_data");
            return;
        };
        region.used = region.used.saturating_sub(1);
        if region.used == 0 {
            let region = self.regions.remove(&key);
            if let Some(region) = region {
                if region.dirty {
                    if let Err(e) = write_region(&region_path(&self.directory, key), &region) {
                        log::error!("failed to flush region {key:?}: {e}");
                    }
                }
            }
        }
    }

    /// Flushes every dirty in-memory region to disk.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error; remaining regions are still attempted
    /// on the next call.
    pub fn force_save_all(&mut self) -> Result<(), PersistenceError> {
        let mut first_error = None;
        for (&key, region) in &mut self.regions {
            if !region.dirty {
                continue;
            }
            match write_region(&region_path(&self.directory, key), region) {
                Ok(()) => region.dirty = false,
                Err(e) => {
                    log::error!("failed to save region {key:?}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            None => Ok(()),
            Some(e) => Err(e.into()),
        }
    }

    fn region_mut(&mut self, key: (i32, i32)) -> &mut Region {
        let directory = &self.directory;
        self.regions.entry(key).or_insert_with(|| {
            let path = region_path(directory, key);
            match read_region(&path) {
                Ok(Some(region)) => region,
                Ok(None) => Region::empty(),
                Err(e) => {
                    log::warn!(
                        "corrupt region file {}: {e}; treating as empty",
                        path.display()
                    );
                    Region::empty()
                }
            }
        })
    }
}

impl Region {
    fn empty() -> Self {
        Self {
            chunks: vec![Vec::new(); REGION_SLOTS],
            used: 0,
            dirty: false,
        }
    }
}

fn region_slot(longitude: i32, latitude: i32) -> ((i32, i32), usize) {
    let rx = longitude.div_euclid(REGION_SIZE_X);
    let ry = latitude.div_euclid(REGION_SIZE_Y);
    let sx = longitude.rem_euclid(REGION_SIZE_X);
    let sy = latitude.rem_euclid(REGION_SIZE_Y);
    #[allow(clippy::cast_sign_loss)]
    let slot = (sx + sy * REGION_SIZE_X) as usize;
    ((rx, ry), slot)
}

fn region_path(directory: &Path, (rx, ry): (i32, i32)) -> PathBuf {
    directory.join(format!("region_{rx}_{ry}.hxr"))
}

fn read_region(path: &Path) -> std::io::Result<Option<Region>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    fn truncated() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "truncated region file")
    }

    let mut at = 0usize;
    let read_u32 = |at: &mut usize| -> std::io::Result<u32> {
        let end = at
            .checked_add(4)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(truncated)?;
        let v = u32::from_le_bytes([bytes[*at], bytes[*at + 1], bytes[*at + 2], bytes[*at + 3]]);
        *at = end;
        Ok(v)
    };

    if read_u32(&mut at)? != REGION_MAGIC {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "bad region magic",
        ));
    }

    let mut region = Region::empty();
    for slot in 0..REGION_SLOTS {
        let len = read_u32(&mut at)? as usize;
        let end = at
            .checked_add(len)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(truncated)?;
        region.chunks[slot] = bytes[at..end].to_vec();
        at = end;
    }
    Ok(Some(region))
}

fn write_region(path: &Path, region: &Region) -> std::io::Result<()> {
    let mut out = Vec::with_capacity(
        4 + region.chunks.iter().map(|c| 4 + c.len()).sum::<usize>(),
    );
    out.extend_from_slice(&REGION_MAGIC.to_le_bytes());
    for blob in &region.chunks {
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        out.extend_from_slice(blob);
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hexplanet_loader_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_chunk_is_empty() {
        let dir = temp_dir("missing");
        let mut loader = ChunkLoader::new(&dir).unwrap();
        assert!(loader.chunk_data(5, 5).is_empty());
        loader.free(5, 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_survives_region_unload() {
        let dir = temp_dir("unload");
        let mut loader = ChunkLoader::new(&dir).unwrap();

        assert!(loader.chunk_data(2, 3).is_empty());
        loader.store(2, 3, vec![1, 2, 3, 4]);
        // Last reference released: region flushes and drops.
        loader.free(2, 3);

        assert_eq!(loader.chunk_data(2, 3), &[1, 2, 3, 4]);
        loader.free(2, 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_force_save_and_reopen() {
        let dir = temp_dir("reopen");
        {
            let mut loader = ChunkLoader::new(&dir).unwrap();
            let _ = loader.chunk_data(-1, -1);
            loader.store(-1, -1, vec![9; 100]);
            loader.force_save_all().unwrap();
        }
        let mut loader = ChunkLoader::new(&dir).unwrap();
        assert_eq!(loader.chunk_data(-1, -1), vec![9; 100].as_slice());
        loader.free(-1, -1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_negative_coordinates_bucketing() {
        // Chunks around the origin land in four distinct regions without
        // slot collisions.
        let coords = [(-1, -1), (0, 0), (-1, 0), (0, -1), (-24, 0), (23, 19)];
        let mut seen = std::collections::HashSet::new();
        for (lon, lat) in coords {
            let (key, slot) = region_slot(lon, lat);
            assert!(slot < REGION_SLOTS);
            assert!(seen.insert((key, slot)), "collision at ({lon},{lat})");
        }
        assert_eq!(region_slot(0, 0).0, (0, 0));
        assert_eq!(region_slot(-1, -1).0, (-1, -1));
    }

    #[test]
    fn test_corrupt_region_treated_empty() {
        let dir = temp_dir("corrupt");
        std::fs::write(region_path(&dir, (0, 0)), b"garbage").unwrap();
        let mut loader = ChunkLoader::new(&dir).unwrap();
        assert!(loader.chunk_data(0, 0).is_empty());
        loader.free(0, 0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
