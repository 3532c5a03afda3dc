//! # Pattern Arena
//!
//! Chunked storage for the canonical genotype patterns. The builder makes
//! O(num_sites) small pattern allocations whose lifetimes all end
//! together, so they are pooled into large chunks and released in one
//! bulk deallocation when the arena drops.
//!
//! Callers hold [`ArenaRef`] index handles rather than references: the
//! arena exclusively owns the bytes, sites referencing a shared pattern
//! copy the handle, and nothing is freed individually.

use crate::error::Result;

/// Default chunk size used by the ancestor builder (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Index handle for a byte run owned by a [`PatternArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaRef {
    chunk: u32,
    offset: u32,
    len: u32,
}

impl ArenaRef {
    /// Length of the referenced byte run
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bump arena for small byte runs with a single bulk deallocation.
#[derive(Debug, Default)]
pub struct PatternArena {
    chunks: Vec<Vec<u8>>,
    chunk_size: usize,
}

impl PatternArena {
    /// Create an arena that grows in chunks of `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunks: Vec::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Copy `bytes` into the arena and return a handle to the copy.
    ///
    /// Chunks are never grown past their reserved capacity, so previously
    /// issued handles stay valid across calls.
    pub fn intern(&mut self, bytes: &[u8]) -> Result<ArenaRef> {
        let fits = self
            .chunks
            .last()
            .is_some_and(|c| c.capacity() - c.len() >= bytes.len());
        if !fits {
            let mut chunk = Vec::new();
            chunk.try_reserve_exact(self.chunk_size.max(bytes.len()))?;
            self.chunks.try_reserve(1)?;
            self.chunks.push(chunk);
        }
        let chunk_idx = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_idx];
        let offset = chunk.len();
        chunk.extend_from_slice(bytes);
        Ok(ArenaRef {
            chunk: chunk_idx as u32,
            offset: offset as u32,
            len: bytes.len() as u32,
        })
    }

    /// Resolve a handle to the referenced bytes.
    #[inline]
    pub fn get(&self, r: ArenaRef) -> &[u8] {
        let start = r.offset as usize;
        &self.chunks[r.chunk as usize][start..start + r.len as usize]
    }

    /// Total bytes reserved across all chunks (diagnostic).
    pub fn allocated_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.capacity()).sum()
    }
}
