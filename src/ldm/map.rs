use std::hash::Hasher;
use fnv::FnvHasher;

use super::boundary::{BoundaryDetector, ChunkBoundaries};
use super::params::LdmParams;

// Never a legal offset: buffers are capped below u32::MAX bytes.
pub const EMPTY_OFFSET: u32 = u32::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LdmEntry {
    pub offset: u32,
    pub checksum: u32,
}

impl Default for LdmEntry {
    fn default() -> Self {
        LdmEntry {
            offset: EMPTY_OFFSET,
            checksum: 0,
        }
    }
}

impl LdmEntry {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset == EMPTY_OFFSET
    }
}

/// Table key for the `min_match_length` bytes ending at a chunk boundary.
/// Low bits pick the bucket, the high half is kept as a checksum.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LdmKey(pub u64);

impl LdmKey {
    pub fn calculate(window: &[u8]) -> Self {
        let mut hasher = FnvHasher::default();
        hasher.write(window);
        LdmKey(hasher.finish())
    }

    #[inline]
    pub fn checksum(&self) -> u32 {
        (self.0 >> 32) as u32
    }
}

/// Fixed-capacity match table: `2^hash_log` entries split into buckets of
/// `2^bucket_size_log`. Inserting overwrites the oldest entry of a bucket.
///
/// Entries are hints. A hit may point at unrelated bytes (bucket or checksum
/// collision) and every caller verifies before use.
#[derive(Clone)]
pub struct LdmHashTable {
    entries: Vec<LdmEntry>,
    // next slot to overwrite, per bucket
    bucket_offsets: Vec<u8>,
    bucket_size_log: u32,
    bucket_mask: u64,
}

impl LdmHashTable {
    pub fn new(params: &LdmParams) -> Self {
        let bucket_size_log = params.bucket_size_log.min(params.hash_log);
        let num_buckets = 1usize << (params.hash_log - bucket_size_log);
        LdmHashTable {
            entries: vec![LdmEntry::default(); 1 << params.hash_log],
            bucket_offsets: vec![0; num_buckets],
            bucket_size_log,
            bucket_mask: num_buckets as u64 - 1,
        }
    }

    /// Forgets every entry, keeping the allocation.
    pub fn reset(&mut self) {
        self.entries.fill(LdmEntry::default());
        self.bucket_offsets.fill(0);
    }

    /// True if this table was sized for `params`.
    pub fn fits(&self, params: &LdmParams) -> bool {
        self.entries.len() == 1 << params.hash_log
            && self.bucket_size_log == params.bucket_size_log.min(params.hash_log)
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn bucket_size(&self) -> usize {
        1 << self.bucket_size_log
    }

    #[inline]
    fn bucket_index(&self, key: LdmKey) -> usize {
        (key.0 & self.bucket_mask) as usize
    }

    pub fn insert(&mut self, key: LdmKey, offset: u32) {
        let bucket = self.bucket_index(key);
        let size = self.bucket_size();
        let slot = self.bucket_offsets[bucket] as usize;
        self.entries[(bucket << self.bucket_size_log) + slot] = LdmEntry {
            offset,
            checksum: key.checksum(),
        };
        self.bucket_offsets[bucket] = ((slot + 1) & (size - 1)) as u8;
    }

    /// Offset most recently inserted into the bucket for `key`, if any.
    pub fn lookup(&self, key: LdmKey) -> Option<u32> {
        self.bucket(key).next().map(|e| e.offset)
    }

    /// Live entries of the bucket for `key`, newest first.
    pub fn bucket(&self, key: LdmKey) -> impl Iterator<Item = LdmEntry> + '_ {
        let bucket = self.bucket_index(key);
        let size = self.bucket_size();
        let base = bucket << self.bucket_size_log;
        let next = self.bucket_offsets[bucket] as usize;
        (1..=size)
            .map(move |back| self.entries[base + ((next + size - back) & (size - 1))])
            .filter(|e| !e.is_empty())
    }

    /// Indexes every chunk boundary of `data` without looking anything up.
    /// Used to prime the table with history that precedes the scanned bytes.
    pub fn fill(&mut self, data: &[u8], params: &LdmParams) {
        let min_match = params.min_chunk_size();
        let detector = BoundaryDetector::new(params);
        for split in ChunkBoundaries::new(data, detector) {
            if split < min_match {
                continue;
            }
            let start = split - min_match;
            self.insert(LdmKey::calculate(&data[start..split]), start as u32);
        }
    }
}
