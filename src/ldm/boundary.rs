//! Content-defined split points over the gear hash.
//!
//! A position ends a chunk when the low `hash_rate_log` bits of the rolling
//! hash are all clear, so boundaries land every `2^hash_rate_log` bytes on
//! average and depend only on nearby content: an insertion shifts the
//! boundaries around it and leaves the rest in place.

use super::params::LdmParams;
use super::types::GearHash;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundaryDetector {
    stop_mask: u64,
    min_chunk: usize,
    max_chunk: usize,
}

impl BoundaryDetector {
    pub fn new(params: &LdmParams) -> Self {
        BoundaryDetector {
            stop_mask: params.stop_mask(),
            min_chunk: params.min_chunk_size(),
            max_chunk: params.max_chunk_size(),
        }
    }

    /// The raw split rule, ignoring chunk length limits.
    #[inline]
    pub fn is_boundary(&self, hash: GearHash) -> bool {
        hash.value() & self.stop_mask == 0
    }

    /// Split decision after feeding the byte that makes the current chunk
    /// `since_boundary` bytes long.
    ///
    /// Nothing splits before `min_chunk` bytes. Past that, a chunk ends on the
    /// split rule, once it reaches `max_chunk`, or at the end of the buffer.
    #[inline]
    pub fn should_split(&self, hash: GearHash, since_boundary: usize, at_end: bool) -> bool {
        since_boundary >= self.min_chunk
            && (at_end || since_boundary >= self.max_chunk || self.is_boundary(hash))
    }

    pub fn min_chunk(&self) -> usize {
        self.min_chunk
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }
}

/// Chunk end offsets (exclusive) of a buffer. The last item is always the
/// buffer length, even when that final chunk is shorter than `min_chunk`.
pub struct ChunkBoundaries<'a> {
    data: &'a [u8],
    detector: BoundaryDetector,
    hash: GearHash,
    position: usize,
    since_boundary: usize,
}

impl<'a> ChunkBoundaries<'a> {
    pub fn new(data: &'a [u8], detector: BoundaryDetector) -> Self {
        ChunkBoundaries {
            data,
            detector,
            hash: GearHash::default(),
            position: 0,
            since_boundary: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for ChunkBoundaries<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.position < self.data.len() {
            self.hash.update(self.data[self.position]);
            self.position += 1;
            self.since_boundary += 1;

            let at_end = self.position == self.data.len();
            if at_end || self.detector.should_split(self.hash, self.since_boundary, at_end) {
                self.since_boundary = 0;
                return Some(self.position);
            }
        }
        None
    }
}
