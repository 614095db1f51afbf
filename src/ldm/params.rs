use snafu::ensure;

use crate::error::*;
use super::map::LdmEntry;

pub const WINDOW_LOG_MIN: u32 = 10;
#[cfg(target_pointer_width = "64")]
pub const WINDOW_LOG_MAX: u32 = 31;
#[cfg(not(target_pointer_width = "64"))]
pub const WINDOW_LOG_MAX: u32 = 30;

pub const HASH_LOG_MIN: u32 = 6;
pub const HASH_LOG_MAX: u32 = 30;
pub const BUCKET_SIZE_LOG_MAX: u32 = 8;
pub const HASH_RATE_LOG_MAX: u32 = WINDOW_LOG_MAX - HASH_LOG_MIN;
pub const MIN_MATCH_LENGTH_MIN: u32 = 4;
pub const MIN_MATCH_LENGTH_MAX: u32 = 4096;

pub const DEFAULT_WINDOW_LOG: u32 = 27;
pub const DEFAULT_BUCKET_SIZE_LOG: u32 = 3;
pub const DEFAULT_MIN_MATCH_LENGTH: u32 = 64;
// hash_log defaults to window_log minus this
pub const HASH_RLOG: u32 = 7;

// Forced cut after this many expected chunk lengths without a boundary
const MAX_CHUNK_FACTOR_LOG: u32 = 3;

/// Long-distance matcher configuration.
///
/// A zero in any field other than `window_log` means "derive it", which
/// [`LdmParams::adjust`] does. Scanning only validates, it never adjusts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LdmParams {
    /// log2 of the largest match distance.
    pub window_log: u32,
    /// log2 of the number of match-table entries.
    pub hash_log: u32,
    /// Shortest match worth emitting; also the minimum chunk length.
    pub min_match_length: u32,
    /// log2 of the expected distance between chunk boundaries.
    pub hash_rate_log: u32,
    /// log2 of the entries per match-table bucket.
    pub bucket_size_log: u32,
}

impl Default for LdmParams {
    fn default() -> Self {
        Self::for_window_log(DEFAULT_WINDOW_LOG)
    }
}

impl LdmParams {
    pub fn for_window_log(window_log: u32) -> Self {
        let mut params = LdmParams {
            window_log,
            hash_log: 0,
            min_match_length: 0,
            hash_rate_log: 0,
            bucket_size_log: 0,
        };
        params.adjust();
        params
    }

    /// Fills every zero field with the value derived from `window_log`.
    pub fn adjust(&mut self) {
        if self.bucket_size_log == 0 {
            self.bucket_size_log = DEFAULT_BUCKET_SIZE_LOG;
        }
        if self.min_match_length == 0 {
            self.min_match_length = DEFAULT_MIN_MATCH_LENGTH;
        }
        if self.hash_log == 0 {
            self.hash_log = HASH_LOG_MIN.max(self.window_log.saturating_sub(HASH_RLOG));
        }
        if self.hash_rate_log == 0 {
            self.hash_rate_log = self.window_log.saturating_sub(self.hash_log);
        }
        self.bucket_size_log = self.bucket_size_log.min(self.hash_log);
    }

    pub fn with_hash_log(mut self, hash_log: u32) -> Self {
        self.hash_log = hash_log;
        self
    }

    pub fn with_min_match_length(mut self, min_match_length: u32) -> Self {
        self.min_match_length = min_match_length;
        self
    }

    pub fn with_hash_rate_log(mut self, hash_rate_log: u32) -> Self {
        self.hash_rate_log = hash_rate_log;
        self
    }

    pub fn with_bucket_size_log(mut self, bucket_size_log: u32) -> Self {
        self.bucket_size_log = bucket_size_log;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (WINDOW_LOG_MIN..=WINDOW_LOG_MAX).contains(&self.window_log),
            WindowLogOutOfRangeSnafu {
                window_log: self.window_log,
                min: WINDOW_LOG_MIN,
                max: WINDOW_LOG_MAX,
            }
        );
        ensure!(
            (HASH_LOG_MIN..=HASH_LOG_MAX).contains(&self.hash_log),
            HashLogOutOfRangeSnafu {
                hash_log: self.hash_log,
                min: HASH_LOG_MIN,
                max: HASH_LOG_MAX,
            }
        );
        let bucket_max = BUCKET_SIZE_LOG_MAX.min(self.hash_log);
        ensure!(
            self.bucket_size_log <= bucket_max,
            BucketSizeLogOutOfRangeSnafu {
                bucket_size_log: self.bucket_size_log,
                max: bucket_max,
            }
        );
        ensure!(
            self.hash_rate_log <= HASH_RATE_LOG_MAX,
            HashRateLogOutOfRangeSnafu {
                hash_rate_log: self.hash_rate_log,
                max: HASH_RATE_LOG_MAX,
            }
        );
        ensure!(
            (MIN_MATCH_LENGTH_MIN..=MIN_MATCH_LENGTH_MAX).contains(&self.min_match_length),
            MinMatchLengthOutOfRangeSnafu {
                min_match_length: self.min_match_length,
                min: MIN_MATCH_LENGTH_MIN,
                max: MIN_MATCH_LENGTH_MAX,
            }
        );
        Ok(())
    }

    #[inline]
    pub fn max_distance(&self) -> usize {
        1usize << self.window_log
    }

    /// Low `hash_rate_log` bits; a position splits when the hash has them all clear.
    #[inline]
    pub fn stop_mask(&self) -> u64 {
        (1u64 << self.hash_rate_log) - 1
    }

    #[inline]
    pub fn min_chunk_size(&self) -> usize {
        self.min_match_length as usize
    }

    pub fn max_chunk_size(&self) -> usize {
        let expected = 1usize << (self.hash_rate_log + MAX_CHUNK_FACTOR_LOG);
        expected.max(2 * self.min_chunk_size())
    }

    /// Upper bound on the matches a scan of `src_len` bytes can emit.
    pub fn max_sequences(&self, src_len: usize) -> usize {
        src_len / self.min_match_length.max(1) as usize
    }

    /// Bytes an [`LdmHashTable`](super::map::LdmHashTable) for these params allocates.
    pub fn table_size_bytes(&self) -> usize {
        let entries = 1usize << self.hash_log;
        let buckets = 1usize << (self.hash_log - self.bucket_size_log.min(self.hash_log));
        entries * std::mem::size_of::<LdmEntry>() + buckets
    }
}
