use snafu::ensure;

use crate::error::*;

/// Forward cursor over the scanned buffer, plus the bounded comparisons the
/// match emitter extends with. Comparisons never read outside `data`.
pub struct DataWindow<'a> {
    pos: usize,
    limit: usize, // Exclusive bound
    data: &'a [u8],
}

impl<'a> DataWindow<'a> {
    pub fn new(start: usize, data: &'a [u8]) -> Self {
        assert!(start <= data.len());
        DataWindow {
            pos: start,
            limit: data.len(),
            data,
        }
    }

    /// Returns the byte under the cursor and steps past it.
    #[inline]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        ensure!(
            position <= self.limit,
            DataOutOfBoundsSnafu {
                position,
                limit: self.limit,
            }
        );
        self.pos = position;
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn get_remainder(&self) -> usize {
        self.limit - self.pos
    }

    pub fn is_at_limit(&self) -> bool {
        self.pos == self.limit
    }

    /// Length of the common run starting at `src` and `dst`, stopping at the
    /// end of the buffer. `src < dst`, so the source may run into the
    /// destination.
    pub fn count_forward(&self, src: usize, dst: usize) -> usize {
        debug_assert!(src < dst);
        let n = self.limit.saturating_sub(dst);
        self.data[dst..dst + n]
            .iter()
            .zip(&self.data[src..src + n])
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Length of the common run ending just before `src` and `dst`, without
    /// stepping below `src_floor` or `dst_floor`.
    pub fn count_backward(&self, src: usize, dst: usize, src_floor: usize, dst_floor: usize) -> usize {
        let n = src.saturating_sub(src_floor).min(dst.saturating_sub(dst_floor));
        (1..=n)
            .take_while(|k| self.data[src - k] == self.data[dst - k])
            .count()
    }
}
