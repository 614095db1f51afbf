use std::ops::Range;

use super::gear;

/// Cumulative gear hash. Recent bytes dominate the low bits because every
/// update shifts the accumulator left by one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GearHash(pub u64);

impl GearHash {
    // Fold a whole slice into a fresh hash
    #[inline]
    pub fn calculate(data: &[u8]) -> Self {
        data.iter().fold(GearHash::default(), |acc, b| acc.advance(*b))
    }

    // Hash after feeding one more byte; overflow wraps
    #[inline]
    pub fn advance(self, byte: u8) -> Self {
        GearHash((self.0 << 1).wrapping_add(gear::lookup(byte)))
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        *self = self.advance(byte);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A verified repeat: `length` bytes at `destination_offset` equal the bytes
/// at `source_offset`.
///
/// The source always lies before the destination. When `distance() < length`
/// the two ranges overlap and the copy has to run front to back, the way an
/// LZ77 decoder replays a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchDescriptor {
    pub source_offset: usize,
    pub destination_offset: usize,
    pub length: usize,
}

impl MatchDescriptor {
    #[inline]
    pub fn distance(&self) -> usize {
        self.destination_offset - self.source_offset
    }

    #[inline]
    pub fn is_overlapping(&self) -> bool {
        self.distance() < self.length
    }

    pub fn source_range(&self) -> Range<usize> {
        self.source_offset..self.source_offset + self.length
    }

    pub fn destination_range(&self) -> Range<usize> {
        self.destination_offset..self.destination_offset + self.length
    }

    #[inline]
    pub fn destination_end(&self) -> usize {
        self.destination_offset + self.length
    }
}

/// One step of a scan: either a span the caller has to encode some other
/// way, or a long-distance match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sequence {
    Literals(Range<usize>),
    Match(MatchDescriptor),
}

impl Sequence {
    /// Destination bytes this step accounts for.
    pub fn covered(&self) -> Range<usize> {
        match self {
            Sequence::Literals(range) => range.clone(),
            Sequence::Match(m) => m.destination_range(),
        }
    }

    pub fn as_match(&self) -> Option<&MatchDescriptor> {
        match self {
            Sequence::Match(m) => Some(m),
            Sequence::Literals(_) => None,
        }
    }
}

/// Sequence in the shape a block compressor consumes: literals first, then a
/// back-reference `offset` bytes behind the match start.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSeq {
    pub lit_length: usize,
    pub match_length: usize,
    pub offset: usize,
}

/// Folds literal spans into the following match. Returns the raw sequences
/// and the number of literals left after the last match.
pub fn to_raw_seqs(sequences: &[Sequence]) -> (Vec<RawSeq>, usize) {
    let mut raw = Vec::new();
    let mut pending = 0;
    for seq in sequences {
        match seq {
            Sequence::Literals(range) => pending += range.len(),
            Sequence::Match(m) => {
                raw.push(RawSeq {
                    lit_length: pending,
                    match_length: m.length,
                    offset: m.distance(),
                });
                pending = 0;
            }
        }
    }
    (raw, pending)
}
