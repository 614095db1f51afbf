//! Long-distance match finding.
//!
//! A gear hash rolls over the input and splits it into content-defined
//! chunks. At every chunk boundary the bytes just before it are looked up in
//! a fixed-size table of earlier boundaries; hits are verified byte for byte
//! and extended in both directions before they become a [`MatchDescriptor`].

pub mod boundary;
pub mod data_window;
pub mod gear;
pub mod map;
pub mod matcher;
pub mod params;
pub mod types;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testutil;

pub use boundary::{BoundaryDetector, ChunkBoundaries};
pub use map::{LdmEntry, LdmHashTable, LdmKey};
pub use matcher::{generate_sequences, LdmScanner, ScanStats};
pub use params::LdmParams;
pub use types::{to_raw_seqs, GearHash, MatchDescriptor, RawSeq, Sequence};
