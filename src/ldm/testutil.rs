use super::types::Sequence;

// xorshift64*, good enough for test payloads
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            (state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 56) as u8
        })
        .collect()
}

/// Panics unless the sequences cover `start..end` in order, with no gaps.
pub fn check_tiling(seqs: &[Sequence], start: usize, end: usize) {
    let mut expected = start;
    for (i, seq) in seqs.iter().enumerate() {
        let covered = seq.covered();
        assert_eq!(covered.start, expected, "sequence {} starts at {}", i, covered.start);
        assert!(covered.end > covered.start, "sequence {} is empty", i);
        expected = covered.end;
    }
    assert_eq!(expected, end);
}

/// Rebuilds a buffer the way a decoder would: literals come from `data`,
/// matches copy byte by byte from what was already produced.
pub fn reconstruct(data: &[u8], history: usize, seqs: &[Sequence]) -> Vec<u8> {
    let mut out = data[..history].to_vec();
    for seq in seqs {
        match seq {
            Sequence::Literals(range) => {
                assert_eq!(range.start, out.len());
                out.extend_from_slice(&data[range.clone()]);
            }
            Sequence::Match(m) => {
                assert_eq!(m.destination_offset, out.len());
                for i in 0..m.length {
                    let byte = out[m.source_offset + i];
                    out.push(byte);
                }
            }
        }
    }
    out
}
