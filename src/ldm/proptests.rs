use proptest::prelude::*;

use super::testutil::{check_tiling, reconstruct};
use super::*;

prop_compose! {
    /// A random prefix followed by copies of earlier slices, so that the
    /// buffer holds repeats at assorted distances and lengths.
    fn arb_buffer()(
        prefix in prop::collection::vec(any::<u8>(), 256..4096),
        copies in prop::collection::vec((any::<prop::sample::Index>(), 1usize..600, prop::collection::vec(any::<u8>(), 0..64)), 0..8),
    ) -> Vec<u8> {
        let mut data = prefix;
        for (index, len, noise) in copies {
            let src = index.index(data.len());
            let len = len.min(data.len() - src);
            let copy = data[src..src + len].to_vec();
            data.extend_from_slice(&noise);
            data.extend_from_slice(&copy);
        }
        data
    }
}

fn arb_params() -> impl Strategy<Value = LdmParams> {
    (10u32..=16, 6u32..=12, 0u32..=3, 0u32..=6, 4u32..=48).prop_map(
        |(window_log, hash_log, bucket_size_log, hash_rate_log, min_match_length)| LdmParams {
            window_log,
            hash_log,
            min_match_length,
            hash_rate_log,
            bucket_size_log,
        },
    )
}

proptest! {
    /// Property: literals and match destinations tile the buffer, and replaying
    /// them rebuilds it exactly
    #[test]
    fn prop_reconstructs_input(data in arb_buffer(), params in arb_params()) {
        let seqs = generate_sequences(&params, &data).unwrap();
        check_tiling(&seqs, 0, data.len());
        prop_assert_eq!(reconstruct(&data, 0, &seqs), data);
    }

    /// Property: every match is byte-identical, points backward and is long enough
    #[test]
    fn prop_matches_are_verified(data in arb_buffer(), params in arb_params()) {
        let seqs = generate_sequences(&params, &data).unwrap();
        for m in seqs.iter().filter_map(Sequence::as_match) {
            prop_assert!(m.length >= params.min_match_length as usize);
            prop_assert!(m.source_offset < m.destination_offset);
            prop_assert!(m.distance() <= params.max_distance());
            prop_assert_eq!(&data[m.source_range()], &data[m.destination_range()]);
        }
    }

    /// Property: scanning twice gives the same sequences
    #[test]
    fn prop_deterministic(data in arb_buffer(), params in arb_params()) {
        let first = generate_sequences(&params, &data).unwrap();
        let second = generate_sequences(&params, &data).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: no more matches than the advertised bound
    #[test]
    fn prop_sequence_bound(data in arb_buffer(), params in arb_params()) {
        let seqs = generate_sequences(&params, &data).unwrap();
        let (raw, trailing) = to_raw_seqs(&seqs);
        prop_assert!(raw.len() <= params.max_sequences(data.len()));
        let total: usize = raw.iter().map(|r| r.lit_length + r.match_length).sum::<usize>() + trailing;
        prop_assert_eq!(total, data.len());
    }
}
