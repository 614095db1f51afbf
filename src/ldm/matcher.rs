use snafu::ensure;
use tracing::{debug, trace};

use crate::error::*;
use super::boundary::BoundaryDetector;
use super::data_window::DataWindow;
use super::map::{LdmHashTable, LdmKey, EMPTY_OFFSET};
use super::params::LdmParams;
use super::types::*;

/// Counters for one scan.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Chunk boundaries probed against the table.
    pub boundaries: usize,
    /// Table entries whose checksum matched and were verified.
    pub candidates: usize,
    /// Verified candidates that fell short of `min_match_length`.
    pub rejected: usize,
    pub matches: usize,
    pub matched_bytes: usize,
}

/// Single forward pass over a buffer that yields literal spans and
/// long-distance matches in order.
///
/// The spans and match destinations tile `[history, data.len())` with no gap
/// or overlap. The table is borrowed exclusively; reuse it across jobs by
/// calling [`LdmHashTable::reset`] in between.
pub struct LdmScanner<'a> {
    params: LdmParams,
    detector: BoundaryDetector,
    table: &'a mut LdmHashTable,
    window: DataWindow<'a>,
    hash: GearHash,
    since_boundary: usize,
    // start of the literals not yet handed out
    anchor: usize,
    pending: Option<MatchDescriptor>,
    stats: ScanStats,
    done: bool,
}

impl<'a> LdmScanner<'a> {
    pub fn new(params: &LdmParams, data: &'a [u8], table: &'a mut LdmHashTable) -> Result<Self> {
        Self::with_history(params, data, 0, table)
    }

    /// Scans `data[history..]`. The first `history` bytes are indexed first
    /// and matches may point into them, but they are never emitted.
    pub fn with_history(
        params: &LdmParams,
        data: &'a [u8],
        history: usize,
        table: &'a mut LdmHashTable,
    ) -> Result<Self> {
        params.validate()?;
        ensure!(
            history <= data.len(),
            HistoryExceedsBufferSnafu {
                history,
                len: data.len(),
            }
        );
        ensure!(
            data.len() < EMPTY_OFFSET as usize,
            BufferTooLargeSnafu {
                len: data.len(),
                max: EMPTY_OFFSET as usize - 1,
            }
        );
        if !table.fits(params) {
            *table = LdmHashTable::new(params);
        }
        if history > 0 {
            table.fill(&data[..history], params);
        }

        debug!(len = data.len(), history, ?params, "starting long-distance scan");

        Ok(LdmScanner {
            params: *params,
            detector: BoundaryDetector::new(params),
            table,
            window: DataWindow::new(history, data),
            hash: GearHash::default(),
            since_boundary: 0,
            anchor: history,
            pending: None,
            stats: ScanStats::default(),
            done: false,
        })
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn position(&self) -> usize {
        self.window.position()
    }

    // Probe the table for the window ending at `split`, then index it.
    fn check_boundary(&mut self, split: usize) -> Option<MatchDescriptor> {
        let min_match = self.params.min_chunk_size();
        let data = self.window.data();
        let cur = split - min_match;
        let key = LdmKey::calculate(&data[cur..split]);
        let checksum = key.checksum();
        let max_distance = self.params.max_distance();
        self.stats.boundaries += 1;

        // (total, backward, candidate)
        let mut best: Option<(usize, usize, usize)> = None;
        for entry in self.table.bucket(key) {
            let candidate = entry.offset as usize;
            if entry.checksum != checksum || candidate >= cur || cur - candidate > max_distance {
                continue;
            }
            self.stats.candidates += 1;

            let forward = self.window.count_forward(candidate, cur);
            let backward = self.window.count_backward(candidate, cur, 0, self.anchor);
            let total = forward + backward;
            if total < min_match {
                self.stats.rejected += 1;
                continue;
            }
            if best.map_or(true, |(t, _, _)| total > t) {
                best = Some((total, backward, candidate));
            }
        }

        self.table.insert(key, cur as u32);

        best.map(|(length, backward, candidate)| MatchDescriptor {
            source_offset: candidate - backward,
            destination_offset: cur - backward,
            length,
        })
    }

    fn emit(&mut self, m: MatchDescriptor) -> Sequence {
        trace!(
            source = m.source_offset,
            destination = m.destination_offset,
            length = m.length,
            "long-distance match"
        );
        self.stats.matches += 1;
        self.stats.matched_bytes += m.length;

        let literals = self.anchor..m.destination_offset;
        self.anchor = m.destination_end();
        // bytes inside the match are never hashed or probed
        if self.window.seek(self.anchor).is_err() {
            self.done = true;
        }
        self.hash.reset();
        self.since_boundary = 0;

        if literals.is_empty() {
            Sequence::Match(m)
        } else {
            self.pending = Some(m);
            Sequence::Literals(literals)
        }
    }

    fn finish(&mut self) -> Option<Sequence> {
        self.done = true;
        debug!(stats = ?self.stats, "long-distance scan complete");

        let len = self.window.data().len();
        if self.anchor < len {
            let literals = self.anchor..len;
            self.anchor = len;
            Some(Sequence::Literals(literals))
        } else {
            None
        }
    }
}

impl<'a> Iterator for LdmScanner<'a> {
    type Item = Sequence;

    fn next(&mut self) -> Option<Sequence> {
        if let Some(m) = self.pending.take() {
            return Some(Sequence::Match(m));
        }
        if self.done {
            return None;
        }

        // Advance byte-by-byte, probing the table at every chunk boundary
        while let Some(byte) = self.window.next_byte() {
            self.hash.update(byte);
            self.since_boundary += 1;

            let at_end = self.window.is_at_limit();
            if !self.detector.should_split(self.hash, self.since_boundary, at_end) {
                continue;
            }
            self.since_boundary = 0;

            if let Some(m) = self.check_boundary(self.window.position()) {
                return Some(self.emit(m));
            }
        }

        self.finish()
    }
}

/// Scans `data` with a fresh table and collects the result.
pub fn generate_sequences(params: &LdmParams, data: &[u8]) -> Result<Vec<Sequence>> {
    params.validate()?;
    let mut table = LdmHashTable::new(params);
    let scanner = LdmScanner::new(params, data, &mut table)?;
    Ok(scanner.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldm::testutil::{check_tiling, random_bytes, reconstruct};

    fn params(window_log: u32, hash_rate_log: u32, min_match_length: u32) -> LdmParams {
        LdmParams::for_window_log(window_log)
            .with_hash_log(16)
            .with_hash_rate_log(hash_rate_log)
            .with_min_match_length(min_match_length)
    }

    fn matches(seqs: &[Sequence]) -> Vec<MatchDescriptor> {
        seqs.iter().filter_map(|s| s.as_match().copied()).collect()
    }

    #[test]
    fn duplicated_block_is_one_match() {
        let block = random_bytes(32 * 1024, 11);
        let mut data = block.clone();
        data.extend_from_slice(&block);

        let params = params(16, 6, 64);
        let seqs = generate_sequences(&params, &data).unwrap();
        check_tiling(&seqs, 0, data.len());

        let found = matches(&seqs);
        assert_eq!(found.len(), 1, "{:?}", found);
        let m = found[0];
        assert_eq!(m.source_offset, 0);
        assert_eq!(m.destination_offset, 32 * 1024);
        assert_eq!(m.length, 32 * 1024);
        assert_eq!(seqs, vec![Sequence::Literals(0..32 * 1024), Sequence::Match(m)]);
        assert_eq!(reconstruct(&data, 0, &seqs), data);
    }

    #[test]
    fn zero_run_matches_itself() {
        let data = vec![0u8; 1024];
        let params = params(16, 0, 16);
        let seqs = generate_sequences(&params, &data).unwrap();

        assert_eq!(
            seqs,
            vec![
                Sequence::Literals(0..16),
                Sequence::Match(MatchDescriptor {
                    source_offset: 0,
                    destination_offset: 16,
                    length: 1008,
                }),
            ]
        );
        assert!(seqs[1].as_match().unwrap().is_overlapping());
        assert_eq!(reconstruct(&data, 0, &seqs), data);
    }

    #[test]
    fn zero_run_with_forced_cuts() {
        // no natural boundaries in a run; forced cuts every 128 bytes still find it
        let data = vec![0u8; 1024];
        let params = params(16, 4, 16);
        let seqs = generate_sequences(&params, &data).unwrap();
        check_tiling(&seqs, 0, data.len());

        let found = matches(&seqs);
        assert!(!found.is_empty());
        let covered: usize = found.iter().map(|m| m.length).sum();
        assert!(covered >= 1024 - params.max_chunk_size(), "covered {}", covered);
        assert!(found.iter().all(|m| m.is_overlapping()));
        assert_eq!(reconstruct(&data, 0, &seqs), data);
    }

    #[test]
    fn unique_data_is_all_literals() {
        let data = random_bytes(64 * 1024, 12);
        let params = params(16, 4, 16);
        let mut table = LdmHashTable::new(&params);
        let mut scanner = LdmScanner::new(&params, &data, &mut table).unwrap();
        let seqs: Vec<Sequence> = scanner.by_ref().collect();

        assert_eq!(seqs, vec![Sequence::Literals(0..data.len())]);
        let stats = scanner.stats();
        assert_eq!(stats.matches, 0);
        assert!(stats.boundaries > 1000);
    }

    #[test]
    fn empty_and_short_buffers() {
        let params = params(16, 4, 16);
        assert!(generate_sequences(&params, &[]).unwrap().is_empty());
        assert_eq!(
            generate_sequences(&params, &[1, 2, 3]).unwrap(),
            vec![Sequence::Literals(0..3)]
        );
    }

    #[test]
    fn matches_respect_window() {
        let block = random_bytes(4096, 13);
        let filler = random_bytes(8192, 14);
        let mut data = block.clone();
        data.extend_from_slice(&filler);
        data.extend_from_slice(&block);

        // distance 12288 is beyond a 2^13 window
        let near = generate_sequences(&params(13, 5, 32), &data).unwrap();
        assert!(matches(&near).is_empty());

        let far = generate_sequences(&params(14, 5, 32), &data).unwrap();
        let found = matches(&far);
        assert!(!found.is_empty());
        assert!(found.iter().all(|m| m.distance() == 12288));
    }

    #[test]
    fn history_is_matchable_but_not_emitted() {
        let block = random_bytes(8192, 15);
        let mut data = block.clone();
        data.extend_from_slice(&random_bytes(1000, 16));
        data.extend_from_slice(&block);
        let history = 8192;

        let params = params(16, 5, 32);
        let mut table = LdmHashTable::new(&params);
        let seqs: Vec<Sequence> = LdmScanner::with_history(&params, &data, history, &mut table)
            .unwrap()
            .collect();
        check_tiling(&seqs, history, data.len());

        let found = matches(&seqs);
        assert_eq!(found.len(), 1, "{:?}", found);
        assert_eq!(found[0].source_offset, 0);
        assert_eq!(found[0].destination_offset, 9192);
        assert_eq!(found[0].length, 8192);
        assert_eq!(reconstruct(&data, history, &seqs), data);
    }

    #[test]
    fn rejects_bad_configuration() {
        let data = [0u8; 64];
        let mut table = LdmHashTable::new(&params(16, 4, 16));

        let bad = params(16, 4, 16).with_min_match_length(0);
        assert!(matches!(
            LdmScanner::new(&bad, &data, &mut table),
            Err(Error::MinMatchLengthOutOfRange { .. })
        ));
        assert!(matches!(
            LdmScanner::with_history(&params(16, 4, 16), &data, 65, &mut table),
            Err(Error::HistoryExceedsBuffer { history: 65, len: 64 })
        ));
        assert!(matches!(
            generate_sequences(&params(40, 4, 16), &data),
            Err(Error::WindowLogOutOfRange { .. })
        ));
    }

    #[test]
    fn table_is_resized_and_reusable() {
        let block = random_bytes(4096, 17);
        let mut data = block.clone();
        data.extend_from_slice(&block);

        let params = params(16, 5, 32);
        let mut table = LdmHashTable::new(&params.with_hash_log(8));
        let first: Vec<Sequence> = LdmScanner::new(&params, &data, &mut table).unwrap().collect();
        assert!(table.fits(&params));

        table.reset();
        let second: Vec<Sequence> = LdmScanner::new(&params, &data, &mut table).unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(matches(&first).len(), 1);
    }

    #[test]
    fn stale_entries_are_verified() {
        // a table left over from other content must not produce matches
        let params = params(16, 4, 16);
        let mut table = LdmHashTable::new(&params);
        let old = random_bytes(16 * 1024, 18);
        let _: Vec<Sequence> = LdmScanner::new(&params, &old, &mut table).unwrap().collect();

        let fresh = random_bytes(16 * 1024, 19);
        let seqs: Vec<Sequence> = LdmScanner::new(&params, &fresh, &mut table).unwrap().collect();
        assert_eq!(seqs, vec![Sequence::Literals(0..fresh.len())]);
    }

    #[test]
    fn every_match_is_verified() {
        let mut data = random_bytes(20_000, 20);
        // sprinkle repeats of varying length at varying distances
        for (src, dst, len) in [(100, 5000, 300), (2000, 9000, 40), (7000, 15000, 2000), (0, 19000, 900)] {
            let copy = data[src..src + len].to_vec();
            data[dst..dst + len].copy_from_slice(&copy);
        }
        let params = params(16, 4, 24);
        let seqs = generate_sequences(&params, &data).unwrap();
        check_tiling(&seqs, 0, data.len());
        for m in matches(&seqs) {
            assert!(m.length >= 24);
            assert!(m.source_offset < m.destination_offset);
            assert_eq!(data[m.source_range()], data[m.destination_range()]);
        }
        assert!(matches(&seqs).len() >= 2);
        assert_eq!(reconstruct(&data, 0, &seqs), data);
    }

    #[test]
    fn parallel_scans_share_gear_table() {
        let block = random_bytes(8192, 21);
        let mut data = block.clone();
        data.extend_from_slice(&block);
        let params = params(16, 5, 32);

        let expected = generate_sequences(&params, &data).unwrap();
        let results: Vec<Vec<Sequence>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| generate_sequences(&params, &data).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|r| *r == expected));
    }
}
