use tracing_subscriber::EnvFilter;
use zldm::ldm::*;
use zldm::Result;

// Two copies of a pseudo-random block with unrelated bytes in between.
fn synthetic(block_len: usize, gap: usize) -> Vec<u8> {
    let mut state = 0xDEAD_BEEFu32;
    let mut next = move || {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        (state >> 16) as u8
    };
    let block: Vec<u8> = (0..block_len).map(|_| next()).collect();
    let mut data = block.clone();
    data.extend((0..gap).map(|_| next()));
    data.extend_from_slice(&block);
    data
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data = match std::env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => synthetic(1 << 20, 3 << 20),
    };

    let params = LdmParams::default();
    let mut table = LdmHashTable::new(&params);
    println!(
        "Scanning {} bytes (window 2^{}, table {} KiB)...",
        data.len(),
        params.window_log,
        params.table_size_bytes() / 1024
    );

    let mut scanner = LdmScanner::new(&params, &data, &mut table)?;
    let sequences: Vec<Sequence> = scanner.by_ref().collect();
    let stats = scanner.stats();

    for m in sequences.iter().filter_map(Sequence::as_match) {
        println!(
            "match: {} bytes at {} from {} back",
            m.length,
            m.destination_offset,
            m.distance()
        );
    }
    let (raw, trailing) = to_raw_seqs(&sequences);
    println!(
        "{} matches covering {} bytes, {} boundaries probed, {} trailing literals",
        raw.len(),
        stats.matched_bytes,
        stats.boundaries,
        trailing
    );
    Ok(())
}
