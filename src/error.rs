use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("window_log {} outside supported range [{}, {}]", window_log, min, max))]
    WindowLogOutOfRange {
        window_log: u32,
        min: u32,
        max: u32,
    },

    #[snafu(display("hash_log {} outside supported range [{}, {}]", hash_log, min, max))]
    HashLogOutOfRange {
        hash_log: u32,
        min: u32,
        max: u32,
    },

    #[snafu(display("bucket_size_log {} outside supported range [0, {}]", bucket_size_log, max))]
    BucketSizeLogOutOfRange {
        bucket_size_log: u32,
        max: u32,
    },

    #[snafu(display("hash_rate_log {} outside supported range [0, {}]", hash_rate_log, max))]
    HashRateLogOutOfRange {
        hash_rate_log: u32,
        max: u32,
    },

    #[snafu(display("min_match_length {} outside supported range [{}, {}]", min_match_length, min, max))]
    MinMatchLengthOutOfRange {
        min_match_length: u32,
        min: u32,
        max: u32,
    },

    #[snafu(display("history of {} bytes exceeds buffer of {} bytes", history, len))]
    HistoryExceedsBuffer {
        history: usize,
        len: usize,
    },

    #[snafu(display("buffer of {} bytes exceeds the {} byte offset limit", len, max))]
    BufferTooLarge {
        len: usize,
        max: usize,
    },

    #[snafu(display("DataWindow out of bounds: pos {} > limit {}", position, limit))]
    DataOutOfBounds {
        position: usize,
        limit: usize,
    },

    #[snafu(display("I/O error: {:#?}", error))]
    Io {
        error: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { error }
    }
}
