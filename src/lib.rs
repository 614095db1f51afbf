pub mod error;
pub mod ldm;

pub use error::{Error, Result};
