pub mod error;

pub use error::{RestoreError, Result};
