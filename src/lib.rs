pub mod cli;
pub mod error;
pub mod frontend;
pub mod ir;
pub mod liveness;
pub mod registers;
pub mod scheduler;
pub mod verification;

#[cfg(test)]
mod test_helpers;

pub use error::{Error, Result};
