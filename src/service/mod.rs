//! Write protocol and validation shared by all resources.

pub mod transaction;
mod validation;
pub use transaction::{MutationTx, Stamp, Written};
pub use validation::*;
