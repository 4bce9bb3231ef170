//! Safe SQL helpers: column expressions from filter specs only, values as parameters.

pub mod constraint;
mod filter;
pub mod params;
pub use filter::*;
pub use params::*;
