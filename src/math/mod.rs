//! Mathematical utilities: interval (min/max) arithmetic.

pub mod range;

pub use range::*;
