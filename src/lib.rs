#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod constraint;
mod error;
pub mod range;
mod version;

pub use constraint::{Constraint, Constraints, Operator, Specificity};
pub use error::*;
pub use range::{Bound, Range, RangeSet};
pub use version::*;
