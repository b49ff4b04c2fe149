//! Tests for the crate.

use static_assertions::assert_impl_all;

use semrange::*;

mod equivalence;
mod range;

assert_impl_all!(Version: Send, Sync, Clone, Ord);
assert_impl_all!(Constraint: Send, Sync, Clone);
assert_impl_all!(Constraints: Send, Sync, Clone);
assert_impl_all!(Range: Send, Sync, Clone);
assert_impl_all!(RangeSet: Send, Sync, Clone);
assert_impl_all!(Error: Send, Sync, std::error::Error, miette::Diagnostic);
