//! Compiled ranges and direct evaluation must always agree.

use proptest::prelude::*;
use strum::IntoEnumIterator;

use semrange::{Constraint, Constraints, Operator, RangeSet, Specificity, Version};

const IDENTIFIERS: [&str; 7] = ["0", "1", "2", "11", "alpha", "beta", "rc"];

fn prerelease() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(IDENTIFIERS.to_vec()), 0..3)
        .prop_map(|identifiers| identifiers.join("."))
}

/// Small numbers, occasionally at the integer limit where boundaries carry.
fn component() -> impl Strategy<Value = u64> {
    prop_oneof![5 => 0..3u64, 1 => Just(u64::MAX)]
}

fn version() -> impl Strategy<Value = Version> {
    (
        component(),
        component(),
        component(),
        prop::collection::vec(component(), 0..3),
        prerelease(),
    )
        .prop_map(|(major, minor, patch, extra, prerelease)| {
            Version::builder()
                .major(major)
                .minor(minor)
                .patch(patch)
                .extra(extra)
                .prerelease(prerelease)
                .build()
        })
}

fn specificity() -> impl Strategy<Value = Specificity> {
    prop::sample::select(vec![
        Specificity::Full,
        Specificity::MajorOnly,
        Specificity::MinorOnly,
        Specificity::PatchOnly,
        Specificity::ExtraOnly,
    ])
}

/// Generates constraints shaped like the parser produces them:
/// unspecified positions of the target are zero or absent.
fn constraint() -> impl Strategy<Value = Constraint> {
    (
        prop::sample::select(Operator::iter().collect::<Vec<_>>()),
        specificity(),
        version(),
    )
        .prop_map(|(operator, specificity, version)| {
            let (major, minor, patch, extra) = match specificity {
                Specificity::Full | Specificity::ExtraOnly => (
                    version.major(),
                    version.minor(),
                    version.patch(),
                    version.extra().to_vec(),
                ),
                Specificity::PatchOnly => (version.major(), version.minor(), 0, Vec::new()),
                Specificity::MinorOnly => (version.major(), 0, 0, Vec::new()),
                Specificity::MajorOnly => (0, 0, 0, Vec::new()),
            };
            let target = Version::builder()
                .major(major)
                .minor(minor)
                .patch(patch)
                .extra(extra)
                .prerelease(version.prerelease())
                .build();
            Constraint::new(operator, target, specificity)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2048))]

    /// Evaluating the compiled range gives the same answer as evaluating the operator directly.
    #[test]
    fn range_agrees_with_direct_check(constraint in constraint(), version in version()) {
        if let Ok(range) = constraint.to_range() {
            let direct = constraint.matches(&version);
            prop_assert_eq!(range.matches(&version), direct, "'{}' on '{}' as {}", constraint, version, range);
            prop_assert_eq!(RangeSet::from(range).matches(&version), direct);
        }
    }

    /// The same holds for whole expressions.
    #[test]
    fn range_set_agrees_with_direct_check(
        groups in prop::collection::vec(prop::collection::vec(constraint(), 1..3), 1..3),
        version in version(),
    ) {
        let constraints = Constraints::from(groups);
        if let Ok(ranges) = constraints.to_ranges() {
            prop_assert_eq!(ranges.matches(&version), constraints.matches(&version), "'{}' on '{}'", constraints, version);
        }
    }

    /// Displayed constraints parse back into the same constraint.
    #[test]
    fn display_reparses(constraint in constraint()) {
        let reparsed = Constraint::parse(constraint.to_string()).expect("must parse");
        prop_assert_eq!(reparsed, constraint);
    }
}
