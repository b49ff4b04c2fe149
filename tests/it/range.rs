//! Tests for compiled ranges.

use assert_matches::assert_matches;
use simple_test_case::test_case;

use semrange::{Bound, CompileError, Constraint, Constraints, Range, RangeSet, Version, version};

fn compile(constraint: &str) -> Range {
    Constraint::parse(constraint)
        .expect("must parse")
        .to_range()
        .expect("must compile")
}

#[test_case("~1.2.3", &["1.2.3", "1.2.9"], &["1.3.0", "1.2.2"]; "tilde")]
#[test_case("^0.2.3", &["0.2.3", "0.2.9"], &["0.3.0", "0.1.9"]; "caret_zero_major")]
#[test_case("^0.0.3", &["0.0.3"], &["0.0.4", "0.0.2"]; "caret_zero_major_and_minor")]
#[test_case("<1.2", &["1.1.99"], &["1.2.0", "1.2.5"]; "less_ignores_wildcard")]
#[test_case(">1.2", &["1.3.0"], &["1.2.0", "1.2.5"]; "greater_expands_wildcard")]
#[test_case("!=1.2", &["1.1.9", "1.3.0"], &["1.2.0", "1.2.5"]; "not_equal_expands_wildcard")]
#[test_case("~0.0.0", &["0.0.0", "0.0.1", "12.0.0"], &["0.1.0-beta"]; "tilde_zero")]
#[test]
fn boundaries(constraint: &str, matching: &[&str], rejected: &[&str]) {
    let range = compile(constraint);
    for version in matching {
        let version = Version::parse(version).expect("must parse");
        assert!(range.matches(&version), "'{version}' should match '{constraint}' ({range})");
    }
    for version in rejected {
        let version = Version::parse(version).expect("must parse");
        assert!(!range.matches(&version), "'{version}' should not match '{constraint}' ({range})");
    }
}

#[test_case("~1.18446744073709551615", "1.18446744073709551615.3", true; "tilde_at_maximum")]
#[test_case("~1.18446744073709551615", "2.0.0", false; "tilde_above_maximum")]
#[test_case("^18446744073709551615.0.0", "18446744073709551615.2.0", true; "caret_at_maximum")]
#[test_case("!=1.18446744073709551615", "1.18446744073709551615.7", false; "not_equal_at_maximum")]
#[test_case("!=1.18446744073709551615", "2.0.0", true; "not_equal_above_maximum")]
#[test_case(">1.18446744073709551615", "1.18446744073709551615.7", false; "greater_at_maximum")]
#[test_case(">1.18446744073709551615", "2.0.0", true; "greater_above_maximum")]
#[test_case(">18446744073709551615", "18446744073709551615.9.9", false; "greater_than_everything")]
#[test_case("<=1.18446744073709551615", "1.18446744073709551615.7", true; "less_or_equal_at_maximum")]
#[test_case("<=1.18446744073709551615", "2.0.0", false; "less_or_equal_above_maximum")]
#[test_case("<=18446744073709551615", "18446744073709551615.9.9", true; "less_or_equal_everything")]
#[test_case("~1.18446744073709551615.0-rc", "1.18446744073709551615.5-beta", true; "carried_prerelease_within")]
#[test_case("~1.18446744073709551615.0-rc", "2.0.0-alpha", false; "carried_boundary_keeps_prerelease_floor")]
#[test]
fn boundary_at_integer_limit(constraint: &str, version: &str, expected: bool) {
    let constraint = Constraint::parse(constraint).expect("must parse");
    let version = Version::parse(version).expect("must parse");
    let range = constraint.to_range().expect("must compile");
    pretty_assertions::assert_eq!(constraint.matches(&version), expected, "'{version}' against '{constraint}'");
    pretty_assertions::assert_eq!(range.matches(&version), expected, "'{version}' against '{range}'");
}

#[test]
fn prerelease_boundary_uses_floor() {
    let range = compile("^1.2.3-beta");
    pretty_assertions::assert_eq!(range.lower(), &Bound::Included(version!(parse => "1.2.3-beta")));
    pretty_assertions::assert_eq!(range.upper(), &Bound::Excluded(version!(parse => "2.0.0-0")));
    assert!(range.match_prerelease());
    assert!(!range.invert());

    assert!(range.matches(&version!(parse => "1.9.0-alpha")));
    assert!(!range.matches(&version!(parse => "2.0.0-0")));
    assert!(!range.matches(&version!(parse => "2.0.0")));
}

#[test]
fn synthesized_boundary_keeps_prefix() {
    let range = compile("~V2.4-rc.1");
    let upper = range.upper().version().expect("must be bounded");
    pretty_assertions::assert_eq!(upper.original(), "V2.5.0-0");
    pretty_assertions::assert_eq!(upper.prefix(), "V");
}

#[test]
fn not_equal_prerelease_wildcard_is_unrepresentable() {
    let constraint = Constraint::parse("!=1.2.x-beta").expect("must parse");
    assert_matches!(
        constraint.to_range(),
        Err(CompileError::UnrepresentableConstraint { .. })
    );
    assert_matches!(Range::try_from(&constraint), Err(_));
}

#[test]
fn exact_not_equal_with_prerelease_compiles() {
    let range = compile("!=1.2.3-beta");
    assert!(range.invert());
    assert!(range.match_prerelease());
    assert!(!range.matches(&version!(parse => "1.2.3-beta")));
    assert!(range.matches(&version!(parse => "1.2.3-alpha")));
    assert!(range.matches(&version!(1, 2, 3)));
}

#[test_case("1.5.0", true; "first_group")]
#[test_case("3.2.1", true; "second_group")]
#[test_case("2.0.0", false; "gap")]
#[test_case("4.0.0", false; "above")]
#[test]
fn composition(version: &str, expected: bool) {
    let ranges = Constraints::parse(">=1.0.0, <2.0.0 || ^3.0.0")
        .expect("must parse")
        .to_ranges()
        .expect("must compile");
    pretty_assertions::assert_eq!(ranges.groups().count(), 2);
    pretty_assertions::assert_eq!(ranges.matches(&Version::parse(version).expect("must parse")), expected);
}

#[test]
fn empty_range_set_matches_nothing() {
    let ranges = RangeSet::default();
    assert!(!ranges.matches(&version!(1, 0, 0)));
}

#[test]
fn unbounded_range_set() {
    let ranges = RangeSet::from(Range::unbounded());
    assert!(ranges.matches(&version!(0, 0, 0)));
    assert!(ranges.matches(&version!(99, 0, 0; 1)));
    assert!(!ranges.matches(&version!(parse => "1.0.0-rc.1")));
}

#[test]
fn display() {
    let ranges = Constraints::parse("~1.2.3 || !=2.0.0, <3")
        .expect("must parse")
        .to_ranges()
        .expect("must compile");
    pretty_assertions::assert_eq!(
        ranges.to_string(),
        "[1.2.3, 1.3.0) || pre:!([2.0.0, 2.0.0]), (*, 3.0.0)"
    );
}

#[test]
fn serde_roundtrip() {
    let ranges = Constraints::parse(">=1.0.0, <2.0.0 || ^3.0.0-rc.1")
        .expect("must parse")
        .to_ranges()
        .expect("must compile");
    let serialized = serde_json::to_string(&ranges).expect("must serialize");
    let deserialized = serde_json::from_str::<RangeSet>(&serialized).expect("must deserialize");
    pretty_assertions::assert_eq!(deserialized, ranges);
}
