//! # Ranges
//!
//! A [`Range`] is the canonical, parser-independent form of a single [`Constraint`]:
//! an interval between two [`Bound`]s, optionally inverted, along with whether
//! prerelease versions may match at all.
//!
//! [`RangeSet`] mirrors [`Constraints`](crate::Constraints): OR-groups of AND-ed ranges.
//! Compiling constraints into ranges derives every boundary up front,
//! so a single `RangeSet` can be checked against many versions cheaply.
//!
//! ## Boundaries for prerelease targets
//!
//! Ranges that synthesize an upper boundary from a target with a prerelease give that
//! boundary the prerelease `0`, the lowest possible label.
//! For example `~1.2.3-beta` is `[1.2.3-beta, 1.3.0-0)`: it admits
//! every prerelease of `1.2.x` at or above `1.2.3-beta` but none of `1.3.0`.

use std::fmt;

use bon::Builder;
use derive_more::Display;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    CompileError, Constraint, Operator, Specificity, Version, version::PRERELEASE_FLOOR,
};

/// One side of a [`Range`].
#[derive(Clone, Eq, PartialEq, Debug, Default, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// No constraint on this side.
    #[default]
    #[display("unbounded")]
    Unbounded,

    /// The version itself is within the range.
    #[display("{_0} inclusive")]
    Included(Version),

    /// The version itself is outside the range.
    #[display("{_0} exclusive")]
    Excluded(Version),
}

impl Bound {
    /// Report whether `version` is on the admitted side of this bound
    /// when it is used as a lower bound.
    pub fn admits_from_below(&self, version: &Version) -> bool {
        match self {
            Bound::Unbounded => true,
            Bound::Included(bound) => version >= bound,
            Bound::Excluded(bound) => version > bound,
        }
    }

    /// Report whether `version` is on the admitted side of this bound
    /// when it is used as an upper bound.
    pub fn admits_from_above(&self, version: &Version) -> bool {
        match self {
            Bound::Unbounded => true,
            Bound::Included(bound) => version <= bound,
            Bound::Excluded(bound) => version < bound,
        }
    }

    /// The version at this bound, if it is bounded.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(version) | Bound::Excluded(version) => Some(version),
        }
    }
}

/// An interval of versions.
///
/// A version is within the range if it is admitted by both bounds;
/// when the range is inverted, it is within the range if it is *not* admitted by both.
/// Regardless of bounds, versions with a prerelease never match
/// unless the range matches prereleases.
///
/// ```
/// # use semrange::{Bound, Range, version};
/// let range = Range::builder()
///     .lower(Bound::Included(version!(1, 2, 3)))
///     .upper(Bound::Excluded(version!(1, 3, 0)))
///     .build();
///
/// assert_eq!(range.to_string(), "[1.2.3, 1.3.0)");
/// assert!(range.matches(&version!(1, 2, 9)));
/// assert!(!range.matches(&version!(1, 3, 0)));
/// assert!(!range.matches(&semrange::version!(parse => "1.2.4-beta")));
/// ```
#[derive(
    Clone,
    Eq,
    PartialEq,
    Debug,
    Default,
    Builder,
    Getters,
    CopyGetters,
    Serialize,
    Deserialize,
    ToSchema,
)]
pub struct Range {
    /// Whether versions carrying a prerelease may match.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    match_prerelease: bool,

    /// Whether the result of the bounds check is negated.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    invert: bool,

    /// The lower bound.
    #[builder(default)]
    #[getset(get = "pub")]
    lower: Bound,

    /// The upper bound.
    #[builder(default)]
    #[getset(get = "pub")]
    upper: Bound,
}

impl Range {
    /// The range without bounds: every release version matches.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Evaluate this range against a version.
    pub fn matches(&self, version: &Version) -> bool {
        if version.is_prerelease() && !self.match_prerelease {
            return false;
        }
        self.within_bounds(version)
    }

    /// Check the bounds only, applying inversion but not the prerelease gate.
    fn within_bounds(&self, version: &Version) -> bool {
        let within =
            self.lower.admits_from_below(version) && self.upper.admits_from_above(version);
        within != self.invert
    }

    /// Negate this range's bounds check.
    fn inverted(self) -> Self {
        Self {
            invert: !self.invert,
            ..self
        }
    }

    fn point(target: &Version) -> Self {
        Self::builder()
            .lower(Bound::Included(target.clone()))
            .upper(Bound::Included(target.clone()))
            .match_prerelease(target.is_prerelease())
            .build()
    }

    fn at_least(target: &Version) -> Self {
        Self::builder()
            .lower(Bound::Included(target.clone()))
            .match_prerelease(target.is_prerelease())
            .build()
    }

    /// `[target, boundary)`, where the boundary bumps segment `k` of the target.
    /// Unbounded above when no such boundary exists.
    fn band(target: &Version, k: usize) -> Self {
        let upper = boundary(target, k).map_or(Bound::Unbounded, Bound::Excluded);
        Self::builder()
            .lower(Bound::Included(target.clone()))
            .upper(upper)
            .match_prerelease(target.is_prerelease())
            .build()
    }

    fn greater(constraint: &Constraint) -> Self {
        let target = constraint.target();
        let range = match constraint.specificity().last_specified(target).map(|k| boundary(target, k)) {
            Some(Some(boundary)) => Self::builder().lower(Bound::Included(boundary)).build(),
            // Nothing lies above a prefix already at the maximum.
            Some(None) => Self::unbounded().inverted(),
            None => Self::builder().lower(Bound::Excluded(target.clone())).build(),
        };
        Self {
            match_prerelease: target.is_prerelease(),
            ..range
        }
    }

    fn less(constraint: &Constraint) -> Self {
        let target = constraint.target();
        Self::builder()
            .upper(Bound::Excluded(target.clone()))
            .match_prerelease(target.is_prerelease())
            .build()
    }

    fn tilde(constraint: &Constraint) -> Self {
        let target = constraint.target();
        match constraint.tilde_pivot() {
            Some(k) => Self::band(target, k),
            None if !target.is_prerelease() && target.is_zero() => Self::unbounded(),
            None => Self::at_least(target),
        }
    }

    fn caret(constraint: &Constraint) -> Self {
        Self::band(constraint.target(), constraint.caret_pivot())
    }

    fn not_equal(constraint: &Constraint) -> Result<Self, CompileError> {
        let target = constraint.target();
        let specificity = constraint.specificity();
        if specificity.is_wildcard() && target.is_prerelease() {
            return Err(CompileError::UnrepresentableConstraint {
                constraint: constraint.clone(),
            });
        }

        let range = match specificity.last_specified(target) {
            Some(k) => Self::band(target, k),
            None => Self::point(target),
        };
        Ok(Self {
            match_prerelease: specificity == Specificity::Full,
            ..range.inverted()
        })
    }
}

/// The next boundary of `target` at segment `k`, carrying the lowest prerelease
/// when the target has a prerelease. `None` when every segment through `k` is
/// at `u64::MAX`.
fn boundary(target: &Version, k: usize) -> Option<Version> {
    let boundary = target.checked_next_boundary(k)?;
    Some(if target.is_prerelease() {
        boundary.with_prerelease(PRERELEASE_FLOOR)
    } else {
        boundary
    })
}

impl TryFrom<&Constraint> for Range {
    type Error = CompileError;

    #[tracing::instrument(level = "trace", ret)]
    fn try_from(constraint: &Constraint) -> Result<Self, Self::Error> {
        Ok(match constraint.operator() {
            Operator::Equal if constraint.specificity().is_wildcard() => Self::tilde(constraint),
            Operator::Equal => Self::point(constraint.target()),
            Operator::NotEqual => Self::not_equal(constraint)?,
            Operator::Greater => Self::greater(constraint),
            Operator::Less => Self::less(constraint),
            Operator::GreaterOrEqual => Self::less(constraint).inverted(),
            Operator::LessOrEqual => Self::greater(constraint).inverted(),
            Operator::Tilde => Self::tilde(constraint),
            Operator::Caret => Self::caret(constraint),
        })
    }
}

impl TryFrom<Constraint> for Range {
    type Error = CompileError;

    fn try_from(constraint: Constraint) -> Result<Self, Self::Error> {
        Self::try_from(&constraint)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.match_prerelease {
            write!(f, "pre:")?;
        }
        if self.invert {
            write!(f, "!(")?;
        }
        match &self.lower {
            Bound::Unbounded => write!(f, "(*, ")?,
            Bound::Included(version) => write!(f, "[{}, ", version.original())?,
            Bound::Excluded(version) => write!(f, "({}, ", version.original())?,
        }
        match &self.upper {
            Bound::Unbounded => write!(f, "*)")?,
            Bound::Included(version) => write!(f, "{}]", version.original())?,
            Bound::Excluded(version) => write!(f, "{})", version.original())?,
        }
        if self.invert {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Compiled constraints: OR-groups of AND-ed [`Range`]s.
///
/// Produced by [`Constraints::to_ranges`](crate::Constraints::to_ranges).
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RangeSet(Vec<Vec<Range>>);

impl RangeSet {
    /// Evaluate a version against the compiled groups.
    ///
    /// Groups are tried in order and the first group whose ranges all match wins.
    /// A prerelease version skips any group containing a range that doesn't match
    /// prereleases, without checking bounds.
    pub fn matches(&self, version: &Version) -> bool {
        self.0.iter().any(|group| {
            if version.is_prerelease() && group.iter().any(|range| !range.match_prerelease) {
                return false;
            }
            group.iter().all(|range| range.within_bounds(version))
        })
    }

    /// Iterate over the OR-groups; each group is a list of ranges that must all match.
    pub fn groups(&self) -> impl Iterator<Item = &[Range]> {
        self.0.iter().map(Vec::as_slice)
    }
}

impl From<Vec<Vec<Range>>> for RangeSet {
    fn from(groups: Vec<Vec<Range>>) -> Self {
        Self(groups)
    }
}

impl From<Range> for RangeSet {
    fn from(range: Range) -> Self {
        Self(vec![vec![range]])
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            for (j, range) in group.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{range}")?;
            }
        }
        Ok(())
    }
}
