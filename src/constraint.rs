//! # Version Constraints
//!
//! A [`Constraint`] is a single operator applied to a target [`Version`],
//! remembering how much of the target was actually written down.
//! [`Constraints`] combine them into OR-groups of AND-clauses:
//! a version satisfies the whole expression if it satisfies every clause
//! of at least one group.
//!
//! ## Operators
//!
//! | Operator | Spellings | Meaning |
//! |---|---|---|
//! | [`Operator::Equal`] | `=`, or no operator | exactly the target; a wildcarded target behaves like `~` |
//! | [`Operator::NotEqual`] | `!=` | anything but the target (or the wildcarded band) |
//! | [`Operator::Greater`] | `>` | above the target (or above the wildcarded band) |
//! | [`Operator::Less`] | `<` | below the target; wildcards are not expanded |
//! | [`Operator::GreaterOrEqual`] | `>=`, `=>` | not below the target |
//! | [`Operator::LessOrEqual`] | `<=`, `=<` | not above the target (or the wildcarded band) |
//! | [`Operator::Tilde`] | `~`, `~>` | patch-level changes: `~1.2.3` is `>=1.2.3, <1.3.0` |
//! | [`Operator::Caret`] | `^` | keeps the leftmost nonzero component: `^0.2.3` is `>=0.2.3, <0.3.0` |
//!
//! ## Evaluation
//!
//! There are two equivalent ways to evaluate constraints:
//!
//! - [`Constraints::matches`] evaluates each operator directly against the version.
//! - [`Constraints::to_ranges`] compiles the expression once into a [`RangeSet`],
//!   which can then be checked against many versions without re-deriving bounds.
//!
//! Both always agree; compilation can fail for the rare constraint
//! that has no range representation (see [`CompileError`]).

use std::{fmt, str::FromStr};

use derive_new::new;
use documented::Documented;
use duplicate::duplicate_item;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{CompileError, Error, Range, RangeSet, Version};

pub mod parse;

/// The comparison a [`Constraint`] applies to its target.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, Display, EnumString, EnumIter, AsRefStr, Documented,
)]
#[non_exhaustive]
pub enum Operator {
    /// Equal to the target (`=`).
    #[strum(to_string = "=")]
    Equal,

    /// Not equal to the target (`!=`).
    #[strum(to_string = "!=")]
    NotEqual,

    /// Greater than the target (`>`).
    #[strum(to_string = ">")]
    Greater,

    /// Less than the target (`<`).
    #[strum(to_string = "<")]
    Less,

    /// Greater than or equal to the target (`>=`, also spelled `=>`).
    #[strum(to_string = ">=", serialize = "=>")]
    GreaterOrEqual,

    /// Less than or equal to the target (`<=`, also spelled `=<`).
    #[strum(to_string = "<=", serialize = "=<")]
    LessOrEqual,

    /// Patch-level compatible with the target (`~`, also spelled `~>`).
    #[strum(to_string = "~", serialize = "~>")]
    Tilde,

    /// Compatible with the target up to its leftmost nonzero component (`^`).
    #[strum(to_string = "^")]
    Caret,
}

/// Records which trailing part of a constraint's target was left unspecified.
///
/// Unspecified parts are either wildcards (`x`, `X` or `*`) or simply missing;
/// `1`, `1.x` and `1.*.*` all have [`Specificity::MinorOnly`].
/// The target stores zero (or nothing, for extra components) in unspecified positions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Documented)]
pub enum Specificity {
    /// Every numeric component was specified.
    #[default]
    Full,

    /// The whole version was a wildcard, as in `*`.
    MajorOnly,

    /// Only the major component was specified, as in `1` or `1.x`.
    MinorOnly,

    /// Only major and minor were specified, as in `1.2` or `1.2.*`.
    PatchOnly,

    /// A wildcard follows the patch or an extra component, as in `1.2.3.x`.
    ExtraOnly,
}

impl Specificity {
    /// Report whether any part of the target was left unspecified.
    pub fn is_wildcard(self) -> bool {
        self != Specificity::Full
    }

    /// The index of the last specified segment of `target`, when a wildcard
    /// follows it (see [`Version::segment`] for indexing).
    ///
    /// [`Specificity::Full`] and [`Specificity::MajorOnly`] have no such segment.
    pub fn last_specified(self, target: &Version) -> Option<usize> {
        match self {
            Specificity::Full | Specificity::MajorOnly => None,
            Specificity::MinorOnly => Some(0),
            Specificity::PatchOnly => Some(1),
            Specificity::ExtraOnly => Some(2 + target.extra().len()),
        }
    }
}

/// A single operator applied to a target version.
///
/// Constraints are usually produced by parsing (see [`Constraints::parse`]),
/// but can be constructed directly:
///
/// ```
/// # use semrange::{Constraint, Operator, Specificity, version};
/// let constraint = Constraint::new(Operator::Tilde, version!(1, 2, 0), Specificity::PatchOnly);
/// assert_eq!(constraint.to_string(), "~1.2");
/// assert!(constraint.matches(&version!(1, 2, 9)));
/// assert!(!constraint.matches(&version!(1, 3, 0)));
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Getters, CopyGetters, Documented, new)]
pub struct Constraint {
    /// The comparison to apply.
    #[getset(get_copy = "pub")]
    operator: Operator,

    /// The version being compared against.
    #[getset(get = "pub")]
    target: Version,

    /// Which trailing part of the target was left unspecified.
    #[getset(get_copy = "pub")]
    specificity: Specificity,
}

impl Constraint {
    /// Evaluate this constraint directly against a version.
    ///
    /// This performs the operator's comparison without building a [`Range`];
    /// the result is always the same as evaluating [`Constraint::to_range`].
    pub fn matches(&self, version: &Version) -> bool {
        let target = &self.target;

        // Prereleases only match constraints that mention a prerelease,
        // with the exception of an exact exclusion.
        let exact_exclusion =
            self.operator == Operator::NotEqual && self.specificity == Specificity::Full;
        if version.is_prerelease() && !target.is_prerelease() && !exact_exclusion {
            return false;
        }

        let last = self.specificity.last_specified(target);
        match self.operator {
            Operator::Equal if self.specificity.is_wildcard() => self.matches_tilde(version),
            Operator::Equal => version == target,
            Operator::NotEqual => match last {
                Some(k) => !(version >= target && prefix_within(version, target, k)),
                None => version != target,
            },
            Operator::Greater => match last {
                Some(k) => !prefix_within(version, target, k),
                None => version > target,
            },
            Operator::Less => version < target,
            Operator::GreaterOrEqual => version >= target,
            Operator::LessOrEqual => match last {
                Some(k) => prefix_within(version, target, k),
                None => version <= target,
            },
            Operator::Tilde => self.matches_tilde(version),
            Operator::Caret => {
                version >= target && prefix_within(version, target, self.caret_pivot())
            }
        }
    }

    /// Compile this constraint into its canonical [`Range`].
    ///
    /// ```
    /// # use semrange::{Bound, Constraint, version};
    /// let constraint = Constraint::parse("^0.2.3").expect("must parse");
    /// let range = constraint.to_range().expect("must compile");
    /// assert_eq!(range.lower(), &Bound::Included(version!(0, 2, 3)));
    /// assert_eq!(range.upper(), &Bound::Excluded(version!(0, 3, 0)));
    /// ```
    pub fn to_range(&self) -> Result<Range, CompileError> {
        Range::try_from(self)
    }

    /// Parse a single constraint, such as `>=1.2.3` or `~1.2`.
    ///
    /// Use [`Constraints::parse`] for expressions with more than one clause.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, Error> {
        parse::constraint(input.as_ref())
    }

    /// The segment a tilde bumps to form its upper boundary.
    ///
    /// `None` for the degenerate cases that only have a lower bound:
    /// a fully wildcarded target, or exactly `0.0.0`.
    pub(crate) fn tilde_pivot(&self) -> Option<usize> {
        let target = &self.target;
        match self.specificity {
            Specificity::Full if target.is_zero() => None,
            Specificity::Full => Some(1 + target.extra().len()),
            specificity => specificity.last_specified(target),
        }
    }

    /// The segment a caret bumps to form its upper boundary:
    /// the leftmost nonzero (or wildcarded) component.
    pub(crate) fn caret_pivot(&self) -> usize {
        let target = &self.target;
        if target.major() > 0 || self.specificity == Specificity::MinorOnly {
            0
        } else if target.minor() > 0 || self.specificity == Specificity::PatchOnly {
            1
        } else if target.patch() > 0 || target.extra().is_empty() {
            2
        } else {
            let extra = target.extra();
            3 + extra
                .iter()
                .position(|&component| component != 0)
                .unwrap_or(extra.len() - 1)
        }
    }

    fn matches_tilde(&self, version: &Version) -> bool {
        let target = &self.target;
        match self.tilde_pivot() {
            Some(k) => version >= target && prefix_within(version, target, k),
            None => version >= target,
        }
    }
}

/// Report whether the segments of `version` up to and including `k`
/// do not exceed those of `target`, compared lexicographically.
///
/// Missing extra components order below present ones, just like in [`Version`]'s ordering.
/// For a version at or above `target` this is exactly "below the next boundary of `target` at `k`".
fn prefix_within(version: &Version, target: &Version, k: usize) -> bool {
    (0..=k)
        .map(|i| version.segment(i))
        .le((0..=k).map(|i| target.segment(i)))
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = &self.target;
        write!(f, "{}", self.operator)?;
        match self.specificity {
            Specificity::MajorOnly => write!(f, "*")?,
            Specificity::MinorOnly => write!(f, "{}", target.major())?,
            Specificity::PatchOnly => write!(f, "{}.{}", target.major(), target.minor())?,
            Specificity::Full | Specificity::ExtraOnly => {
                write!(f, "{}.{}.{}", target.major(), target.minor(), target.patch())?;
                for component in target.extra() {
                    write!(f, ".{component}")?;
                }
            }
        }
        if self.specificity == Specificity::ExtraOnly {
            write!(f, ".x")?;
        }
        if target.is_prerelease() {
            write!(f, "-{}", target.prerelease())?;
        }
        if !target.build_metadata().is_empty() {
            write!(f, "+{}", target.build_metadata())?;
        }
        Ok(())
    }
}

impl FromStr for Constraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&Constraint> for Constraint {
    fn from(c: &Constraint) -> Self {
        c.clone()
    }
}

/// A composable collection of constraints: OR-groups of AND-clauses.
///
/// ```
/// # use semrange::{Constraints, version};
/// let constraints = Constraints::parse(">=1.0.0, <2.0.0 || ^3.0.0").expect("must parse");
///
/// assert!(constraints.matches(&version!(1, 5, 0)));
/// assert!(constraints.matches(&version!(3, 2, 1)));
/// assert!(!constraints.matches(&version!(2, 0, 0)));
/// assert!(!constraints.matches(&version!(4, 0, 0)));
///
/// // Compile once, evaluate many times.
/// let ranges = constraints.to_ranges().expect("must compile");
/// assert!(ranges.matches(&version!(1, 5, 0)));
/// assert!(!ranges.matches(&version!(4, 0, 0)));
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Documented)]
#[non_exhaustive]
pub struct Constraints(Vec<Vec<Constraint>>);

impl Constraints {
    /// Parse a constraint expression.
    ///
    /// - OR-groups are separated by `||`.
    /// - Clauses within a group are separated by commas or whitespace.
    /// - A clause is an optional operator followed by a version, which may use
    ///   wildcards (`x`, `X`, `*`) or leave trailing components off.
    /// - A hyphen range `A - B` means `>=A, <=B`.
    #[tracing::instrument(level = "debug", skip_all, fields(input = input.as_ref()))]
    pub fn parse(input: impl AsRef<str>) -> Result<Self, Error> {
        parse::constraints(input.as_ref())
    }

    /// Iterate over the OR-groups; each group is a list of clauses that must all match.
    pub fn groups(&self) -> impl Iterator<Item = &[Constraint]> {
        self.0.iter().map(Vec::as_slice)
    }

    /// Iterate over every clause in every group.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.iter().flatten()
    }

    /// Evaluate the expression directly against a version.
    ///
    /// The version matches if every clause of at least one group matches it.
    pub fn matches(&self, version: &Version) -> bool {
        self.groups()
            .any(|group| group.iter().all(|constraint| constraint.matches(version)))
    }

    /// Compile the expression into a [`RangeSet`].
    ///
    /// Compilation is all-or-nothing: if any single clause cannot be represented
    /// as a range, the whole expression fails to compile.
    #[tracing::instrument(level = "trace", skip_all, fields(constraints = %self))]
    pub fn to_ranges(&self) -> Result<RangeSet, Error> {
        self.0
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|constraint| {
                        constraint.to_range().inspect_err(|err| {
                            tracing::debug!(%constraint, %err, "constraint cannot be compiled");
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RangeSet::from)
            .map_err(Error::from)
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            for (j, constraint) in group.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{constraint}")?;
            }
        }
        Ok(())
    }
}

impl From<Vec<Vec<Constraint>>> for Constraints {
    fn from(groups: Vec<Vec<Constraint>>) -> Self {
        Self(groups)
    }
}

impl From<Vec<Constraint>> for Constraints {
    fn from(group: Vec<Constraint>) -> Self {
        Self(vec![group])
    }
}

impl From<Constraint> for Constraints {
    fn from(constraint: Constraint) -> Self {
        Self(vec![vec![constraint]])
    }
}

impl FromStr for Constraints {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[duplicate_item(
    input;
    [ &str ];
    [ String ];
    [ &String ];
)]
impl TryFrom<input> for Constraints {
    type Error = Error;

    fn try_from(value: input) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for Constraints {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}

/// Construct [`Constraints`] from constraint strings, grouped by OR.
///
/// Each bracketed group is AND-ed; groups are OR-ed.
/// Panics if any constraint fails to parse, so this is best suited for tests and literals.
///
/// ```
/// # use semrange::{Constraints, version};
/// let constraints = semrange::constraints!([">=1.0.0", "<2.0.0"], ["^3.0.0"]);
/// assert_eq!(constraints, Constraints::parse(">=1.0.0, <2.0.0 || ^3.0.0").expect("must parse"));
/// ```
#[macro_export]
macro_rules! constraints {
    ($([ $($constraint:expr),+ $(,)? ]),+ $(,)?) => {
        $crate::Constraints::from(vec![
            $(
                vec![$($crate::Constraint::parse($constraint).expect("parse constraint")),+]
            ),+
        ])
    };
}
