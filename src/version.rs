use std::{borrow::Cow, cmp::Ordering, fmt, str::FromStr};

use bon::Builder;
use compact_str::{CompactString, ToCompactString, format_compact};
use documented::Documented;
use duplicate::duplicate_item;
use getset::CopyGetters;
use lazy_regex::regex_captures;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{
    PartialSchema, ToSchema,
    openapi::{ObjectBuilder, Type},
};

use crate::{Error, ParseError, error};

/// The prerelease label given to synthesized upper boundaries.
///
/// `0` is the lowest possible prerelease identifier, so an exclusive bound at
/// `X-0` excludes `X` and every prerelease of `X` while admitting prereleases
/// of everything below `X`.
pub(crate) const PRERELEASE_FLOOR: &str = "0";

/// A concrete semantic version.
///
/// Beyond the usual `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` form, versions may carry
/// any number of extra numeric components after the patch, as in `1.2.3.4`.
///
/// ## Ordering
///
/// Versions order by `major`, `minor` and `patch`, then by their extra components
/// element-wise, where a version whose extra components are a strict prefix of the
/// other's orders lower (`1.2.3 < 1.2.3.0`).
/// Remaining ties are broken by semver prerelease precedence: a release orders above
/// all of its prereleases, and labels are compared identifier by identifier.
///
/// Build metadata and the original text never participate in ordering or equality.
#[derive(Clone, Debug, Builder, CopyGetters, Documented)]
pub struct Version {
    /// The major component.
    #[getset(get_copy = "pub")]
    major: u64,

    /// The minor component.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    minor: u64,

    /// The patch component.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    patch: u64,

    /// Numeric components following the patch component.
    #[builder(default, into)]
    extra: Vec<u64>,

    /// The prerelease label, empty for releases.
    #[builder(default, into)]
    prerelease: CompactString,

    /// The build metadata, empty if absent.
    #[builder(default, into)]
    metadata: CompactString,

    /// The text this version was parsed from, including any `v` prefix.
    /// Empty when the version was built from parts.
    #[builder(skip)]
    original: CompactString,
}

impl Version {
    /// Parse a version from text.
    ///
    /// Accepts an optional `v` or `V` prefix, a required major component,
    /// optional minor and patch components (missing ones are zero),
    /// any number of extra numeric components after the patch,
    /// and optional prerelease and build metadata.
    ///
    /// ```
    /// # use semrange::Version;
    /// let version = Version::parse("v1.2.3.4-beta.1+b5").expect("must parse");
    /// assert_eq!(version.extra(), &[4]);
    /// assert_eq!(version.prerelease(), "beta.1");
    /// assert_eq!(version.to_string(), "1.2.3.4-beta.1+b5");
    /// assert_eq!(version.original(), "v1.2.3.4-beta.1+b5");
    /// ```
    pub fn parse(input: impl AsRef<str>) -> Result<Self, Error> {
        let input = input.as_ref().trim();
        if input.is_empty() {
            error::fatal!(ParseError::Empty);
        }

        let invalid = || ParseError::Version {
            input: input.to_string(),
        };
        let (_, _, major, minor, patch, extra, pre, build) = regex_captures!(
            r"^([vV]?)(\d+)(?:\.(\d+))?(?:\.(\d+))?((?:\.\d+)*)(?:-((?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*)(?:\.(?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*))*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
            input
        )
        .ok_or_else(invalid)?;

        let number = |s: &str| s.parse::<u64>().map_err(|_| invalid());
        let optional = |s: &str| if s.is_empty() { Ok(0) } else { number(s) };
        let extra = extra
            .split('.')
            .skip(1)
            .map(number)
            .collect::<Result<Vec<_>, _>>()?;

        let mut version = Version::builder()
            .major(number(major)?)
            .minor(optional(minor)?)
            .patch(optional(patch)?)
            .extra(extra)
            .prerelease(pre)
            .metadata(build)
            .build();
        version.original = input.to_compact_string();
        Ok(version)
    }

    /// The numeric components following the patch component.
    pub fn extra(&self) -> &[u64] {
        &self.extra
    }

    /// The prerelease label, or an empty string for releases.
    pub fn prerelease(&self) -> &str {
        &self.prerelease
    }

    /// The build metadata, or an empty string if there is none.
    pub fn build_metadata(&self) -> &str {
        &self.metadata
    }

    /// Report whether the version carries a prerelease label.
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The text this version was parsed from.
    ///
    /// Versions built from parts have no original text and render canonically instead.
    pub fn original(&self) -> Cow<'_, str> {
        if self.original.is_empty() {
            Cow::Owned(self.to_string())
        } else {
            Cow::Borrowed(self.original.as_str())
        }
    }

    /// The non-numeric prefix of the original text, such as `v`.
    pub fn prefix(&self) -> &str {
        self.original
            .split(|c: char| c.is_ascii_digit())
            .next()
            .unwrap_or_default()
    }

    /// The numeric segment at index `k`:
    /// `0` is major, `1` is minor, `2` is patch, and `k >= 3` is `extra[k - 3]`.
    ///
    /// Returns `None` for extra positions the version doesn't have.
    pub fn segment(&self, k: usize) -> Option<u64> {
        match k {
            0 => Some(self.major),
            1 => Some(self.minor),
            2 => Some(self.patch),
            k => self.extra.get(k - 3).copied(),
        }
    }

    /// Report whether the numeric core is exactly `0.0.0` with no extra components.
    pub fn is_zero(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.patch == 0 && self.extra.is_empty()
    }

    /// The smallest version that differs from this one at or before segment `k`.
    ///
    /// Segments before `k` are kept, segment `k` is incremented,
    /// later segments are reset (zeroed, or dropped for extra components),
    /// and prerelease and build metadata are cleared.
    /// The result keeps this version's prefix so it renders like typed input.
    ///
    /// ```
    /// # use semrange::Version;
    /// let version = Version::parse("v1.2.3.4-rc.1").expect("must parse");
    /// assert_eq!(version.next_boundary(1).original(), "v1.3.0");
    /// assert_eq!(version.next_boundary(3).original(), "v1.2.3.5");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `k` names an extra component the version doesn't have
    /// (`k > extra().len() + 2`).
    pub fn next_boundary(&self, k: usize) -> Version {
        let (mut major, mut minor, mut patch) = (self.major, self.minor, self.patch);
        let mut extra = Vec::new();
        match k {
            0 => (major, minor, patch) = (major.saturating_add(1), 0, 0),
            1 => (minor, patch) = (minor.saturating_add(1), 0),
            2 => patch = patch.saturating_add(1),
            k => {
                let at = k - 3;
                extra.extend_from_slice(&self.extra[..at]);
                extra.push(self.extra[at].saturating_add(1));
            }
        }

        Version::builder()
            .major(major)
            .minor(minor)
            .patch(patch)
            .extra(extra)
            .build()
            .with_prefix(self.prefix())
    }

    /// The smallest version whose segments through `k` sort above this one's.
    ///
    /// Like [`Version::next_boundary`], except that a segment at `u64::MAX` carries
    /// into the segment before it. `None` when every segment through `k` is at
    /// `u64::MAX`, or when `k` names a missing extra component.
    ///
    /// ```
    /// # use semrange::Version;
    /// let version = Version::parse("1.18446744073709551615.3").expect("must parse");
    /// assert_eq!(version.checked_next_boundary(1), Some(Version::parse("2.0.0").expect("must parse")));
    /// assert_eq!(version.checked_next_boundary(2), Some(Version::parse("1.18446744073709551615.4").expect("must parse")));
    /// ```
    pub fn checked_next_boundary(&self, k: usize) -> Option<Version> {
        (0..=k)
            .rev()
            .find(|&at| self.segment(at).is_some_and(|segment| segment < u64::MAX))
            .filter(|_| self.segment(k).is_some())
            .map(|at| self.next_boundary(at))
    }

    /// Replace the prerelease label, re-rendering the original text.
    pub(crate) fn with_prerelease(mut self, prerelease: &str) -> Version {
        let prefix = self.prefix().to_compact_string();
        self.prerelease = prerelease.to_compact_string();
        self.with_prefix(&prefix)
    }

    /// Set the original text to `prefix` followed by the canonical rendering.
    pub(crate) fn with_prefix(mut self, prefix: &str) -> Version {
        self.original = format_compact!("{prefix}{self}");
        self
    }

    /// Compare only the numeric core: major, minor, patch, then extra components.
    fn cmp_core(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| self.extra.cmp(&other.extra))
    }
}

/// Compare two prerelease labels by semver precedence.
///
/// An empty label is a release, which outranks every prerelease.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut a_identifiers = a.split('.');
    let mut b_identifiers = b.split('.');
    loop {
        // With all shared identifiers equal, the longer label wins.
        let (a, b) = match (a_identifiers.next(), b_identifiers.next()) {
            (Some(a), Some(b)) => (a, b),
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        };

        let ord = match (numeric(a), numeric(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Parse a purely numeric prerelease identifier.
fn numeric(identifier: &str) -> Option<u64> {
    if !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit()) {
        identifier.parse().ok()
    } else {
        None
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_core(other)
            .then_with(|| compare_prerelease(&self.prerelease, &other.prerelease))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for component in &self.extra {
            write!(f, ".{component}")?;
        }
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease)?;
        }
        if !self.metadata.is_empty() {
            write!(f, "+{}", self.metadata)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
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
impl TryFrom<input> for Version {
    type Error = Error;

    fn try_from(value: input) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<semver::Version> for Version {
    fn from(value: semver::Version) -> Self {
        Self::from(&value)
    }
}

impl From<&semver::Version> for Version {
    fn from(value: &semver::Version) -> Self {
        let mut version = Version::builder()
            .major(value.major)
            .minor(value.minor)
            .patch(value.patch)
            .prerelease(value.pre.as_str())
            .metadata(value.build.as_str())
            .build();
        version.original = value.to_compact_string();
        version
    }
}

impl From<&Version> for Version {
    fn from(value: &Version) -> Self {
        value.clone()
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.original().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}

impl PartialSchema for Version {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ObjectBuilder::new()
            .description(Some(Self::DOCS))
            .examples([json!("1.2.3"), json!("v1.2.3-beta.1"), json!("1.2.3.4+build5")])
            .min_length(Some(1))
            .schema_type(Type::String)
            .build()
            .into()
    }
}

impl ToSchema for Version {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("Version")
    }
}

/// Construct a [`Version`] from numeric parts.
///
/// ```
/// # use semrange::Version;
/// let version = semrange::version!(1, 2, 3);
/// assert_eq!(version, Version::parse("1.2.3").expect("must parse"));
///
/// let version = semrange::version!(1, 2, 3; 4, 5);
/// assert_eq!(version, Version::parse("1.2.3.4.5").expect("must parse"));
/// ```
#[macro_export]
macro_rules! version {
    ($major:expr, $minor:expr, $patch:expr) => {
        $crate::Version::builder()
            .major($major)
            .minor($minor)
            .patch($patch)
            .build()
    };
    ($major:expr, $minor:expr, $patch:expr; $($extra:expr),+ $(,)?) => {
        $crate::Version::builder()
            .major($major)
            .minor($minor)
            .patch($patch)
            .extra(vec![$($extra),+])
            .build()
    };

    // This is only meant for use in tests, so it's undocumented.
    // Panics if the provided value fails to parse.
    (parse => $value:expr) => {
        $crate::Version::parse($value).expect("parse version")
    };
}
