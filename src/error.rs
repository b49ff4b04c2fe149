use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::Constraint;

/// Records all errors reported by this library.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Errors encountered while parsing a [`Version`](crate::Version)
    /// or a set of [`Constraints`](crate::Constraints).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Errors encountered while compiling constraints into [`Range`](crate::Range)s.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),
}

/// Errors encountered when parsing text into a version or constraint.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The provided value was empty.
    #[error("input was empty")]
    #[diagnostic(code(semrange::parse::empty))]
    Empty,

    /// The input is not a valid version.
    #[error("input '{input}' is not a valid version")]
    #[diagnostic(code(semrange::parse::version))]
    Version {
        /// The input originally provided.
        input: String,
    },

    /// The input did not match the constraint grammar.
    #[error("input '{input}' did not match required syntax: {message}")]
    #[diagnostic(code(semrange::parse::syntax))]
    Syntax {
        /// The input originally provided.
        #[source_code]
        input: String,

        /// Describes what was expected.
        message: String,

        /// The location of the error.
        #[label("here")]
        span: SourceSpan,
    },
}

/// Errors encountered when translating a [`Constraint`] into a [`Range`](crate::Range).
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum CompileError {
    /// The constraint excludes a wildcarded band around a prerelease target.
    ///
    /// A single range cannot exclude the exact prerelease and the band of releases
    /// following it without also excluding unrelated prereleases of the same core.
    #[error("unable to represent constraint '{constraint}' as a range: wildcarded exclusion of a prerelease")]
    #[diagnostic(code(semrange::compile::unrepresentable))]
    UnrepresentableConstraint {
        /// The constraint that failed to compile.
        constraint: Constraint,
    },
}

/// Return the span of the unparsed `remaining` tail inside `input`.
pub(crate) fn span(input: &str, remaining: &str) -> SourceSpan {
    let start = input.len().saturating_sub(remaining.len());
    let len = remaining.find(char::is_whitespace).unwrap_or(remaining.len());
    (start, len).into()
}

/// Construct and return a new [`ParseError::Syntax`].
///
/// Provide the input, the unparsed remainder, and a message.
///
/// ```ignore
/// error::syntax!(input, remaining => "expected a version");
/// ```
macro_rules! syntax {
    ($input:expr, $remaining:expr => $($message:tt)*) => {
        $crate::error::ParseError::Syntax {
            input: $input.to_string(),
            span: $crate::error::span($input, $remaining),
            message: format!($($message)*),
        }
    };
}
pub(crate) use syntax;

/// Shorthand for conversion into [`Error`] and returning.
macro_rules! fatal {
    ($err:expr) => {
        return Err($crate::error::Error::from($err))
    };
}
pub(crate) use fatal;
