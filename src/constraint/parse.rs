//! Parsing for constraint expressions.
//!
//! The grammar is small enough to describe inline:
//!
//! ```text
//! expression := group ( "||" group )*
//! group      := clause ( ( "," | whitespace ) clause )*
//! clause     := pattern ws "-" ws pattern
//!             | operator? pattern
//! pattern    := [vV]? part ( "." part )* ( "-" prerelease )? ( "+" build )?
//! part       := digits | "x" | "X" | "*"
//! ```
//!
//! The nom grammar only splits the expression into tokens;
//! turning tokens into [`Constraint`]s happens afterwards so that
//! failures can report exactly which token was invalid.

use lazy_regex::regex_captures;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, value},
    multi::separated_list1,
    sequence::{delimited, preceded, separated_pair},
};

use crate::{
    Constraint, Constraints, Error, Operator, ParseError, Specificity, Version,
    error::{fatal, syntax},
};

/// A slice of the input, along with the input remaining at the point it starts.
#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    text: &'a str,
    at: &'a str,
}

#[derive(Debug)]
enum Clause<'a> {
    Single {
        operator: Option<Token<'a>>,
        pattern: Token<'a>,
    },
    Hyphen {
        from: Token<'a>,
        to: Token<'a>,
    },
}

/// Parse a full constraint expression.
pub(crate) fn constraints(input: &str) -> Result<Constraints, Error> {
    let input = input.trim();
    if input.is_empty() {
        fatal!(ParseError::Empty);
    }

    let groups = match expression(input) {
        Ok(("", groups)) => groups,
        Ok((rest, _)) => {
            fatal!(syntax!(input, rest.trim_start() => "unexpected trailing text '{}'", rest.trim()))
        }
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => {
            fatal!(syntax!(input, err.input => "expected a version constraint"))
        }
        Err(nom::Err::Incomplete(_)) => {
            fatal!(syntax!(input, input => "incomplete constraint expression"))
        }
    };

    let mut compiled = Vec::with_capacity(groups.len());
    for group in groups {
        let mut clauses = Vec::with_capacity(group.len());
        for clause in group {
            match clause {
                Clause::Single { operator, pattern } => {
                    clauses.push(lower(input, operator, pattern)?);
                }
                Clause::Hyphen { from, to } => {
                    let (target, specificity) = target_of(input, from)?;
                    clauses.push(Constraint::new(Operator::GreaterOrEqual, target, specificity));
                    let (target, specificity) = target_of(input, to)?;
                    clauses.push(Constraint::new(Operator::LessOrEqual, target, specificity));
                }
            }
        }
        compiled.push(clauses);
    }

    tracing::trace!(groups = compiled.len(), "parsed constraint expression");
    Ok(Constraints::from(compiled))
}

/// Parse exactly one clause with an optional operator, such as `>= 1.2`.
pub(crate) fn constraint(input: &str) -> Result<Constraint, Error> {
    let input = input.trim();
    if input.is_empty() {
        fatal!(ParseError::Empty);
    }

    match single(input) {
        Ok(("", (operator, pattern))) => Ok(lower(input, operator, pattern)?),
        Ok((rest, _)) => {
            fatal!(syntax!(input, rest.trim_start() => "unexpected trailing text '{}'", rest.trim()))
        }
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => {
            fatal!(syntax!(input, err.input => "expected a version constraint"))
        }
        Err(nom::Err::Incomplete(_)) => {
            fatal!(syntax!(input, input => "incomplete constraint"))
        }
    }
}

fn expression(input: &str) -> IResult<&str, Vec<Vec<Clause<'_>>>> {
    separated_list1(delimited(multispace0, tag("||"), multispace0), group).parse(input)
}

fn group(input: &str) -> IResult<&str, Vec<Clause<'_>>> {
    separated_list1(
        alt((
            value((), delimited(multispace0, char(','), multispace0)),
            value((), multispace1),
        )),
        clause,
    )
    .parse(input)
}

fn clause(input: &str) -> IResult<&str, Clause<'_>> {
    alt((
        separated_pair(pattern, (multispace1, char('-'), multispace1), pattern)
            .map(|(from, to)| Clause::Hyphen { from, to }),
        single.map(|(operator, pattern)| Clause::Single { operator, pattern }),
    ))
    .parse(input)
}

fn single(input: &str) -> IResult<&str, (Option<Token<'_>>, Token<'_>)> {
    (opt(operator), preceded(multispace0, pattern)).parse(input)
}

fn operator(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        tag("!="),
        tag(">="),
        tag("=>"),
        tag("<="),
        tag("=<"),
        tag("~>"),
        tag(">"),
        tag("<"),
        tag("="),
        tag("~"),
        tag("^"),
    ))
    .map(|text| Token { text, at: input })
    .parse(input)
}

fn pattern(input: &str) -> IResult<&str, Token<'_>> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '+' | '-'))
        .map(|text| Token { text, at: input })
        .parse(input)
}

/// Turn an operator token and a pattern token into a constraint.
fn lower(
    input: &str,
    operator: Option<Token<'_>>,
    pattern: Token<'_>,
) -> Result<Constraint, ParseError> {
    let operator = match operator {
        Some(token) => token
            .text
            .parse::<Operator>()
            .map_err(|_| syntax!(input, token.at => "unknown operator '{}'", token.text))?,
        None => Operator::Equal,
    };
    let (target, specificity) = target_of(input, pattern)?;
    Ok(Constraint::new(operator, target, specificity))
}

/// Interpret a version pattern, which may leave trailing components
/// unspecified by omitting them or writing a wildcard.
///
/// Unspecified positions are zero in the resulting target;
/// extra components are kept only up to the first wildcard.
fn target_of(input: &str, token: Token<'_>) -> Result<(Version, Specificity), ParseError> {
    let invalid = || syntax!(input, token.at => "invalid version pattern '{}'", token.text);
    let (_, prefix, core, pre, build) = regex_captures!(
        r"^([vV]?)((?:\d+|[xX*])(?:\.(?:\d+|[xX*]))*)(?:-((?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*)(?:\.(?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*))*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
        token.text
    )
    .ok_or_else(invalid)?;

    let parts = core
        .split('.')
        .map(|part| match part {
            "x" | "X" | "*" => Ok(None),
            digits => digits.parse::<u64>().map(Some).map_err(|_| invalid()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let specified = parts.iter().take_while(|part| part.is_some()).count();
    if parts[specified..].iter().any(Option::is_some) {
        return Err(
            syntax!(input, token.at => "version pattern '{}' has a number after a wildcard", token.text),
        );
    }
    let wildcard = specified < parts.len();
    let numbers = parts.into_iter().flatten().collect::<Vec<_>>();

    let specificity = match numbers.len() {
        0 => Specificity::MajorOnly,
        1 => Specificity::MinorOnly,
        2 => Specificity::PatchOnly,
        _ if wildcard => Specificity::ExtraOnly,
        _ => Specificity::Full,
    };

    let target = Version::builder()
        .major(numbers.first().copied().unwrap_or_default())
        .minor(numbers.get(1).copied().unwrap_or_default())
        .patch(numbers.get(2).copied().unwrap_or_default())
        .extra(numbers.get(3..).unwrap_or_default().to_vec())
        .prerelease(pre)
        .metadata(build)
        .build()
        .with_prefix(prefix);
    Ok((target, specificity))
}
