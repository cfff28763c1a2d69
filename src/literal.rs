//! Reads content documents, which are written as literal data expressions:
//! mappings (`{k: v}`), lists (`[a, b]`), tuples (`(a, b)`), strings, numbers,
//! and the constants `True`, `False`, and `None`. Strings follow the usual
//! literal rules: single, double, or triple quotes, backslash escapes, `r`
//! (raw) prefixes, and implicit concatenation of adjacent strings. `#` starts
//! a comment.
//!
//! Expressions are parsed into a [`serde_yaml::Value`] tree and then
//! deserialized into the caller's type, so the document types only need to
//! derive [`serde::Deserialize`].

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha0, char, multispace1, not_line_ending};
use nom::combinator::{all_consuming, cut, map, opt, recognize, value};
use nom::error::{ErrorKind, VerboseError, VerboseErrorKind};
use nom::multi::{many0_count, many1, separated_list0};
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::IResult;
use serde::de::DeserializeOwned;
use serde_yaml::{Number, Value};
use std::fmt;

type Parsed<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Parses `input` as a literal expression and deserializes it into a `T`.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    serde_yaml::from_value(parse(input)?).map_err(Error::Shape)
}

/// Parses `input` as a single literal expression. Surrounding whitespace and
/// comments are ignored; anything else after the expression is an error.
pub fn parse(input: &str) -> Result<Value> {
    match all_consuming(terminated(expression, space))(input) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            Err(Error::syntax(input, &err))
        }
        Err(nom::Err::Incomplete(_)) => {
            let end = &input[input.len()..];
            let err = VerboseError {
                errors: vec![(end, VerboseErrorKind::Context("unexpected end"))],
            };
            Err(Error::syntax(input, &err))
        }
    }
}

/// Whitespace (including newlines) and comments.
fn space(input: &str) -> Parsed<'_, ()> {
    let comment = recognize(pair(char('#'), not_line_ending));
    value((), many0_count(alt((multispace1, comment))))(input)
}

fn comma(input: &str) -> Parsed<'_, char> {
    preceded(space, char(','))(input)
}

fn expression(input: &str) -> Parsed<'_, Value> {
    preceded(
        space,
        alt((mapping, list, parenthesized, strings, number, constant)),
    )(input)
}

fn mapping(input: &str) -> Parsed<'_, Value> {
    let entry = separated_pair(expression, preceded(space, char(':')), cut(expression));
    map(
        delimited(
            char('{'),
            terminated(separated_list0(comma, entry), opt(comma)),
            cut(preceded(space, char('}'))),
        ),
        |entries| Value::Mapping(entries.into_iter().collect()),
    )(input)
}

fn list(input: &str) -> Parsed<'_, Value> {
    map(
        delimited(
            char('['),
            terminated(separated_list0(comma, expression), opt(comma)),
            cut(preceded(space, char(']'))),
        ),
        Value::Sequence,
    )(input)
}

/// A tuple, or a parenthesized expression when there's a single element and
/// no trailing comma. Tuples become sequences.
fn parenthesized(input: &str) -> Parsed<'_, Value> {
    let (input, _) = char::<_, VerboseError<&str>>('(')(input)?;
    let (input, mut items) = separated_list0(comma, expression)(input)?;
    let (input, trailing) = opt(comma)(input)?;
    let (input, _) = cut(preceded(space, char(')')))(input)?;
    if items.len() == 1 && trailing.is_none() {
        return Ok((input, items.remove(0)));
    }
    Ok((input, Value::Sequence(items)))
}

/// One or more adjacent string literals, concatenated.
fn strings(input: &str) -> Parsed<'_, Value> {
    map(many1(preceded(space, string)), |parts| {
        Value::String(parts.concat())
    })(input)
}

fn string(input: &str) -> Parsed<'_, String> {
    let (rest, prefix) = alpha0::<_, VerboseError<&str>>(input)?;
    let raw = match prefix.to_ascii_lowercase().as_str() {
        "" | "u" | "b" => false,
        "r" | "br" | "rb" => true,
        _ => {
            return Err(nom::Err::Error(VerboseError {
                errors: vec![(input, VerboseErrorKind::Nom(ErrorKind::Tag))],
            }))
        }
    };
    let (rest, quote) = alt((
        tag::<_, _, VerboseError<&str>>("'''"),
        tag("\"\"\""),
        tag("'"),
        tag("\""),
    ))(rest)?;
    body(rest, quote, raw)
}

/// Reads a string body up to and including the closing `quote`.
fn body<'a>(input: &'a str, quote: &str, raw: bool) -> Parsed<'a, String> {
    let triple = quote.len() == 3;
    let mut out = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        let rest = &input[i..];
        if rest.starts_with(quote) {
            return Ok((&rest[quote.len()..], out));
        }
        match c {
            '\n' if !triple => return fail(rest, "unterminated string"),
            '\\' => {
                let (j, escaped) = match chars.next() {
                    Some(next) => next,
                    None => break,
                };
                if raw {
                    out.push('\\');
                    out.push(escaped);
                    continue;
                }
                match escaped {
                    '\n' => {}
                    '\\' | '\'' | '"' => out.push(escaped),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    'f' => out.push('\x0c'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'v' => out.push('\x0b'),
                    '0'..='7' => {
                        let digits = input[j..]
                            .chars()
                            .take(3)
                            .take_while(|c| ('0'..='7').contains(c))
                            .count();
                        match code_point(&input[j..j + digits], 8) {
                            Some(c) => out.push(c),
                            None => return fail(rest, "invalid octal escape"),
                        }
                        for _ in 1..digits {
                            chars.next();
                        }
                    }
                    'x' | 'u' | 'U' => {
                        let digits = match escaped {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let hex = input
                            .get(j + 1..j + 1 + digits)
                            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));
                        match hex.and_then(|hex| code_point(hex, 16)) {
                            Some(c) => out.push(c),
                            None => return fail(rest, "invalid hexadecimal escape"),
                        }
                        for _ in 0..digits {
                            chars.next();
                        }
                    }
                    'N' => return fail(rest, "named unicode escapes aren't supported"),
                    _ => {
                        out.push('\\');
                        out.push(escaped);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    fail(&input[input.len()..], "unterminated string")
}

fn code_point(digits: &str, radix: u32) -> Option<char> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(std::char::from_u32)
}

fn number(input: &str) -> Parsed<'_, Value> {
    let (rest, text) = recognize_float::<_, VerboseError<&str>>(input)?;
    let number = if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        text.parse::<f64>().ok().map(Number::from)
    } else {
        text.parse::<i64>().ok().map(Number::from)
    };
    match number {
        Some(number) => Ok((rest, Value::Number(number))),
        None => fail(input, "invalid number"),
    }
}

fn constant(input: &str) -> Parsed<'_, Value> {
    alt((
        value(Value::Bool(true), tag("True")),
        value(Value::Bool(false), tag("False")),
        value(Value::Null, tag("None")),
    ))(input)
}

/// Aborts parsing at `input` with `message`.
fn fail<'a, O>(input: &'a str, message: &'static str) -> Parsed<'a, O> {
    Err(nom::Err::Failure(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(message))],
    }))
}

/// The result of reading a literal document.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading a literal document.
#[derive(Debug)]
pub enum Error {
    /// Returned when the input isn't a literal expression.
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Returned when the expression doesn't have the shape of the requested
    /// type (e.g., a missing field or a list where a string was expected).
    Shape(serde_yaml::Error),
}

impl Error {
    /// Locates the innermost error in `err` within `input`.
    fn syntax(input: &str, err: &VerboseError<&str>) -> Error {
        let (at, message) = match err.errors.first() {
            Some((at, VerboseErrorKind::Context(message))) => (*at, message.to_string()),
            Some((at, VerboseErrorKind::Char(c))) => (*at, format!("expected `{}`", c)),
            Some((at, VerboseErrorKind::Nom(ErrorKind::Eof))) => {
                (*at, "unexpected trailing input".to_owned())
            }
            Some((at, VerboseErrorKind::Nom(_))) => (*at, "expected a value".to_owned()),
            None => (input, "invalid syntax".to_owned()),
        };
        let consumed = &input[..input.len() - at.len()];
        Error::Syntax {
            line: consumed.matches('\n').count() + 1,
            column: consumed.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1,
            message,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax {
                line,
                column,
                message,
            } => write!(f, "line {}, column {}: {}", line, column, message),
            Error::Shape(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax { .. } => None,
            Error::Shape(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn string_value(input: &str) -> Result<String> {
        from_str(input)
    }

    #[test]
    fn test_triple_quoted_keeps_newlines() -> Result<()> {
        assert_eq!("<p>a</p>\n<p>b</p>", string_value("'''<p>a</p>\n<p>b</p>'''")?);
        assert_eq!("say \"hi\" ok", string_value(r#""""say "hi" ok""""#)?);
        Ok(())
    }

    #[test]
    fn test_adjacent_strings_concatenate() -> Result<()> {
        assert_eq!("<p>a</p><p>b</p>", string_value("('<p>a</p>' '<p>b</p>')")?);
        assert_eq!(
            "<p>a</p><p>b</p>",
            string_value("('<p>a</p>'  # first\n \"<p>b</p>\")")?
        );
        Ok(())
    }

    #[test]
    fn test_escapes() -> Result<()> {
        assert_eq!("<p>a</p>\n<p>b</p>", string_value(r"'<p>a</p>\n<p>b</p>'")?);
        assert_eq!("It's", string_value(r"'It\'s'")?);
        assert_eq!("tab\there", string_value(r#""tab\there""#)?);
        assert_eq!("AAè✓", string_value(r"'\x41\101è\U00002713'")?);
        assert_eq!(r"back\slash \d", string_value(r"'back\\slash \d'")?);
        assert_eq!("joined", string_value("'join\\\ned'")?);
        Ok(())
    }

    #[test]
    fn test_raw_strings() -> Result<()> {
        assert_eq!(r"a\nb", string_value(r"r'a\nb'")?);
        assert_eq!(r"\'", string_value(r"R'\''")?);
        Ok(())
    }

    #[test]
    fn test_containers() -> Result<()> {
        let value = parse(
            "{'a': [1, -2.5, True, None,], # trailing commas\n \
             'b': ('x', 'y'), 'c': (), 'd': ('z',)}",
        )?;
        let expected: Value = serde_yaml::from_str(
            "{a: [1, -2.5, true, null], b: [x, y], c: [], d: [z]}",
        )
        .map_err(Error::Shape)?;
        assert_eq!(expected, value);
        Ok(())
    }

    #[test]
    fn test_syntax_errors() {
        let cases: &[(&str, usize, usize)] = &[
            ("{'a': 'b'", 1, 10),
            ("{'a': 'b'}\n'c'", 2, 1),
            ("{'a':\n 'unterminated\n}", 2, 15),
            ("{'a': f'{b}'}", 1, 7),
            ("{'a': '\\x4'}", 1, 8),
            ("a: b", 1, 1),
        ];
        for (input, line, column) in cases {
            match parse(input) {
                Err(Error::Syntax {
                    line: l, column: c, ..
                }) => assert_eq!((*line, *column), (l, c), "input: {:?}", input),
                other => panic!("input {:?}: wanted a syntax error, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_shape_error() {
        assert!(matches!(string_value("['a']"), Err(Error::Shape(_))));
    }
}
