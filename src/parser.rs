//! S-expression parsing from text.
//!
//! The grammar is tiny: quotes, parenthesised lists, numbers, string
//! literals, the `@` unit literal, and atoms. Line comments start with `;`
//! and run to the end of the line; they leave no tokens behind. Every
//! failure surfaces as the single parse error kind at the [`parse_all`]
//! boundary, since parse errors carry no value or scope context.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{opt, recognize},
    sequence::preceded,
};

use crate::Error;
use crate::ast::Value;

/// A symbol character is any ASCII letter or punctuation byte that is not
/// list, string, or quote syntax. Digits are not symbol characters.
fn is_symbol_char(c: char) -> bool {
    (c.is_ascii_alphabetic() || c.is_ascii_punctuation()) && !"()\"'".contains(c)
}

/// Skip whitespace and `;` line comments before a token.
fn skip_junk(mut input: &str) -> &str {
    loop {
        input = input.trim_start();
        match input.strip_prefix(';') {
            Some(comment) => input = comment.split_once('\n').map_or("", |(_, tail)| tail),
            None => return input,
        }
    }
}

/// Parse an integer or float. A leading `-` belongs to the number only when
/// a digit follows; the presence of `.` in the lexeme selects float.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let digits = || take_while1(|c: char| c.is_ascii_digit());
    let (rest, text) = recognize((
        opt(char('-')),
        digits(),
        opt(preceded(char('.'), digits())),
    ))
    .parse(input)?;

    let value = if text.contains('.') {
        match text.parse::<f64>() {
            Ok(x) => Value::Float(x),
            Err(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Float,
                )));
            }
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                // Out-of-range literal; nothing else can consume it either.
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Digit,
                )));
            }
        }
    };
    Ok((rest, value))
}

/// Parse a string literal, decoding the `\\`, `\"`, `\n`, and `\t` escapes.
/// Any other backslash sequence is preserved literally.
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut text = String::new();

    loop {
        let mut chars = remaining.chars();
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), Value::String(text))),
            Some('\\') => {
                match chars.next() {
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => {
                        // Backslash at end of input: the string never closes.
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            nom::error::ErrorKind::Char,
                        )));
                    }
                }
                remaining = chars.as_str();
            }
            Some(ch) => {
                text.push(ch);
                remaining = chars.as_str();
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

fn parse_unit(input: &str) -> IResult<&str, Value> {
    let (rest, _) = char('@').parse(input)?;
    Ok((rest, Value::Unit))
}

fn parse_atom(input: &str) -> IResult<&str, Value> {
    let (rest, name) = take_while1(is_symbol_char).parse(input)?;
    Ok((rest, Value::atom(name)))
}

/// Parse `'expr` into a Quote-tagged value.
fn parse_quote(input: &str) -> IResult<&str, Value> {
    let (rest, _) = char('\'').parse(input)?;
    let (rest, inner) = parse_expr(rest)?;
    Ok((rest, Value::quote(inner)))
}

fn parse_list(input: &str) -> IResult<&str, Value> {
    let (mut rest, _) = char('(').parse(input)?;
    let mut items = Vec::new();
    loop {
        rest = skip_junk(rest);
        if let Some(tail) = rest.strip_prefix(')') {
            return Ok((tail, Value::List(items)));
        }
        let (tail, item) = parse_expr(rest)?;
        items.push(item);
        rest = tail;
    }
}

/// Parse a single expression, advancing past any leading junk.
fn parse_expr(input: &str) -> IResult<&str, Value> {
    let input = skip_junk(input);
    alt((
        parse_quote,
        parse_list,
        parse_number,
        parse_string,
        parse_unit,
        parse_atom,
    ))
    .parse(input)
}

/// Parse a complete source text into its sequence of expressions. Residual
/// input that no expression can consume is a malformed program.
pub fn parse_all(source: &str) -> Result<Vec<Value>, Error> {
    let mut rest = skip_junk(source);
    let mut values = Vec::new();
    while !rest.is_empty() {
        match parse_expr(rest) {
            Ok((tail, value)) => {
                values.push(value);
                rest = skip_junk(tail);
            }
            Err(_) => return Err(Error::malformed()),
        }
    }
    Ok(values)
}
