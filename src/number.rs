//! Unsigned integers with the base picked from the prefix: `0x` is hex, a
//! leading `0` is octal, anything else is decimal.

use nom::{
    branch::alt,
    bytes::complete as bytes,
    character::complete as character,
    combinator::{all_consuming, map_res, recognize, value},
    sequence::{pair, preceded},
    IResult,
};

fn hex(i: &str) -> IResult<&str, u64> {
    preceded(
        alt((bytes::tag("0x"), bytes::tag("0X"))),
        map_res(character::hex_digit1, |s| u64::from_str_radix(s, 16)),
    )(i)
}

fn octal(i: &str) -> IResult<&str, u64> {
    preceded(
        character::char('0'),
        map_res(character::oct_digit1, |s| u64::from_str_radix(s, 8)),
    )(i)
}

fn decimal(i: &str) -> IResult<&str, u64> {
    map_res(
        recognize(pair(character::one_of("123456789"), character::digit0)),
        |s: &str| s.parse::<u64>(),
    )(i)
}

pub fn number(i: &str) -> IResult<&str, u64> {
    alt((hex, octal, decimal, value(0, character::char('0'))))(i)
}

/// Parses the whole of `s` as a number. Trailing garbage, signs and overflow
/// all yield `None`.
pub fn parse_number(s: &str) -> Option<u64> {
    all_consuming(number)(s).ok().map(|(_, v)| v)
}
