use super::nom_prelude::*;
use crate::clock;
use crate::raw::pizzabot::RawTime;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn i64_<'a, E>(input: &'a str) -> IResult<&'a str, i64, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_res(
    recognize(
      pair(
        opt(char('-')),
        digit1
      )
    ), i64::from_str)(input)
}

/// `HH:MM` wall-clock time.
pub fn clock_<'a, E>(input: &'a str) -> IResult<&'a str, RawTime, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  map_opt(
    separated_pair(i64_, char(':'), i64_),
    |(h, m)| clock::from_hm(h, m),
  )(input)
}

/// A time is either `HH:MM` or a (possibly negative) number of minutes.
pub fn time_<'a, E>(input: &'a str) -> IResult<&'a str, RawTime, E>
  where
    E: ParseError<&'a str> + error::FromExternalError<&'a str, ParseIntError>
{
  alt((clock_, i64_))(input)
}

/// Consumes trailing blanks and the newline ending a line.
pub fn line_end<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
  value((), pair(space0, newline))(input)
}
