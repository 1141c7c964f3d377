use std::path::Path;
use crate::Result;
use crate::raw::pizzabot::*;
use super::{
  ParseInstance,
  nom_prelude::*,
};

/// An instance file on disk.
#[derive(Debug, Copy, Clone)]
pub struct PizzabotFmt<P>(pub P);

/// Instance file contents already in memory.
#[derive(Debug, Copy, Clone)]
pub struct PizzabotStr<'a>(pub &'a str);

impl<P: AsRef<Path>> ParseInstance<PizzabotFmt<P>> for Pizzabot {
  fn parse(input: PizzabotFmt<P>) -> Result<Self> {
    let path = input.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    Pizzabot::parse(PizzabotStr(&data))
  }
}

impl<'a> ParseInstance<PizzabotStr<'a>> for Pizzabot {
  fn parse(input: PizzabotStr<'a>) -> Result<Self> {
    let data = strip_comments(input.0);
    match parsers::pizzabot(&data).finish() {
      Ok((_, instance)) => Ok(instance),
      Err(e) => Err(
        anyhow::Error::msg(error::convert_error(data.as_str(), e))
      ),
    }
  }
}

/// Drops `#` comments, surrounding blanks and empty lines.  Every kept line ends with `\n`.
fn strip_comments(input: &str) -> String {
  let mut data = String::with_capacity(input.len() + 1);
  for line in input.lines() {
    let line = match line.find('#') {
      Some(k) => &line[..k],
      None => line,
    };
    let line = line.trim();
    if !line.is_empty() {
      data.push_str(line);
      data.push('\n');
    }
  }
  data
}

mod parsers {
  use super::*;
  use super::super::common::*;

  const KEYWORDS: [&str; 7] = ["NODES", "EDGES", "ARCS", "RESTAURANTS", "CUSTOMERS", "ORDERS", "BOTS"];

  fn ident<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
      verify(
        recognize(pair(alphanumeric1, many0(alt((alphanumeric1, tag("_"), tag("-")))))),
        |s: &str| !KEYWORDS.contains(&s),
      ),
      String::from,
    )(input)
  }

  fn header<'a, O, E, F>(key: &'static str, value: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
    where
      F: Parser<&'a str, O, E>,
      E: ParseError<&'a str>,
  {
    delimited(pair(tag(key), pair(char(':'), space0)), value, line_end)
  }

  fn section<'a, O, E, F>(title: &'static str, line: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<O>, E>
    where
      F: Parser<&'a str, O, E>,
      E: ParseError<&'a str>,
  {
    preceded(
      pair(tag(title), line_end),
      many0(terminated(line, line_end)),
    )
  }

  fn node_line<'a, E>(i: &'a str) -> IResult<&'a str, (usize, Option<(f64, f64)>), E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    pair(
      usize_,
      opt(preceded(space1, separated_pair(double, space1, double))),
    )(i)
  }

  fn arc_line<'a, E>(i: &'a str) -> IResult<&'a str, (usize, usize, RawTime), E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    tuple((
      usize_,
      preceded(space1, usize_),
      preceded(space1, time_),
    ))(i)
  }

  fn place_line<'a, E>(i: &'a str) -> IResult<&'a str, (String, usize), E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    separated_pair(ident, space1, usize_)(i)
  }

  //   O3 R1 C2 11:05 11:45 2
  fn order_line<'a, E>(i: &'a str) -> IResult<&'a str, RawOrder, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    let (i, name) = ident(i)?;
    let (i, restaurant) = preceded(space1, ident)(i)?;
    let (i, customer) = preceded(space1, ident)(i)?;
    let (i, ready) = preceded(space1, time_)(i)?;
    let (i, deadline) = preceded(space1, alt((map(time_, Some), value(None, char('-')))))(i)?;
    let (i, size) = opt(preceded(space1, i64_))(i)?;
    Ok((i, RawOrder { name, restaurant, customer, ready, deadline, size: size.unwrap_or(1) }))
  }

  //   B1 0 2 11:00
  fn bot_line<'a, E>(i: &'a str) -> IResult<&'a str, RawBot, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    let (i, name) = ident(i)?;
    let (i, node) = preceded(space1, usize_)(i)?;
    let (i, capacity) = preceded(space1, i64_)(i)?;
    let (i, available) = opt(preceded(space1, time_))(i)?;
    Ok((i, RawBot { name, node, capacity, available }))
  }

  pub fn pizzabot(input: &str) -> IResult<&str, Pizzabot, error::VerboseError<&str>> {
    let (i, name) = opt(header("NAME", ident))(input)?;
    let (i, service_time) = opt(header("SERVICE", time_))(i)?;
    let (i, horizon) = opt(header("HORIZON", time_))(i)?;

    let (i, nodes) = context("nodes", section("NODES", node_line))(i)?;
    let (i, edges) = context("edges", opt(section("EDGES", arc_line)))(i)?;
    let (i, arcs) = context("arcs", opt(section("ARCS", arc_line)))(i)?;
    let (i, restaurants) = context("restaurants", section("RESTAURANTS", place_line))(i)?;
    let (i, customers) = context("customers", section("CUSTOMERS", place_line))(i)?;
    let (i, orders) = context("orders", section("ORDERS", order_line))(i)?;
    let (i, bots) = context("bots", section("BOTS", bot_line))(i)?;
    let (i, _) = eof(i)?;

    Ok((i, Pizzabot {
      name,
      service_time,
      horizon,
      nodes,
      edges: edges.unwrap_or_default(),
      arcs: arcs.unwrap_or_default(),
      restaurants,
      customers,
      orders,
      bots,
    }))
  }
}
