//! Text formats: solution files, bot instruction files and evaluation reports.
use std::io::{self, Write};
use std::path::Path;
use anyhow::{anyhow, Context, Result};
use nom::Finish;
use instances::clock::format_hm;

use crate::data::*;
use crate::evaluate::Evaluation;
use crate::instructions::{self, Action};
use crate::optimize::Outcome;
use crate::route::Route;
use crate::solution::Solution;

mod parsers {
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::tag,
        character::complete::{alphanumeric1, char, space0, space1},
        combinator::{all_consuming, recognize, value},
        error::ParseError,
        multi::many0,
        sequence::{pair, preceded, terminated, tuple},
    };
    use crate::data::StopKind;

    fn ident<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
        recognize(pair(alphanumeric1, many0(alt((alphanumeric1, tag("_"), tag("-"))))))(input)
    }

    fn stop<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (StopKind, &'a str), E> {
        pair(
            alt((value(StopKind::Pickup, char('+')), value(StopKind::Delivery, char('-')))),
            ident,
        )(input)
    }

    /// `<bot>: +<order> -<order> ...`
    pub fn route_line<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (&'a str, Vec<(StopKind, &'a str)>), E> {
        all_consuming(tuple((
            terminated(ident, pair(space0, char(':'))),
            terminated(many0(preceded(space1, stop)), space0),
        )))(input)
    }
}

/// Reads a solution file for `data`.  Bots without a line get an empty route.
pub fn parse_solution(data: &PizzaInstance, text: &str) -> Result<Solution> {
    let mut routes = Vec::new();
    for (k, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() { continue }
        let lineno = k + 1;
        let (_, (bot, stops)) = parsers::route_line::<nom::error::Error<&str>>(line)
            .finish()
            .map_err(|_| anyhow!("line {}: expected `<bot>: +<order> ... -<order>`, found {:?}", lineno, line))?;
        let b = data.bot_index(bot).ok_or_else(|| anyhow!("line {}: unknown bot {}", lineno, bot))?;
        let stops = stops.into_iter()
            .map(|(kind, name)| {
                data.order_index(name)
                    .map(|order| Stop { order, kind })
                    .ok_or_else(|| anyhow!("line {}: unknown order {}", lineno, name))
            })
            .collect::<Result<Vec<_>>>()?;
        routes.push(Route::new(b, stops));
    }
    Ok(Solution::new(data, routes)?)
}

pub fn read_solution(data: &PizzaInstance, path: impl AsRef<Path>) -> Result<Solution> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    parse_solution(data, &text).with_context(|| format!("invalid solution file {:?}", path))
}

pub fn write_solution(mut w: impl Write, data: &PizzaInstance, solution: &Solution) -> io::Result<()> {
    for route in solution.routes() {
        write!(w, "{}:", data.bot(route.bot).name)?;
        for &s in &route.stops {
            write!(w, " {}", data.stop_label(s))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Bot program in the instruction file format.  Waiting is implicit.
pub fn write_instructions(mut w: impl Write, data: &PizzaInstance, solution: &Solution, b: BotIdx) -> io::Result<()> {
    writeln!(w, "[{}]", data.bot(b).name)?;
    for instr in instructions::generate(data, solution, b) {
        match instr.action {
            Action::TravelTo(n) => writeln!(w, "go to {}", n)?,
            Action::WaitUntil(_) => {},
            Action::PickUp(_) => writeln!(w, "collect food")?,
            Action::Deliver(_) => writeln!(w, "deliver food")?,
        }
    }
    Ok(())
}

pub fn write_all_instructions(mut w: impl Write, data: &PizzaInstance, solution: &Solution) -> io::Result<()> {
    for b in 0..data.bots().len() {
        if b > 0 { writeln!(w)?; }
        write_instructions(&mut w, data, solution, b)?;
    }
    Ok(())
}

fn evaluation_json(data: &PizzaInstance, eval: &Evaluation) -> json::JsonValue {
    let orders: Vec<json::JsonValue> = eval.orders.iter()
        .map(|o| json::object!{
            order: data.order(o.order).name.as_str(),
            bot: o.bot.map_or(json::JsonValue::Null, |b| data.bot(b).name.as_str().into()),
            pickup: o.pickup.map_or(json::JsonValue::Null, |t| format_hm(t).into()),
            arrival: o.delivery.map_or_else(|| "unserved".to_string(), format_hm),
            freshness: o.freshness,
        })
        .collect();
    json::object!{
        curve: eval.curve.to_string(),
        horizon: eval.curve.horizon(),
        score: eval.total_freshness,
        served: eval.served(),
        total_travel_time: eval.total_travel_time,
        makespan: eval.makespan.map_or(json::JsonValue::Null, |t| format_hm(t).into()),
        orders: orders,
    }
}

pub fn evaluation_text(mut w: impl Write, data: &PizzaInstance, eval: &Evaluation) -> io::Result<()> {
    writeln!(w, "score {:.6}", eval.total_freshness)?;
    writeln!(w, "served {}/{}, total travel time {}, makespan {}",
             eval.served(), eval.orders.len(), eval.total_travel_time,
             eval.makespan.map_or_else(|| "-".to_string(), format_hm))?;
    for o in &eval.orders {
        let arrival = o.delivery.map_or_else(|| "unserved".to_string(), format_hm);
        writeln!(w, "{} {} {:.6}", data.order(o.order).name, arrival, o.freshness)?;
    }
    Ok(())
}

/// Summary of an optimization run.
pub fn outcome_json(data: &PizzaInstance, outcome: &Outcome) -> json::JsonValue {
    let mut root = json::object!{
        instance: data.id(),
        status: outcome.label(),
    };
    if let Some(report) = outcome.report() {
        root["gap"] = report.status.gap().map_or(json::JsonValue::Null, Into::into);
        root["solver_objective"] = report.solver_objective.map_or(json::JsonValue::Null, Into::into);
        root["evaluation"] = evaluation_json(data, &report.evaluation);
        root["routes"] = report.solution.routes().iter()
            .map(|r| {
                let stops: Vec<String> = r.stops.iter().map(|&s| data.stop_label(s)).collect();
                json::object!{ bot: data.bot(r.bot).name.as_str(), stops: stops }
            })
            .collect::<Vec<_>>()
            .into();
        root["warnings"] = report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>().into();
    }
    root
}

pub fn evaluation_report_json(data: &PizzaInstance, eval: &Evaluation) -> json::JsonValue {
    let mut root = evaluation_json(data, eval);
    root["instance"] = data.id().into();
    root
}

pub fn outcome_text(mut w: impl Write, data: &PizzaInstance, outcome: &Outcome) -> io::Result<()> {
    write!(w, "{}: {}", data.id(), outcome.label())?;
    match outcome.report() {
        None => writeln!(w),
        Some(report) => {
            match report.status.gap() {
                Some(gap) => writeln!(w, " (gap {:.4})", gap)?,
                None => writeln!(w)?,
            }
            for warning in &report.warnings {
                writeln!(w, "warning: {}", warning)?;
            }
            evaluation_text(&mut w, data, &report.evaluation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::freshness::DecayCurve;
    use crate::testing::*;

    fn batched() -> (PizzaInstance, Solution) {
        let data = one_bot_two_orders();
        let sol = Solution::new(&data, vec![
            Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)])
        ]).unwrap();
        (data, sol)
    }

    #[test]
    fn solution_file_round_trip() {
        let (data, sol) = batched();
        let mut buf = Vec::new();
        write_solution(&mut buf, &data, &sol).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Bot1: +A +B -A -B\n");
        assert_eq!(parse_solution(&data, &text).unwrap(), sol);
    }

    #[test]
    fn solution_file_errors() {
        let data = one_bot_two_orders();
        assert_eq!(parse_solution(&data, "# nothing\n\n").unwrap().unserved().count(), 2);
        assert!(parse_solution(&data, "Bot1: +A -A\n").is_ok());
        assert!(parse_solution(&data, "Bot2: +A -A\n").is_err());
        assert!(parse_solution(&data, "Bot1: +A -C\n").is_err());
        assert!(parse_solution(&data, "Bot1: -A +A\n").is_err());
        assert!(parse_solution(&data, "Bot1 +A -A\n").is_err());
        assert!(parse_solution(&data, "Bot1: +A *A\n").is_err());
    }

    #[test]
    fn instruction_file() {
        let (data, sol) = batched();
        let mut buf = Vec::new();
        write_all_instructions(&mut buf, &data, &sol).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\
[Bot1]
collect food
collect food
go to 1
deliver food
deliver food
");
    }

    #[test]
    fn reports() {
        let (data, sol) = batched();
        let eval = evaluate(&data, &sol, &DecayCurve::default()).unwrap();
        let json = evaluation_report_json(&data, &eval);
        assert_eq!(json["instance"], "one-bot-two-orders");
        assert_eq!(json["orders"][1]["arrival"], "00:15");
        assert_eq!(json["orders"][0]["bot"], "Bot1");
        assert_eq!(json["makespan"], "00:15");

        let mut buf = Vec::new();
        evaluation_text(&mut buf, &data, &eval).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("score 1.583333\n"));
        assert!(text.contains("B 00:15 0.833333"));

        let outcome = Outcome::Inconclusive;
        assert_eq!(outcome_json(&data, &outcome)["status"], "inconclusive");
    }
}
