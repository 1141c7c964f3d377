//! Turn-by-turn commands for a bot and a replay that recovers service times from them.
use std::cmp::max;
use std::fmt;
use instances::clock::format_hm;

use crate::*;
use crate::data::*;
use crate::solution::Solution;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Action {
    /// Drive to an adjacent node of the street graph.
    TravelTo(Node),
    WaitUntil(Time),
    PickUp(OrderIdx),
    Deliver(OrderIdx),
}

/// An action stamped with the time it completes (arrival for travel, service start otherwise).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Instruction {
    pub time: Time,
    pub action: Action,
}

pub struct InstructionDisplay<'a> {
    data: &'a PizzaInstance,
    instr: &'a Instruction,
}

impl Instruction {
    pub fn display<'a>(&'a self, data: &'a PizzaInstance) -> InstructionDisplay<'a> {
        InstructionDisplay { data, instr: self }
    }
}

impl fmt::Display for InstructionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", format_hm(self.instr.time))?;
        match self.instr.action {
            Action::TravelTo(n) => write!(f, "go to {}", n),
            Action::WaitUntil(t) => write!(f, "wait until {}", format_hm(t)),
            Action::PickUp(o) => write!(f, "collect food for {}", self.data.order(o).name),
            Action::Deliver(o) => write!(f, "deliver food for {}", self.data.order(o).name),
        }
    }
}

/// Instructions for bot `b`, passing through every intermediate node of the street graph.
pub fn generate(data: &PizzaInstance, solution: &Solution, b: BotIdx) -> Vec<Instruction> {
    let route = solution.route(b);
    let mut instructions = Vec::new();
    let mut here = data.bot(b).start;
    let mut t = data.bot(b).available;

    for (&s, st) in route.stops.iter().zip(solution.schedule(b)) {
        let target = data.stop_location(s);
        if target != here {
            let mut prev = here;
            for node in data.path(here, target) {
                t += data.try_travel_time(prev, node).unwrap_or(0);
                let time = if node == target { st.arrival } else { t };
                instructions.push(Instruction { time, action: Action::TravelTo(node) });
                prev = node;
            }
        }
        if st.begin > st.arrival {
            instructions.push(Instruction { time: st.begin, action: Action::WaitUntil(st.begin) });
        }
        let action = match s.kind {
            StopKind::Pickup => Action::PickUp(s.order),
            StopKind::Delivery => Action::Deliver(s.order),
        };
        instructions.push(Instruction { time: st.begin, action });
        here = target;
        t = st.departure;
    }
    instructions
}

/// Simulates bot `b` executing `instructions`, returning the service start of every pickup and
/// delivery in the order performed.
pub fn replay(data: &PizzaInstance, b: BotIdx, instructions: &[Instruction]) -> Result<Vec<Time>, Error> {
    let service = data.service_time();
    let mut here = data.bot(b).start;
    let mut t = data.bot(b).available;
    let mut begins = Vec::new();

    let at = |here: Node, expected: Node, what: &str, o: OrderIdx| {
        if here == expected {
            Ok(())
        } else {
            Err(Error::InfeasibleRoute(format!("{} of order {} attempted at node {} instead of {}", what, data.order(o).name, here, expected)))
        }
    };

    for instr in instructions {
        match instr.action {
            Action::TravelTo(n) => {
                t += data.try_travel_time(here, n)
                    .ok_or_else(|| Error::InfeasibleRoute(format!("no connection from node {} to {}", here, n)))?;
                here = n;
            },
            Action::WaitUntil(until) => t = max(t, until),
            Action::PickUp(o) => {
                at(here, data.order(o).pickup, "pickup", o)?;
                t = max(t, data.order(o).ready);
                begins.push(t);
                t += service;
            },
            Action::Deliver(o) => {
                at(here, data.order(o).delivery, "delivery", o)?;
                begins.push(t);
                t += service;
            },
        }
    }
    Ok(begins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::FormulationParams;
    use crate::heuristic::insertion;
    use crate::route::Route;
    use crate::schedule::arrival_times;
    use crate::testing::*;
    use instances::graph::shortest_paths;
    use proptest::prelude::*;

    /// Street chain 0 - 1 - 2 - 3 with the restaurant at 0 and customers at 2 and 3.
    fn chain() -> PizzaInstance {
        let arcs: Vec<_> = [(0, 1, 4), (1, 2, 3), (2, 3, 5)].iter()
            .flat_map(|&(a, b, t)| vec![(a, b, t), (b, a, t)])
            .collect();
        InstanceBuilder::new("chain")
            .nodes(0..4)
            .shortest_paths(shortest_paths(&[0, 1, 2, 3], &arcs))
            .order(Order::new("A", 0, 2, 0))
            .order(Order::new("B", 0, 3, 10))
            .bot(Bot::new("X", 1, 2))
            .build()
            .unwrap()
    }

    #[test]
    fn passes_through_intermediate_nodes() {
        let data = chain();
        let sol = Solution::new(&data, vec![
            Route::new(0, vec![Stop::pickup(0), Stop::pickup(1), Stop::delivery(0), Stop::delivery(1)])
        ]).unwrap();
        let instr = generate(&data, &sol, 0);
        let actions: Vec<_> = instr.iter().map(|i| (i.time, i.action)).collect();
        assert_eq!(actions, vec![
            (4, Action::TravelTo(0)),
            (4, Action::PickUp(0)),
            (10, Action::WaitUntil(10)),
            (10, Action::PickUp(1)),
            (14, Action::TravelTo(1)),
            (17, Action::TravelTo(2)),
            (17, Action::Deliver(0)),
            (22, Action::TravelTo(3)),
            (22, Action::Deliver(1)),
        ]);
        assert_eq!(replay(&data, 0, &instr).unwrap(), arrival_times(&data, sol.route(0), 0));
        assert_eq!(instr[2].display(&data).to_string(), "00:10 wait until 00:10");
        assert_eq!(instr[3].display(&data).to_string(), "00:10 collect food for B");
    }

    #[test]
    fn replay_rejects_wrong_location() {
        let data = chain();
        let instr = vec![Instruction { time: 0, action: Action::Deliver(0) }];
        assert!(replay(&data, 0, &instr).is_err());
    }

    proptest! {
        #[test]
        fn replay_matches_schedule(data in random_instance(5, 2, 2..4)) {
            let sol = insertion(&data, &FormulationParams::default()).unwrap();
            for (b, route) in sol.routes().iter().enumerate() {
                let instr = generate(&data, &sol, b);
                let start = data.bot(b).available;
                prop_assert_eq!(replay(&data, b, &instr).unwrap(), arrival_times(&data, route, start));
                for w in instr.windows(2) {
                    prop_assert!(w[0].time <= w[1].time);
                }
            }
        }
    }
}
