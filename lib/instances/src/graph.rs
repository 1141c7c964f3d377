//! All-pairs shortest paths over the street graph.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use crate::Map;
use crate::dataset::pizzabot::{Node, Time};

/// Shortest travel times between every ordered pair of connected nodes, plus the shortest path
/// tree of every source so full paths can be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortestPaths {
  pub travel_time: Map<(Node, Node), Time>,
  /// `(s, v) -> u` when `u` precedes `v` on the shortest path from `s`
  pub predecessor: Map<(Node, Node), Node>,
}

/// Runs Dijkstra from every node over the directed `arcs`.  Unreachable pairs are absent from
/// the result.  Arc lengths must be nonnegative.
pub fn shortest_paths(nodes: &[Node], arcs: &[(Node, Node, Time)]) -> ShortestPaths {
  let mut adjacency: Map<Node, Vec<(Node, Time)>> = Map::default();
  for &(u, v, t) in arcs {
    debug_assert!(t >= 0);
    adjacency.entry(u).or_insert_with(Vec::new).push((v, t));
  }

  let mut result = ShortestPaths::default();
  for &source in nodes {
    let mut dist: Map<Node, Time> = Map::default();
    let mut pred: Map<Node, Node> = Map::default();
    let mut queue = BinaryHeap::new();
    dist.insert(source, 0);
    queue.push(Reverse((0, source)));

    while let Some(Reverse((d, u))) = queue.pop() {
      if d > dist[&u] {
        continue;
      }
      for &(v, t) in adjacency.get(&u).map(Vec::as_slice).unwrap_or(&[]) {
        let dv = d + t;
        if dist.get(&v).map_or(true, |&old| dv < old) {
          dist.insert(v, dv);
          pred.insert(v, u);
          queue.push(Reverse((dv, v)));
        }
      }
    }

    for (v, d) in dist {
      result.travel_time.insert((source, v), d);
    }
    for (v, u) in pred {
      if v != source {
        result.predecessor.insert((source, v), u);
      }
    }
  }
  result
}

/// Straight-line travel times between every ordered pair of points, rounded to whole minutes.
/// Paths are direct hops.
pub fn euclidean(points: &[(Node, (f64, f64))]) -> ShortestPaths {
  let mut travel_time = Map::default();
  for &(u, (x1, y1)) in points {
    for &(v, (x2, y2)) in points {
      let t = (x1 - x2).hypot(y1 - y2).round() as Time;
      travel_time.insert((u, v), t);
    }
  }
  ShortestPaths { travel_time, predecessor: Map::default() }
}

impl ShortestPaths {
  /// Nodes visited going from `from` to `to`, excluding `from` and including `to`.
  /// Falls back to the direct hop when no path information is stored.
  pub fn path(&self, from: Node, to: Node) -> Vec<Node> {
    let mut path = Vec::new();
    let mut current = to;
    while current != from {
      path.push(current);
      current = match self.predecessor.get(&(from, current)) {
        Some(&u) => u,
        None => from,
      };
    }
    path.reverse();
    path
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn line_graph() -> ShortestPaths {
    // 0 - 1 - 2 - 3, plus a slow shortcut 0 -> 3
    let arcs = vec![
      (0, 1, 2), (1, 0, 2),
      (1, 2, 2), (2, 1, 2),
      (2, 3, 2), (3, 2, 2),
      (0, 3, 10),
    ];
    shortest_paths(&[0, 1, 2, 3], &arcs)
  }

  #[test]
  fn dijkstra_prefers_cheaper_detour() {
    let sp = line_graph();
    assert_eq!(sp.travel_time[&(0, 3)], 6);
    assert_eq!(sp.travel_time[&(3, 0)], 6);
    assert_eq!(sp.travel_time[&(2, 2)], 0);
    assert_eq!(sp.path(0, 3), vec![1, 2, 3]);
    assert_eq!(sp.path(3, 1), vec![2, 1]);
    assert_eq!(sp.path(1, 1), Vec::<Node>::new());
  }

  #[test]
  fn unreachable_pairs_are_absent() {
    let sp = shortest_paths(&[0, 1, 2], &[(0, 1, 3)]);
    assert_eq!(sp.travel_time.get(&(0, 1)), Some(&3));
    assert_eq!(sp.travel_time.get(&(1, 0)), None);
    assert_eq!(sp.travel_time.get(&(0, 2)), None);
  }

  #[test]
  fn euclidean_rounds_distances() {
    let sp = euclidean(&[(0, (0.0, 0.0)), (1, (3.0, 4.0)), (2, (1.0, 1.0))]);
    assert_eq!(sp.travel_time[&(0, 1)], 5);
    assert_eq!(sp.travel_time[&(1, 0)], 5);
    assert_eq!(sp.travel_time[&(0, 2)], 1);
    assert_eq!(sp.travel_time[&(1, 1)], 0);
    assert_eq!(sp.path(0, 1), vec![1]);
  }

  proptest! {
    #[test]
    fn path_length_matches_travel_time(
      weights in proptest::collection::vec(0..20i64, 12),
      from in 0..4u32,
      to in 0..4u32,
    ) {
      let pairs = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (1, 3)];
      let mut arcs = Vec::new();
      for (k, &(u, v)) in pairs.iter().enumerate() {
        arcs.push((u, v, weights[2 * k]));
        arcs.push((v, u, weights[2 * k + 1]));
      }
      let sp = shortest_paths(&[0, 1, 2, 3], &arcs);
      let path = sp.path(from, to);
      let mut length = 0;
      let mut current = from;
      for &next in &path {
        length += sp.travel_time[&(current, next)];
        current = next;
      }
      prop_assert_eq!(length, sp.travel_time[&(from, to)]);
    }
  }
}
