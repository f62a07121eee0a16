//! Fewest-hop path search over the currency graph.

use std::collections::{HashMap, VecDeque};

use fxroute_common::Currency;
use tracing::trace;

use crate::graph::CurrencyGraph;

/// Find the path with the fewest hops from `start` to `end`.
///
/// Every edge costs one hop, so a breadth-first search yields shortest paths.
/// A node's predecessor is fixed the first time it is discovered, which makes
/// the first path found under adjacency order win ties. Rates play no part.
///
/// Adjacency order is currency code order, because the graph is rebuilt from
/// an ordered rate table. It is not the order in which rates were configured:
/// with routes `AAA-CCC-DDD` and `AAA-BBB-DDD` the search goes through `BBB`
/// however the rates were listed, so equal configurations always route alike.
///
/// Returns `None` when `end` is unreachable, including when either code is not
/// in the graph. A search from a currency to itself returns the one-element
/// path `[start]`.
pub fn find_path(graph: &CurrencyGraph, start: &Currency, end: &Currency) -> Option<Vec<Currency>> {
    if start == end {
        return Some(vec![start.clone()]);
    }

    if !graph.contains(start) || !graph.contains(end) {
        return None;
    }

    let mut predecessors: HashMap<&Currency, &Currency> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for neighbor in graph.neighbors(current) {
            if neighbor == start || predecessors.contains_key(neighbor) {
                continue;
            }
            predecessors.insert(neighbor, current);

            if neighbor == end {
                let path = reconstruct(&predecessors, start, end);
                trace!(hops = path.len() - 1, "Path reached target");
                return Some(path);
            }

            queue.push_back(neighbor);
        }
    }

    None
}

/// Walk predecessor links back from `end` and reverse.
fn reconstruct(
    predecessors: &HashMap<&Currency, &Currency>,
    start: &Currency,
    end: &Currency,
) -> Vec<Currency> {
    let mut path = vec![end.clone()];
    let mut node = end;
    while node != start {
        match predecessors.get(node) {
            Some(previous) => {
                path.push((*previous).clone());
                node = *previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
