//! Unweighted currency graph derived from the rate table.

use std::collections::BTreeMap;

use fxroute_common::Currency;

use crate::rate_table::RateTable;

/// Adjacency lists over currency codes. Every edge costs one hop.
#[derive(Debug, Clone, Default)]
pub struct CurrencyGraph {
    adjacency: BTreeMap<Currency, Vec<Currency>>,
}

impl CurrencyGraph {
    /// Add `from -> to` unless it already exists.
    pub fn add_edge(&mut self, from: Currency, to: Currency) {
        let neighbors = self.adjacency.entry(from).or_default();
        if !neighbors.contains(&to) {
            neighbors.push(to);
        }
    }

    /// Directly reachable currencies, in insertion order.
    pub fn neighbors(&self, code: &Currency) -> &[Currency] {
        self.adjacency.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, code: &Currency) -> bool {
        self.adjacency.contains_key(code)
    }

    /// Discard every edge and re-derive them from `table`.
    pub fn rebuild(&mut self, table: &RateTable) {
        self.adjacency.clear();
        for (from, to, _) in table.iter() {
            self.add_edge(from.clone(), to.clone());
        }
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
    }

    /// Number of currencies with outgoing edges.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}
