//! Directed exchange rate storage.

use std::collections::BTreeMap;

use fxroute_common::Currency;

/// Store of directed rates, keyed by source then destination currency.
///
/// Codes are taken as given; no normalization happens here. Ordered maps keep
/// iteration deterministic so graphs rebuilt from the table are too.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: BTreeMap<Currency, BTreeMap<Currency, f64>>,
}

impl RateTable {
    /// Insert or overwrite the directed entry `from -> to`.
    pub fn put(&mut self, from: Currency, to: Currency, rate: f64) {
        self.rates.entry(from).or_default().insert(to, rate);
    }

    /// Insert `from -> to` at `rate` and `to -> from` at `1 / rate`.
    pub fn put_with_inverse(&mut self, from: Currency, to: Currency, rate: f64) {
        self.put(to.clone(), from.clone(), 1.0 / rate);
        self.put(from, to, rate);
    }

    /// Direct rate lookup. `None` means there is no direct rate.
    pub fn lookup(&self, from: &Currency, to: &Currency) -> Option<f64> {
        self.rates.get(from).and_then(|row| row.get(to)).copied()
    }

    pub fn clear(&mut self) {
        self.rates.clear();
    }

    /// Every directed entry as `(from, to, rate)`.
    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Currency, f64)> {
        self.rates
            .iter()
            .flat_map(|(from, row)| row.iter().map(move |(to, rate)| (from, to, *rate)))
    }

    /// All currencies appearing on either side of an entry, sorted.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self
            .iter()
            .flat_map(|(from, to, _)| [from.clone(), to.clone()])
            .collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }

    /// Number of directed entries.
    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_lookup() {
        let mut table = RateTable::default();
        assert!(table.is_empty());
        table.put(Currency::usd(), Currency::eur(), 0.9);
        assert!(!table.is_empty());

        assert_eq!(table.lookup(&Currency::usd(), &Currency::eur()), Some(0.9));
        assert_eq!(table.lookup(&Currency::eur(), &Currency::usd()), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_put_with_inverse() {
        let mut table = RateTable::default();
        table.put_with_inverse(Currency::usd(), Currency::eur(), 0.8);

        assert_eq!(table.lookup(&Currency::usd(), &Currency::eur()), Some(0.8));
        assert_eq!(table.lookup(&Currency::eur(), &Currency::usd()), Some(1.25));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut table = RateTable::default();
        table.put_with_inverse(Currency::usd(), Currency::eur(), 0.8);
        // An explicit reverse entry replaces the implied inverse.
        table.put_with_inverse(Currency::eur(), Currency::usd(), 1.3);

        assert_eq!(table.lookup(&Currency::eur(), &Currency::usd()), Some(1.3));
        assert_eq!(table.lookup(&Currency::usd(), &Currency::eur()), Some(1.0 / 1.3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_currencies_and_clear() {
        let mut table = RateTable::default();
        table.put_with_inverse(Currency::usd(), Currency::eur(), 0.8);
        table.put_with_inverse(Currency::gbp(), Currency::usd(), 1.27);

        assert_eq!(
            table.currencies(),
            vec![Currency::eur(), Currency::gbp(), Currency::usd()]
        );

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.currencies().is_empty());
    }
}
