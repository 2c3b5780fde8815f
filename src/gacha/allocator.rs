//! Greedy conversion of fractional token quantities into composite boxes.
//!
//! Quantities are expected counts, so they are real-valued. Composites are filled in
//! priority order, each taking `min` over its required tokens and depleting every one of
//! them, so higher-priority composites are satisfied at the expense of lower ones.
//!
//! The pass maximises total value only when priority is descending in value and each
//! composite's requirement set contains every lower-priority composite's set. That is not
//! checked here; `data::validate` warns when a table breaks it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Real-valued quantity per token type. Missing tokens read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenInventory(BTreeMap<String, f64>);

impl TokenInventory {
    pub fn get(&self, token: &str) -> f64 {
        self.0.get(token).copied().unwrap_or(0.0)
    }

    /// Smallest quantity among `tokens`; `None` for an empty set.
    pub fn min_of(&self, tokens: &[String]) -> Option<f64> {
        tokens
            .iter()
            .map(|token| self.get(token))
            .reduce(f64::min)
    }

    pub fn subtract(&mut self, tokens: &[String], amount: f64) {
        for token in tokens {
            *self.0.entry(token.clone()).or_insert(0.0) -= amount;
        }
    }
}

impl FromIterator<(String, f64)> for TokenInventory {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Token types each composite consumes, one unit of each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeRequirements(BTreeMap<String, Vec<String>>);

impl CompositeRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, composite: impl Into<String>, tokens: Vec<String>) {
        self.0.insert(composite.into(), tokens);
    }

    pub fn get(&self, composite: &str) -> Option<&[String]> {
        self.0.get(composite).map(Vec::as_slice)
    }
}

impl FromIterator<(String, Vec<String>)> for CompositeRequirements {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Composite counts in priority order. Works on a private copy; `inventory` is untouched.
///
/// Every composite in `priority_order` appears in the result, 0 when unattainable. A
/// composite with no requirements entry or an empty requirement set gets 0.
pub fn allocate(
    inventory: &TokenInventory,
    requirements: &CompositeRequirements,
    priority_order: &[String],
) -> BTreeMap<String, f64> {
    let mut remaining = inventory.clone();
    let mut allocation = BTreeMap::new();

    for composite in priority_order {
        let mut count = 0.0;
        if let Some(tokens) = requirements.get(composite) {
            if let Some(available) = remaining.min_of(tokens) {
                if available > 0.0 {
                    count = available;
                    remaining.subtract(tokens, available);
                }
            }
        }
        allocation.insert(composite.clone(), count);
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn inventory(entries: &[(&str, f64)]) -> TokenInventory {
        entries
            .iter()
            .map(|(name, quantity)| (name.to_string(), *quantity))
            .collect()
    }

    #[test]
    fn single_composite_consumes_matching_tokens() {
        let inventory = inventory(&[("A", 3.0), ("B", 3.0), ("C", 3.0)]);
        let mut requirements = CompositeRequirements::new();
        requirements.insert("box", tokens(&["A", "B", "C"]));

        let allocation = allocate(&inventory, &requirements, &tokens(&["box"]));

        assert_eq!(allocation.get("box"), Some(&3.0));
        assert_eq!(inventory.get("A"), 3.0, "input inventory must not be mutated");
    }

    #[test]
    fn higher_priority_composite_takes_shared_tokens_first() {
        let inventory = inventory(&[("A", 5.0), ("B", 5.0), ("C", 2.0)]);
        let mut requirements = CompositeRequirements::new();
        requirements.insert("big", tokens(&["A", "B", "C"]));
        requirements.insert("small", tokens(&["A", "B"]));

        let allocation = allocate(&inventory, &requirements, &tokens(&["big", "small"]));

        assert_eq!(allocation.get("big"), Some(&2.0));
        assert_eq!(allocation.get("small"), Some(&3.0));
    }

    #[test]
    fn unattainable_composites_report_zero() {
        let inventory = inventory(&[("A", 1.5)]);
        let mut requirements = CompositeRequirements::new();
        requirements.insert("needs-b", tokens(&["A", "B"]));
        requirements.insert("empty", Vec::new());

        let allocation = allocate(
            &inventory,
            &requirements,
            &tokens(&["needs-b", "empty", "undefined"]),
        );

        assert_eq!(allocation.len(), 3);
        assert!(allocation.values().all(|count| *count == 0.0));
    }

    #[test]
    fn fractional_quantities_are_allocated() {
        let inventory = inventory(&[("A", 0.25), ("B", 0.75)]);
        let mut requirements = CompositeRequirements::new();
        requirements.insert("pair", tokens(&["A", "B"]));
        let allocation = allocate(&inventory, &requirements, &tokens(&["pair"]));
        assert_eq!(allocation.get("pair"), Some(&0.25));
    }
}
