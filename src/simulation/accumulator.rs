// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Per-battery power sums, collected by each stage of a tick.

use std::collections::BTreeMap;

/// Power flowing into and out of a battery's circuit, in watts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct BatteryPower {
    pub generation: f64,
    pub load: f64,
}

impl BatteryPower {
    pub(crate) fn net(&self) -> f64 {
        self.generation - self.load
    }
}

/// Maps battery ids to the power credited to their circuits.
///
/// Sums are commutative, so the order in which components of a stage are
/// credited doesn't matter.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct BatteryAccumulator(BTreeMap<u64, BatteryPower>);

impl BatteryAccumulator {
    pub(crate) fn add_generation(&mut self, battery_id: u64, power: f64) {
        self.0.entry(battery_id).or_default().generation += power;
    }

    pub(crate) fn add_load(&mut self, battery_id: u64, power: f64) {
        self.0.entry(battery_id).or_default().load += power;
    }

    /// Returns the power credited to the given battery, if any.
    pub(crate) fn get(&self, battery_id: u64) -> Option<BatteryPower> {
        self.0.get(&battery_id).copied()
    }

    /// Sums the given accumulators into one.
    pub(crate) fn merged<'a>(accumulators: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut merged = Self::default();
        for accumulator in accumulators {
            for (id, power) in &accumulator.0 {
                merged.add_generation(*id, power.generation);
                merged.add_load(*id, power.load);
            }
        }
        merged
    }
}
