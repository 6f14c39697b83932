// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The last stage of a tick: rules that look at the finalized states and the
//! topology, and report what looks wrong.
//!
//! Every rule runs independently, and none of them stop the simulation.

mod ratings;
mod topology;

use std::collections::BTreeMap;

use crate::{ComponentCategory, ComponentGraph, Edge, Environment, Node};

use super::{NodeState, Report};

pub(crate) struct DiagnosticsEngine<'a, N, E>
where
    N: Node,
    E: Edge,
{
    graph: &'a ComponentGraph<N, E>,
    environment: &'a Environment,
    states: &'a BTreeMap<u64, NodeState>,
    report: Report,
}

impl<'a, N, E> DiagnosticsEngine<'a, N, E>
where
    N: Node,
    E: Edge,
{
    pub(crate) fn new(
        graph: &'a ComponentGraph<N, E>,
        environment: &'a Environment,
        states: &'a BTreeMap<u64, NodeState>,
    ) -> Self {
        Self {
            graph,
            environment,
            states,
            report: Report::default(),
        }
    }

    /// Runs all rules and returns what they found.
    pub(crate) fn evaluate(mut self) -> Report {
        self.check_disconnected_components();
        self.check_unpowered_loads();
        self.check_solar_chargers();
        self.check_alternators();
        self.check_chargers();
        self.check_battery_usage();
        self.check_missing_fuses();
        self.check_ground_bus();
        self.check_alternator_lithium();

        self.check_fuse_ratings();
        self.check_undersized_fuses();
        self.check_solar_voc();
        self.check_daily_demand();
        self.check_charge_rates();
        self.check_discharge_rates();
        self.check_parallel_batteries();
        self.check_bus_bars();

        tracing::debug!(
            "Diagnostics: {} warnings, {} errors.",
            self.report.warnings.len(),
            self.report.errors.len()
        );

        self.report
    }

    fn state(&self, component_id: u64) -> Option<&'a NodeState> {
        self.states.get(&component_id)
    }
}

fn describe(category: ComponentCategory) -> &'static str {
    match category {
        ComponentCategory::PowerSource => "Power source",
        ComponentCategory::Charging => "Charger",
        ComponentCategory::Protection => "Protection device",
        ComponentCategory::Distribution => "Distribution bus",
        ComponentCategory::Switching => "Switch",
        ComponentCategory::Load => "Load",
        ComponentCategory::Ground => "Ground bus",
    }
}
