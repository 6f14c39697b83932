// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Rules about how components are wired together.

use crate::{component_category::CategoryPredicates, BatteryRole, Edge, Node};

use crate::simulation::batteries::chemistry;
use crate::simulation::roles::battery_role;
use crate::simulation::{DiagnosticCode, NodeStatus};

use super::{describe, DiagnosticsEngine};

impl<N, E> DiagnosticsEngine<'_, N, E>
where
    N: Node,
    E: Edge,
{
    /// Components without wires, and real components that reach nothing.
    pub(super) fn check_disconnected_components(&mut self) {
        let graph = self.graph;
        for node in graph.components() {
            let id = node.component_id();
            let message = if graph.wire_count(id) == 0 {
                format!(
                    "{} '{}' is not connected to anything.",
                    describe(node.category()),
                    node.name()
                )
            } else if !node.is_pass_through() && graph.traced(id).is_empty() {
                format!(
                    "{} '{}' is not connected to any other component.",
                    describe(node.category()),
                    node.name()
                )
            } else {
                continue;
            };
            self.report
                .warn(DiagnosticCode::DisconnectedComponent, vec![id], message);
        }
    }

    pub(super) fn check_unpowered_loads(&mut self) {
        let graph = self.graph;
        for load in graph.components().filter(|n| n.is_load()) {
            if self
                .state(load.component_id())
                .is_some_and(|s| s.status == NodeStatus::Fault)
            {
                self.report.warn(
                    DiagnosticCode::LoadUnpowered,
                    vec![load.component_id()],
                    format!(
                        "'{}' is switched on but has no power source.",
                        load.name()
                    ),
                );
            }
        }
    }

    pub(super) fn check_solar_chargers(&mut self) {
        let graph = self.graph;
        for solar in graph.components().filter(|n| n.is_solar()) {
            let id = solar.component_id();
            let power = self.state(id).map_or(0.0, |s| s.power);
            if power > 0.0 && !graph.traced(id).iter().any(|n| n.is_charger()) {
                self.report.warn(
                    DiagnosticCode::SolarWithoutCharger,
                    vec![id],
                    format!(
                        "'{}' produces {:.0} W but is not connected to a charger.",
                        solar.name(),
                        power
                    ),
                );
            }
        }
    }

    /// Alternators spinning with neither a battery nor a charger to feed.
    pub(super) fn check_alternators(&mut self) {
        if !self.environment.engine_running {
            return;
        }
        let graph = self.graph;
        for alternator in graph.components().filter(|n| n.is_alternator()) {
            let id = alternator.component_id();
            let spinning = self.state(id).is_some_and(|s| s.current > 0.0);
            let useful = graph
                .traced(id)
                .iter()
                .any(|n| n.is_battery() || n.is_charger());
            if spinning && !useful {
                self.report.warn(
                    DiagnosticCode::AlternatorUnused,
                    vec![id],
                    format!(
                        "'{}' is running but not connected to a battery or a charger.",
                        alternator.name()
                    ),
                );
            }
        }
    }

    pub(super) fn check_chargers(&mut self) {
        let graph = self.graph;
        for charger in graph.components().filter(|n| n.is_charger()) {
            let id = charger.component_id();
            let traced = graph.traced(id);
            let batteries = traced.iter().filter(|n| n.is_battery()).count();

            if batteries == 0 {
                self.report.error(
                    DiagnosticCode::ChargerWithoutBattery,
                    vec![id],
                    format!("'{}' is not connected to a battery.", charger.name()),
                );
            } else if batteries < 2 && !traced.iter().any(|n| n.is_solar() || n.is_alternator())
            {
                self.report.warn(
                    DiagnosticCode::ChargerWithoutInput,
                    vec![id],
                    format!("'{}' has nothing to charge from.", charger.name()),
                );
            }
        }
    }

    /// Batteries with nothing to power or charge them, and starter batteries
    /// that carry house loads.
    pub(super) fn check_battery_usage(&mut self) {
        let graph = self.graph;
        for battery in graph.components().filter(|n| n.is_battery()) {
            let id = battery.component_id();
            let traced = graph.traced(id);
            if traced.is_empty() {
                continue;
            }

            if !traced.iter().any(|n| n.is_load() || n.is_charger()) {
                self.report.warn(
                    DiagnosticCode::BatteryUnused,
                    vec![id],
                    format!(
                        "'{}' has no loads or chargers connected.",
                        battery.name()
                    ),
                );
            }

            if battery_role(battery) == Some(BatteryRole::Starter) {
                let loads = traced
                    .iter()
                    .filter(|n| n.is_load())
                    .map(|n| n.component_id())
                    .collect::<Vec<_>>();
                if !loads.is_empty() {
                    self.report.warn(
                        DiagnosticCode::StarterBatteryHouseLoads,
                        [vec![id], loads].concat(),
                        format!(
                            "Starter battery '{}' powers house loads, which can leave the \
                             engine unable to start.",
                            battery.name()
                        ),
                    );
                }
            }
        }
    }

    /// Loads reachable from a battery without a fuse or a breaker in between.
    pub(super) fn check_missing_fuses(&mut self) {
        let graph = self.graph;
        for battery in graph.components().filter(|n| n.is_battery()) {
            for load in graph
                .traced_unprotected(battery.component_id())
                .into_iter()
                .filter(|n| n.is_load())
            {
                self.report.error(
                    DiagnosticCode::MissingFuse,
                    vec![battery.component_id(), load.component_id()],
                    format!(
                        "No fuse or breaker between '{}' and '{}'.",
                        battery.name(),
                        load.name()
                    ),
                );
            }
        }
    }

    pub(super) fn check_ground_bus(&mut self) {
        let graph = self.graph;
        let loads = graph
            .components()
            .filter(|n| n.is_load())
            .map(|n| n.component_id())
            .collect::<Vec<_>>();
        if !loads.is_empty() && !graph.components().any(|n| n.is_ground()) {
            self.report.warn(
                DiagnosticCode::MissingGroundBus,
                loads,
                "There are loads, but no ground bus for their return current.",
            );
        }
    }

    /// Alternators charging lithium batteries without a DC-DC charger in
    /// between.
    pub(super) fn check_alternator_lithium(&mut self) {
        let graph = self.graph;
        for alternator in graph.components().filter(|n| n.is_alternator()) {
            for battery in graph
                .traced(alternator.component_id())
                .into_iter()
                .filter(|n| n.is_battery() && chemistry(*n).is_lithium())
            {
                self.report.error(
                    DiagnosticCode::AlternatorDirectToLithium,
                    vec![alternator.component_id(), battery.component_id()],
                    format!(
                        "'{}' is wired directly to lithium battery '{}', without a DC-DC \
                         charger.",
                        alternator.name(),
                        battery.name()
                    ),
                );
            }
        }
    }
}
