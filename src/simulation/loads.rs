// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The third stage of a tick: loads and pass-through components.

use std::collections::BTreeMap;

use crate::{
    component_category::CategoryPredicates, ComponentCategory, ComponentGraph, Edge, Node,
};

use super::accumulator::BatteryAccumulator;
use super::chargers::ChargerStage;
use super::sources::SourceStage;
use super::{parameter_or, NodeState, NodeStatus};

const DEFAULT_LOAD_CURRENT: f64 = 1.0;

pub(crate) struct LoadStage {
    pub states: BTreeMap<u64, NodeState>,
    pub accumulator: BatteryAccumulator,
    /// Power drawn by all active loads.
    pub load: f64,
}

impl LoadStage {
    pub(crate) fn resolve<N, E>(
        graph: &ComponentGraph<N, E>,
        sources: &SourceStage,
        chargers: &ChargerStage,
    ) -> Self
    where
        N: Node,
        E: Edge,
    {
        let voltage = sources.system_voltage;
        let mut stage = LoadStage {
            states: BTreeMap::new(),
            accumulator: BatteryAccumulator::default(),
            load: 0.0,
        };

        for load in graph.components().filter(|n| n.is_load()) {
            let params = load.parameters();
            if !params.is_on.unwrap_or(true) {
                stage
                    .states
                    .insert(load.component_id(), NodeState::at(0.0, NodeStatus::Off));
                continue;
            }

            let traced = graph.traced(load.component_id());
            if !traced.iter().any(|n| n.is_power_supply()) {
                tracing::debug!(
                    "Load {} ({}) is on, but has no power.",
                    load.component_id(),
                    load.name()
                );
                stage
                    .states
                    .insert(load.component_id(), NodeState::at(0.0, NodeStatus::Fault));
                continue;
            }

            let current = parameter_or(
                load,
                "current draw",
                params.current_draw,
                DEFAULT_LOAD_CURRENT,
            )
            .max(0.0);
            let power = current * voltage;
            if let Some(battery) = traced.iter().find(|n| n.is_battery()) {
                stage.accumulator.add_load(battery.component_id(), power);
            }
            stage.load += power;

            stage.states.insert(
                load.component_id(),
                NodeState {
                    voltage,
                    current,
                    power,
                    status: NodeStatus::On,
                    ..Default::default()
                },
            );
        }

        for node in graph.components().filter(|n| n.is_pass_through()) {
            let state = match node.category() {
                ComponentCategory::Protection => {
                    stage.protection_state(graph, node, chargers, voltage)
                }
                ComponentCategory::Switching if !node.parameters().is_on.unwrap_or(true) => {
                    NodeState::at(voltage, NodeStatus::Off)
                }
                _ => NodeState::at(voltage, NodeStatus::On),
            };
            stage.states.insert(node.component_id(), state);
        }

        stage
    }

    /// Returns the states of the stage, with everything that sits at system
    /// voltage restated at the final system voltage of the tick.
    ///
    /// Power stays as drawn during the tick, at the voltage the tick started
    /// from.
    pub(crate) fn settle(mut self, system_voltage: f64) -> BTreeMap<u64, NodeState> {
        for state in self.states.values_mut().filter(|s| s.voltage > 0.0) {
            state.voltage = system_voltage;
        }
        self.states
    }

    /// Resolves a fuse or a breaker.
    ///
    /// Load current and charge current flow through it in opposite
    /// directions, so the larger of the two is taken instead of their sum.
    fn protection_state<N, E>(
        &self,
        graph: &ComponentGraph<N, E>,
        protection: &N,
        chargers: &ChargerStage,
        voltage: f64,
    ) -> NodeState
    where
        N: Node,
        E: Edge,
    {
        let params = protection.parameters();
        if params.is_blown.unwrap_or(false) {
            return NodeState::at(0.0, NodeStatus::Off);
        }

        let mut load_current: f64 = 0.0;
        let mut charge_current: f64 = 0.0;
        for node in graph.traced(protection.component_id()) {
            let id = node.component_id();
            if node.is_load() {
                load_current += self
                    .states
                    .get(&id)
                    .filter(|s| s.status == NodeStatus::On)
                    .map_or(0.0, |s| s.current);
            } else if node.is_charger() {
                charge_current += chargers
                    .states
                    .get(&id)
                    .filter(|s| s.status == NodeStatus::Charging)
                    .map_or(0.0, |s| s.current);
            }
        }
        let current = load_current.max(charge_current);

        let rating = params.rated_current.unwrap_or(0.0);
        let status = if rating > 0.0 && current > rating {
            tracing::warn!(
                "{} {} ({}) carries {:.1} A, above its {:.1} A rating.",
                protection.component_type(),
                protection.component_id(),
                protection.name(),
                current,
                rating
            );
            NodeStatus::Fault
        } else {
            NodeStatus::On
        };

        NodeState {
            voltage,
            current,
            status,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::test_utils::ComponentGraphBuilder;
    use crate::{Component, ComponentSpec, ComponentType, Connection, Environment, Error};

    fn resolve(
        graph: &ComponentGraph<Component, Connection>,
        environment: &Environment,
    ) -> LoadStage {
        let sources = SourceStage::resolve(graph, environment, None);
        let chargers = ChargerStage::resolve(graph, environment, &sources);
        LoadStage::resolve(graph, &sources, &chargers)
    }

    #[test]
    fn test_loads() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let battery = builder.battery();
        let bus = builder.bus_bar();
        let pump = builder.bilge_pump();
        let radio = builder.add_with(
            ComponentType::Radio,
            "VHF",
            ComponentSpec {
                is_on: Some(false),
                ..Default::default()
            },
        );
        let orphan = builder.light();
        builder.chain(&[battery, bus, pump]).connect(bus, radio);
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &Environment::default());

        let state = &stage.states[&pump.component_id()];
        assert_eq!(state.status, NodeStatus::On);
        assert_abs_diff_eq!(state.current, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.power, 5.0 * 12.8, epsilon = 1e-9);

        assert_eq!(stage.states[&radio.component_id()].status, NodeStatus::Off);
        assert_eq!(stage.states[&orphan.component_id()].status, NodeStatus::Fault);
        assert_eq!(stage.states[&bus.component_id()].status, NodeStatus::On);
        assert_eq!(stage.states[&bus.component_id()].current, 0.0);

        assert_abs_diff_eq!(stage.load, 5.0 * 12.8, epsilon = 1e-9);
        assert_abs_diff_eq!(
            stage
                .accumulator
                .get(battery.component_id())
                .map_or(0.0, |p| p.load),
            5.0 * 12.8,
            epsilon = 1e-9
        );

        Ok(())
    }

    #[test]
    fn test_overloaded_fuse() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let battery = builder.battery();
        let fuse = builder.fuse(15.0);
        let load = builder.load(20.0);
        builder.chain(&[battery, fuse, load]);
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &Environment::default());
        let state = &stage.states[&fuse.component_id()];
        assert_eq!(state.status, NodeStatus::Fault);
        assert_abs_diff_eq!(state.current, 20.0, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn test_blown_fuse_and_open_switch() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let battery = builder.battery();
        let fuse = builder.add_with(
            ComponentType::Fuse,
            "Fuse",
            ComponentSpec {
                rated_current: Some(15.0),
                is_blown: Some(true),
                ..Default::default()
            },
        );
        let switch = builder.add_with(
            ComponentType::Switch,
            "Battery switch",
            ComponentSpec {
                is_on: Some(false),
                ..Default::default()
            },
        );
        let load = builder.load(20.0);
        builder.chain(&[battery, switch, fuse, load]);
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &Environment::default());
        assert_eq!(stage.states[&fuse.component_id()].status, NodeStatus::Off);
        assert_eq!(stage.states[&switch.component_id()].status, NodeStatus::Off);
        assert_eq!(stage.states[&load.component_id()].status, NodeStatus::On);

        Ok(())
    }

    #[test]
    fn test_fuse_takes_larger_of_load_and_charge_current() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let starter = builder.starter_battery();
        let charger = builder.dc_dc_charger();
        let fuse = builder.fuse(40.0);
        let house = builder.house_battery();
        let light = builder.light();
        builder
            .chain(&[starter, charger, fuse, house])
            .connect(fuse, light);
        let graph = builder.build(None)?;

        let environment = Environment {
            engine_running: true,
            ..Default::default()
        };
        let stage = resolve(&graph, &environment);
        let state = &stage.states[&fuse.component_id()];
        assert_eq!(state.status, NodeStatus::On);
        assert_abs_diff_eq!(state.current, 20.0, epsilon = 1e-9);

        let stage = resolve(&graph, &Environment::default());
        assert_abs_diff_eq!(
            stage.states[&fuse.component_id()].current,
            1.5,
            epsilon = 1e-9
        );

        Ok(())
    }
}
