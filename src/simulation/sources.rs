// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The first stage of a tick: raw output of batteries, solar, alternators and
//! shore power.
//!
//! Batteries only get a provisional entry here, carrying the previous tick's
//! state of charge, voltage and status.  They are finalized after every other
//! stage has credited its power to them.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    component_category::CategoryPredicates, ArrayConfiguration, ComponentGraph, ComponentType,
    Edge, Environment, Node, SimulationConfig,
};

use super::accumulator::BatteryAccumulator;
use super::batteries::capacity_ah;
use super::{parameter_or, NodeState, NodeStatus, SimulationResult};

/// Irradiance at which solar panels produce their nameplate power, in W/m².
const REFERENCE_IRRADIANCE: f64 = 1000.0;
const DEFAULT_PANEL_WATTAGE: f64 = 100.0;
const DEFAULT_PANEL_VMP: f64 = 18.0;
const DEFAULT_ALTERNATOR_CURRENT: f64 = 100.0;

pub(crate) struct SourceStage {
    pub states: BTreeMap<u64, NodeState>,
    /// Batteries that trace to at least one other component.
    pub connected_batteries: BTreeSet<u64>,
    pub accumulator: BatteryAccumulator,
    /// The battery with the highest capacity, or the first one added on a tie.
    pub primary_battery: Option<u64>,
    pub system_voltage: f64,
    /// Alternator power that reaches a battery.
    pub generation: f64,
}

impl SourceStage {
    pub(crate) fn resolve<N, E>(
        graph: &ComponentGraph<N, E>,
        environment: &Environment,
        previous: Option<&SimulationResult>,
    ) -> Self
    where
        N: Node,
        E: Edge,
    {
        let config = graph.config();
        let mut stage = SourceStage {
            states: BTreeMap::new(),
            connected_batteries: BTreeSet::new(),
            accumulator: BatteryAccumulator::default(),
            primary_battery: None,
            system_voltage: config.nominal_system_voltage,
            generation: 0.0,
        };

        // Alternators go first: a battery on a producing alternator sits at
        // the alternator's regulation voltage for this tick.
        let mut regulated = BTreeMap::<u64, f64>::new();
        for alternator in graph.components().filter(|n| n.is_alternator()) {
            let state = alternator_output(alternator, environment, config);
            let batteries = graph
                .traced(alternator.component_id())
                .into_iter()
                .filter(|n| n.is_battery())
                .map(|n| n.component_id())
                .collect::<Vec<_>>();

            if environment.engine_running && !batteries.is_empty() && state.power > 0.0 {
                let share = state.power / batteries.len() as f64;
                for battery_id in batteries {
                    stage.accumulator.add_generation(battery_id, share);
                    let voltage = regulated.entry(battery_id).or_insert(0.0);
                    *voltage = voltage.max(state.voltage);
                }
                stage.generation += state.power;
            }
            stage.states.insert(alternator.component_id(), state);
        }

        let mut primary: Option<(u64, f64)> = None;
        for battery in graph.components().filter(|n| n.is_battery()) {
            let id = battery.component_id();
            let last = previous.and_then(|p| p.node_state(id));

            let state_of_charge = last
                .and_then(|s| s.state_of_charge)
                .unwrap_or(config.default_state_of_charge)
                .clamp(0.0, 100.0);
            let mut voltage = last
                .map(|s| s.voltage)
                .filter(|v| *v > 0.0)
                .unwrap_or(config.default_battery_voltage);
            if let Some(regulated) = regulated.get(&id) {
                voltage = voltage.max(*regulated);
            }
            let status = last.map(|s| s.status).unwrap_or(NodeStatus::Idle);

            if !graph.traced(id).is_empty() {
                stage.connected_batteries.insert(id);
            }

            let capacity = capacity_ah(battery);
            if primary.map_or(true, |(_, largest)| capacity > largest) {
                primary = Some((id, capacity));
            }

            stage.states.insert(
                id,
                NodeState {
                    voltage,
                    status,
                    state_of_charge: Some(state_of_charge),
                    ..Default::default()
                },
            );
        }

        if let Some((id, _)) = primary {
            stage.primary_battery = Some(id);
            if let Some(state) = stage.states.get(&id) {
                stage.system_voltage = state.voltage;
            }
        }

        for solar in graph.components().filter(|n| n.is_solar()) {
            stage
                .states
                .insert(solar.component_id(), solar_output(solar, environment));
        }

        for shore in graph
            .components()
            .filter(|n| n.component_type() == ComponentType::ShorePower)
        {
            let state = if environment.shore_power {
                NodeState::at(stage.system_voltage, NodeStatus::On)
            } else {
                NodeState::at(0.0, NodeStatus::Off)
            };
            stage.states.insert(shore.component_id(), state);
        }

        tracing::debug!(
            "Sources: system voltage {:.2} V, alternator generation {:.1} W.",
            stage.system_voltage,
            stage.generation
        );

        stage
    }
}

/// Output of a solar panel or array, scaled by irradiance.
///
/// Array configuration decides how voltage and current split, total power is
/// the same either way.
fn solar_output<N: Node>(solar: &N, environment: &Environment) -> NodeState {
    let irradiance_factor = (environment.solar_irradiance / REFERENCE_IRRADIANCE).max(0.0);
    if irradiance_factor <= 0.0 {
        return NodeState::at(0.0, NodeStatus::Off);
    }

    let params = solar.parameters();
    let wattage = parameter_or(solar, "wattage", params.wattage, DEFAULT_PANEL_WATTAGE).max(0.0);
    let vmp = parameter_or(
        solar,
        "Vmp",
        params.vmp.filter(|v| *v > 0.0),
        DEFAULT_PANEL_VMP,
    );
    let imp = params.imp.filter(|i| *i > 0.0).unwrap_or(wattage / vmp);

    let (voltage, current, power) = if solar.component_type() == ComponentType::SolarArray {
        let panels = params.panel_count.unwrap_or(1).max(1) as f64;
        let power = wattage * panels * irradiance_factor;
        match params.configuration.unwrap_or_default() {
            ArrayConfiguration::Series => (vmp * panels, imp * irradiance_factor, power),
            ArrayConfiguration::Parallel => (vmp, imp * panels * irradiance_factor, power),
        }
    } else {
        let power = wattage * irradiance_factor;
        (vmp, power / vmp, power)
    };

    NodeState {
        voltage,
        current,
        power,
        status: NodeStatus::On,
        ..Default::default()
    }
}

/// Output of an alternator, ramping linearly from nothing at the cut-in speed
/// to its rated current at full output speed.
fn alternator_output<N: Node>(
    alternator: &N,
    environment: &Environment,
    config: &SimulationConfig,
) -> NodeState {
    let rpm = environment.alternator_rpm;
    if !environment.engine_running || rpm < config.alternator_cut_in_rpm {
        return NodeState::at(0.0, NodeStatus::Off);
    }

    let params = alternator.parameters();
    let rated = parameter_or(
        alternator,
        "rated current",
        params.rated_current,
        DEFAULT_ALTERNATOR_CURRENT,
    )
    .max(0.0);
    let span = config.alternator_full_output_rpm - config.alternator_cut_in_rpm;
    let ramp = if span > 0.0 {
        ((rpm - config.alternator_cut_in_rpm) / span).min(1.0)
    } else {
        1.0
    };

    let current = rated * ramp;
    if current <= 0.0 {
        return NodeState::at(0.0, NodeStatus::Off);
    }
    let voltage = params.voltage.unwrap_or(config.alternator_voltage);

    NodeState {
        voltage,
        current,
        power: voltage * current,
        status: NodeStatus::On,
        ..Default::default()
    }
}
