// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The fourth stage of a tick: batteries.
//!
//! Every earlier stage has credited its power to the batteries by now.  The
//! sums are turned into a net current, the state of charge is coulomb
//! counted over the tick, and the voltage is read off the chemistry's
//! resting curve.

use std::collections::BTreeMap;

use crate::{
    component_category::CategoryPredicates, BatteryChemistry, ComponentGraph, Edge, Node,
    SimulationConfig,
};

use super::accumulator::BatteryAccumulator;
use super::chargers::ChargerStage;
use super::loads::LoadStage;
use super::sources::SourceStage;
use super::{parameter_or, DiagnosticCode, NodeState, NodeStatus, Report};

const DEFAULT_CAPACITY_AH: f64 = 100.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Returns the rated capacity of a battery, in amp hours.
pub(crate) fn capacity_ah<N: Node>(battery: &N) -> f64 {
    parameter_or(
        battery,
        "capacity",
        battery.parameters().capacity_ah.filter(|c| *c >= 0.0),
        DEFAULT_CAPACITY_AH,
    )
}

pub(crate) fn chemistry<N: Node>(battery: &N) -> BatteryChemistry {
    battery.parameters().chemistry.unwrap_or_default()
}

/// Returns the status of a battery with the given net current, given its
/// status in the previous tick.
///
/// Leaving `Idle` takes a larger current than staying in `Charging` or
/// `Discharging`, so that noise around zero doesn't toggle the status every
/// tick.
pub(crate) fn next_status(
    previous: NodeStatus,
    net_current: f64,
    config: &SimulationConfig,
) -> NodeStatus {
    let enter = config.hysteresis_enter_current;
    let exit = config.hysteresis_exit_current;

    match previous {
        NodeStatus::Charging if net_current >= exit => NodeStatus::Charging,
        NodeStatus::Charging if net_current < -exit => NodeStatus::Discharging,
        NodeStatus::Charging => NodeStatus::Idle,
        NodeStatus::Discharging if net_current <= -exit => NodeStatus::Discharging,
        NodeStatus::Discharging if net_current > exit => NodeStatus::Charging,
        NodeStatus::Discharging => NodeStatus::Idle,
        _ if net_current > enter => NodeStatus::Charging,
        _ if net_current < -enter => NodeStatus::Discharging,
        _ => NodeStatus::Idle,
    }
}

pub(crate) struct BatteryStage {
    pub states: BTreeMap<u64, NodeState>,
    /// Final voltage of the primary battery.
    pub system_voltage: f64,
    pub report: Report,
}

impl BatteryStage {
    pub(crate) fn finalize<N, E>(
        graph: &ComponentGraph<N, E>,
        elapsed_seconds: f64,
        sources: &SourceStage,
        chargers: &ChargerStage,
        loads: &LoadStage,
    ) -> Self
    where
        N: Node,
        E: Edge,
    {
        let config = graph.config();
        let accumulator = BatteryAccumulator::merged([
            &sources.accumulator,
            &chargers.accumulator,
            &loads.accumulator,
        ]);
        let mut stage = BatteryStage {
            states: BTreeMap::new(),
            system_voltage: config.nominal_system_voltage,
            report: Report::default(),
        };

        for battery in graph.components().filter(|n| n.is_battery()) {
            let id = battery.component_id();
            let provisional = sources.states.get(&id);
            let state_of_charge = provisional
                .and_then(|s| s.state_of_charge)
                .unwrap_or(config.default_state_of_charge);
            let last_status = provisional.map_or(NodeStatus::Idle, |s| s.status);

            let net_power = accumulator.get(id).map_or(0.0, |p| p.net());
            let net_current =
                if sources.connected_batteries.contains(&id) && sources.system_voltage > 0.0 {
                    net_power / sources.system_voltage
                } else {
                    0.0
                };

            let capacity = capacity_ah(battery);
            let delta = if capacity > 0.0 {
                net_current * elapsed_seconds / SECONDS_PER_HOUR / capacity * 100.0
            } else {
                0.0
            };
            let state_of_charge = (state_of_charge + delta).clamp(0.0, 100.0);
            let voltage = chemistry(battery)
                .profile()
                .resting_voltage(state_of_charge);

            if state_of_charge < config.critical_state_of_charge {
                stage.report.error(
                    DiagnosticCode::CriticalStateOfCharge,
                    vec![id],
                    format!(
                        "{} is critically discharged at {:.1}% state of charge.",
                        battery.name(),
                        state_of_charge
                    ),
                );
            } else if state_of_charge < config.low_state_of_charge {
                stage.report.warn(
                    DiagnosticCode::LowStateOfCharge,
                    vec![id],
                    format!(
                        "{} is low at {:.1}% state of charge.",
                        battery.name(),
                        state_of_charge
                    ),
                );
            }

            stage.states.insert(
                id,
                NodeState {
                    voltage,
                    current: net_current,
                    power: net_power,
                    status: next_status(last_status, net_current, config),
                    state_of_charge: Some(state_of_charge),
                    charge_stage: None,
                    charger: None,
                },
            );
        }

        if let Some(state) = sources
            .primary_battery
            .and_then(|id| stage.states.get(&id))
        {
            stage.system_voltage = state.voltage;
        }

        stage
    }
}
