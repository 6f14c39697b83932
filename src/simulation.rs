// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Tick-by-tick simulation of a [`ComponentGraph`].
//!
//! A tick runs as a staged pipeline.  Each stage produces an immutable value
//! that the later stages read, which is what breaks the data cycle between
//! sources, chargers and batteries:
//!
//! ```text
//! SourceStage -> ChargerStage -> LoadStage -> BatteryStage -> Diagnostics
//! ```

mod accumulator;
mod batteries;
mod chargers;
mod diagnostics;
mod loads;
mod roles;
mod sources;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{component_category::CategoryPredicates, ChargeStage, ComponentGraph, Edge, Node};

use batteries::BatteryStage;
use chargers::ChargerStage;
use diagnostics::DiagnosticsEngine;
use loads::LoadStage;
use sources::SourceStage;

/// Conditions the boat is simulated in, supplied by the caller every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Solar irradiance, in W/m².  1000 W/m² is the rating reference.
    pub solar_irradiance: f64,
    /// Ambient temperature, in °C.
    pub ambient_temperature: f64,
    pub engine_running: bool,
    pub alternator_rpm: f64,
    pub shore_power: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            solar_irradiance: 0.0,
            ambient_temperature: 25.0,
            engine_running: false,
            alternator_rpm: 0.0,
            shore_power: false,
        }
    }
}

/// The status of a component in a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    On,
    #[default]
    Off,
    Charging,
    Discharging,
    Idle,
    /// The component itself is in trouble, e.g. an overloaded fuse or a load
    /// that is switched on without a power source.
    Fault,
}

/// Charger specific values of a tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargerState {
    pub input_voltage: f64,
    pub input_current: f64,
    pub output_voltage: f64,
    pub output_current: f64,
    /// Share of the output power drawn from solar.
    pub solar_input_power: f64,
    /// Share of the output power drawn from the alternator path.
    pub alternator_input_power: f64,
    /// Starter battery voltage the alternator path wakes up at.
    pub activation_voltage: f64,
    /// Shift applied to the bulk and float voltages, in volts.
    pub temperature_compensation: f64,
    pub bulk_voltage: f64,
    pub float_voltage: f64,
    pub source_battery: Option<u64>,
    pub target_battery: Option<u64>,
}

/// The computed state of a component in a tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub status: NodeStatus,
    /// State of charge in percent, for batteries.
    pub state_of_charge: Option<f64>,
    pub charge_stage: Option<ChargeStage>,
    pub charger: Option<ChargerState>,
}

impl NodeState {
    /// Returns a state at the given voltage with no current.
    pub(crate) fn at(voltage: f64, status: NodeStatus) -> Self {
        Self {
            voltage,
            status,
            ..Default::default()
        }
    }
}

/// The computed state of a wire in a tick.
///
/// Only the voltage is modeled: the network is assumed to sit at a single
/// system voltage, and current through individual wires is not resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeState {
    pub source: u64,
    pub destination: u64,
    pub voltage: f64,
}

/// Identifies the rule that produced a [`Diagnostic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    DisconnectedComponent,
    LoadUnpowered,
    SolarWithoutCharger,
    AlternatorUnused,
    ChargerWithoutBattery,
    ChargerWithoutInput,
    BatteryUnused,
    StarterBatteryHouseLoads,
    MissingFuse,
    FuseOverloaded,
    FuseUndersized,
    FuseNearRating,
    SolarVocExceedsCharger,
    SolarVocNearChargerLimit,
    DailyDemandExceedsCapacity,
    MissingGroundBus,
    ChargeRateExceedsChemistry,
    DischargeRateExceedsChemistry,
    ParallelVoltageMismatch,
    AlternatorDirectToLithium,
    BusBarOverloaded,
    LowStateOfCharge,
    CriticalStateOfCharge,
}

/// A warning or an error about the simulated network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// The components the diagnostic is about.
    pub component_ids: Vec<u64>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(
        code: DiagnosticCode,
        component_ids: Vec<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            component_ids,
            message: message.into(),
        }
    }
}

/// Warnings and errors collected during a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Report {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl Report {
    pub(crate) fn warn(
        &mut self,
        code: DiagnosticCode,
        component_ids: Vec<u64>,
        message: impl Into<String>,
    ) {
        self.warnings
            .push(Diagnostic::new(code, component_ids, message));
    }

    pub(crate) fn error(
        &mut self,
        code: DiagnosticCode,
        component_ids: Vec<u64>,
        message: impl Into<String>,
    ) {
        self.errors.push(Diagnostic::new(code, component_ids, message));
    }

    fn extend(&mut self, other: Report) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

/// The result of simulating one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Voltage of the primary battery.
    pub system_voltage: f64,
    pub total_generation: f64,
    pub total_load: f64,
    pub net_power: f64,
    pub node_states: BTreeMap<u64, NodeState>,
    pub edge_states: Vec<EdgeState>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl SimulationResult {
    /// Returns the state of the component with the given id, if it was
    /// simulated.
    pub fn node_state(&self, component_id: u64) -> Option<&NodeState> {
        self.node_states.get(&component_id)
    }

    /// Returns the state of charge of the battery with the given id.
    pub fn state_of_charge(&self, component_id: u64) -> Option<f64> {
        self.node_state(component_id)
            .and_then(|state| state.state_of_charge)
    }
}

/// Returns the value of a numeric parameter, or `default` when neither the
/// overrides nor the spec of the component have one.
pub(crate) fn parameter_or<N: Node>(
    node: &N,
    parameter: &str,
    value: Option<f64>,
    default: f64,
) -> f64 {
    value.unwrap_or_else(|| {
        tracing::warn!(
            "{} {} ({}) has no {}, using {}.",
            node.component_type(),
            node.component_id(),
            node.name(),
            parameter,
            default
        );
        default
    })
}

/// Simulation.
impl<N, E> ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    /// Simulates one tick of `elapsed_seconds` simulated seconds.
    ///
    /// The state of charge, voltage and charge/discharge status of every
    /// battery are carried over from `previous`; everything else is computed
    /// from scratch.  Running the same tick twice with the same inputs
    /// produces the same result.
    pub fn simulate(
        &self,
        environment: &Environment,
        previous: Option<&SimulationResult>,
        elapsed_seconds: f64,
    ) -> SimulationResult {
        let elapsed_seconds = if elapsed_seconds.is_finite() && elapsed_seconds >= 0.0 {
            elapsed_seconds
        } else {
            tracing::warn!(
                "Invalid elapsed time {} s, simulating a zero-length tick.",
                elapsed_seconds
            );
            0.0
        };

        let sources = SourceStage::resolve(self, environment, previous);
        let chargers = ChargerStage::resolve(self, environment, &sources);
        let loads = LoadStage::resolve(self, &sources, &chargers);
        let batteries = BatteryStage::finalize(self, elapsed_seconds, &sources, &chargers, &loads);

        let system_voltage = batteries.system_voltage;
        let total_generation = sources.generation + chargers.generation;
        let total_load = loads.load;

        let mut node_states = sources.states;
        node_states.extend(chargers.states);
        node_states.extend(loads.settle(system_voltage));
        node_states.extend(batteries.states);

        let edge_states = self.edge_states(system_voltage);

        let mut report = batteries.report;
        report.extend(DiagnosticsEngine::new(self, environment, &node_states).evaluate());

        tracing::debug!(
            "Tick of {} s: system voltage {:.2} V, generation {:.1} W, load {:.1} W, \
             {} warnings, {} errors.",
            elapsed_seconds,
            system_voltage,
            total_generation,
            total_load,
            report.warnings.len(),
            report.errors.len()
        );

        SimulationResult {
            system_voltage,
            total_generation,
            total_load,
            net_power: total_generation - total_load,
            node_states,
            edge_states,
            warnings: report.warnings,
            errors: report.errors,
        }
    }

    /// A wire is live when either end is, or traces to, a power supply.
    fn edge_states(&self, system_voltage: f64) -> Vec<EdgeState> {
        let mut powered = BTreeMap::new();
        let mut is_powered = |component_id: u64| -> bool {
            *powered.entry(component_id).or_insert_with(|| {
                self.component(component_id)
                    .is_ok_and(|n| n.is_power_supply())
                    || self.traced(component_id).iter().any(|n| n.is_power_supply())
            })
        };

        self.connections()
            .map(|connection| {
                let live = is_powered(connection.source()) || is_powered(connection.destination());
                EdgeState {
                    source: connection.source(),
                    destination: connection.destination(),
                    voltage: if live { system_voltage } else { 0.0 },
                }
            })
            .collect()
    }
}
