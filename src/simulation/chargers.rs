// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The second stage of a tick: DC-DC chargers, with and without MPPT.
//!
//! Chargers read the raw source output and the provisional battery entries
//! of the [`SourceStage`], and credit what they deliver to the battery they
//! charge.

use std::collections::BTreeMap;

use crate::{
    component_category::CategoryPredicates, ChargeStage, ComponentGraph, Edge, Environment, Node,
};

use super::accumulator::BatteryAccumulator;
use super::batteries::{capacity_ah, chemistry};
use super::roles::{resolve_battery_roles, BatteryCandidate, BatteryRoles};
use super::sources::SourceStage;
use super::{parameter_or, ChargerState, NodeState, NodeStatus};

const DEFAULT_MPPT_CHARGE_CURRENT: f64 = 50.0;
const DEFAULT_DC_DC_CHARGE_CURRENT: f64 = 20.0;

pub(crate) struct ChargerStage {
    pub states: BTreeMap<u64, NodeState>,
    pub accumulator: BatteryAccumulator,
    /// Power delivered by all chargers.
    pub generation: f64,
}

impl ChargerStage {
    pub(crate) fn resolve<N, E>(
        graph: &ComponentGraph<N, E>,
        environment: &Environment,
        sources: &SourceStage,
    ) -> Self
    where
        N: Node,
        E: Edge,
    {
        let mut stage = ChargerStage {
            states: BTreeMap::new(),
            accumulator: BatteryAccumulator::default(),
            generation: 0.0,
        };

        for charger in graph.components().filter(|n| n.is_charger()) {
            let inputs = ChargerInputs::collect(graph, charger, environment, sources);
            let state = if charger.is_mppt_charger() {
                mppt_output(graph, charger, environment, sources, &inputs)
            } else {
                dc_dc_output(graph, charger, environment, sources, &inputs)
            };

            if let Some(target) = inputs.roles.target {
                if state.power > 0.0 {
                    stage.accumulator.add_generation(target, state.power);
                    stage.generation += state.power;
                }
            }

            tracing::debug!(
                "Charger {} ({}): {:?} at {:.2} A.",
                charger.component_id(),
                charger.name(),
                state.status,
                state.current
            );
            stage.states.insert(charger.component_id(), state);
        }

        stage
    }
}

/// What a charger sees around it.
struct ChargerInputs {
    /// Highest voltage among the producing solar inputs.
    solar_voltage: f64,
    solar_power: f64,
    /// Highest voltage among the producing alternators, with the engine running.
    alternator_voltage: Option<f64>,
    roles: BatteryRoles,
}

impl ChargerInputs {
    fn collect<N, E>(
        graph: &ComponentGraph<N, E>,
        charger: &N,
        environment: &Environment,
        sources: &SourceStage,
    ) -> Self
    where
        N: Node,
        E: Edge,
    {
        let mut inputs = ChargerInputs {
            solar_voltage: 0.0,
            solar_power: 0.0,
            alternator_voltage: None,
            roles: BatteryRoles::default(),
        };
        let mut candidates = vec![];

        for node in graph.traced(charger.component_id()) {
            let state = sources.states.get(&node.component_id());
            if node.is_solar() {
                if let Some(state) = state.filter(|s| s.status == NodeStatus::On) {
                    inputs.solar_voltage = inputs.solar_voltage.max(state.voltage);
                    inputs.solar_power += state.power;
                }
            } else if node.is_alternator() {
                if let Some(state) = state.filter(|s| s.current > 0.0) {
                    if environment.engine_running {
                        let voltage = inputs.alternator_voltage.unwrap_or(0.0);
                        inputs.alternator_voltage = Some(voltage.max(state.voltage));
                    }
                }
            } else if node.is_battery() {
                candidates.push(BatteryCandidate::from_node(node));
            }
        }

        inputs.roles = resolve_battery_roles(&candidates);
        inputs
    }
}

/// Resolves a DC-DC charger with an MPPT solar input.
///
/// Solar power is converted independently.  The alternator path only wakes
/// up once the voltage on it, which is the source battery's voltage when
/// there is one, exceeds the activation voltage.  The combined current is
/// then limited by the charger's rating, the target chemistry's safe charge
/// rate and the charger's power rating, and finally scaled by the target's
/// charge stage.
fn mppt_output<N, E>(
    graph: &ComponentGraph<N, E>,
    charger: &N,
    environment: &Environment,
    sources: &SourceStage,
    inputs: &ChargerInputs,
) -> NodeState
where
    N: Node,
    E: Edge,
{
    let config = graph.config();
    let params = charger.parameters();

    let idle = |charger_state: ChargerState| NodeState {
        status: NodeStatus::Idle,
        charge_stage: Some(ChargeStage::Idle),
        charger: Some(charger_state),
        ..Default::default()
    };

    let path_voltage = inputs
        .roles
        .source
        .and_then(|id| sources.states.get(&id))
        .map(|s| s.voltage)
        .or(inputs.alternator_voltage)
        .unwrap_or(0.0);

    let mut charger_state = ChargerState {
        activation_voltage: config.charger_activation_voltage,
        source_battery: inputs.roles.source,
        target_battery: inputs.roles.target,
        ..Default::default()
    };

    let Some(target) = inputs
        .roles
        .target
        .and_then(|id| graph.component(id).ok())
    else {
        return idle(charger_state);
    };

    let profile = chemistry(target).profile();
    let target_state = sources.states.get(&target.component_id());
    let target_voltage = target_state
        .map(|s| s.voltage)
        .filter(|v| *v > 0.0)
        .unwrap_or(config.default_battery_voltage);
    let state_of_charge = target_state
        .and_then(|s| s.state_of_charge)
        .unwrap_or(config.default_state_of_charge);

    let compensation = profile.temperature_compensation(environment.ambient_temperature);
    charger_state.temperature_compensation = compensation;
    charger_state.bulk_voltage = profile.bulk_voltage + compensation;
    charger_state.float_voltage = profile.float_voltage + compensation;
    charger_state.output_voltage = target_voltage;

    if let Some(max_input_voltage) = params.max_input_voltage {
        if path_voltage > max_input_voltage {
            tracing::warn!(
                "Charger {} ({}): input of {:.2} V exceeds its {:.2} V maximum.",
                charger.component_id(),
                charger.name(),
                path_voltage,
                max_input_voltage
            );
            charger_state.input_voltage = path_voltage;
            return NodeState {
                voltage: target_voltage,
                status: NodeStatus::Fault,
                charge_stage: Some(ChargeStage::OvervoltageProtection),
                charger: Some(charger_state),
                ..Default::default()
            };
        }
    }

    let alternator_active = path_voltage > config.charger_activation_voltage;
    let alternator_current = if alternator_active {
        ((path_voltage - target_voltage) * config.alternator_current_gain).max(0.0)
    } else {
        0.0
    };
    let solar_current = inputs.solar_power / target_voltage;

    if alternator_current <= 0.0 && solar_current <= 0.0 {
        charger_state.input_voltage = path_voltage.max(inputs.solar_voltage);
        return NodeState {
            voltage: target_voltage,
            ..idle(charger_state)
        };
    }

    let rated_current = parameter_or(
        charger,
        "charge current",
        params.charge_current,
        DEFAULT_MPPT_CHARGE_CURRENT,
    )
    .max(0.0);
    let chemistry_limit = capacity_ah(target) * profile.max_charge_c_rate;
    let power_limit = params
        .max_output_power
        .map_or(f64::INFINITY, |p| p / target_voltage);

    let (charge_stage, factor) = profile.charge_stage(state_of_charge);
    let current = ((solar_current + alternator_current)
        .min(rated_current)
        .min(chemistry_limit)
        .min(power_limit)
        * factor)
        .max(0.0);
    let status = if current > 0.0 {
        NodeStatus::Charging
    } else {
        NodeStatus::Idle
    };

    let power = current * target_voltage;
    // Solar first, the alternator path covers the rest.
    let solar_input_power = power.min(inputs.solar_power);
    let alternator_input_power = power - solar_input_power;

    charger_state.solar_input_power = solar_input_power;
    charger_state.alternator_input_power = alternator_input_power;
    charger_state.input_voltage = if alternator_active {
        path_voltage
    } else {
        inputs.solar_voltage
    };
    charger_state.input_current = [
        (solar_input_power, inputs.solar_voltage),
        (alternator_input_power, path_voltage),
    ]
    .iter()
    .filter(|(_, voltage)| *voltage > 0.0)
    .map(|(power, voltage)| power / voltage)
    .sum();
    charger_state.output_current = current;

    NodeState {
        voltage: target_voltage,
        current,
        power,
        status,
        state_of_charge: None,
        charge_stage: Some(charge_stage),
        charger: Some(charger_state),
    }
}

/// Resolves a plain DC-DC charger, which delivers its rated current at system
/// voltage whenever the engine runs and there is a battery to charge, scaled
/// by the charge stage of that battery.
fn dc_dc_output<N, E>(
    graph: &ComponentGraph<N, E>,
    charger: &N,
    environment: &Environment,
    sources: &SourceStage,
    inputs: &ChargerInputs,
) -> NodeState
where
    N: Node,
    E: Edge,
{
    let voltage = sources.system_voltage;
    let input_voltage = inputs
        .roles
        .source
        .and_then(|id| sources.states.get(&id))
        .map_or(voltage, |s| s.voltage);

    let charger_state = ChargerState {
        input_voltage,
        output_voltage: voltage,
        source_battery: inputs.roles.source,
        target_battery: inputs.roles.target,
        ..Default::default()
    };

    let target = inputs
        .roles
        .target
        .and_then(|id| graph.component(id).ok());
    let Some(target) = target.filter(|_| environment.engine_running) else {
        return NodeState {
            status: NodeStatus::Idle,
            charge_stage: Some(ChargeStage::Idle),
            charger: Some(charger_state),
            ..Default::default()
        };
    };

    let state_of_charge = sources
        .states
        .get(&target.component_id())
        .and_then(|s| s.state_of_charge)
        .unwrap_or(graph.config().default_state_of_charge);
    let (charge_stage, factor) = chemistry(target).profile().charge_stage(state_of_charge);

    let current = (parameter_or(
        charger,
        "charge current",
        charger.parameters().charge_current,
        DEFAULT_DC_DC_CHARGE_CURRENT,
    ) * factor)
        .max(0.0);
    let power = current * voltage;
    let status = if current > 0.0 {
        NodeStatus::Charging
    } else {
        NodeStatus::Idle
    };

    NodeState {
        voltage,
        current,
        power,
        status,
        state_of_charge: None,
        charge_stage: Some(charge_stage),
        charger: Some(ChargerState {
            input_current: if input_voltage > 0.0 {
                power / input_voltage
            } else {
                0.0
            },
            alternator_input_power: power,
            output_current: current,
            ..charger_state
        }),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::graph::test_utils::{ComponentGraphBuilder, ComponentHandle};
    use crate::{
        BatteryChemistry, Component, ComponentSpec, ComponentType, Connection, Error,
        SimulationConfig, SimulationResult,
    };

    fn previous(states: &[(ComponentHandle, f64)]) -> SimulationResult {
        let mut result = SimulationResult::default();
        for (handle, soc) in states {
            result.node_states.insert(
                handle.component_id(),
                NodeState {
                    state_of_charge: Some(*soc),
                    ..Default::default()
                },
            );
        }
        result
    }

    fn resolve(
        graph: &ComponentGraph<Component, Connection>,
        environment: &Environment,
        previous: Option<&SimulationResult>,
    ) -> ChargerStage {
        let sources = SourceStage::resolve(graph, environment, previous);
        ChargerStage::resolve(graph, environment, &sources)
    }

    fn running() -> Environment {
        Environment {
            engine_running: true,
            alternator_rpm: 2000.0,
            ..Default::default()
        }
    }

    /// Alternator -> starter battery -> MPPT charger -> house battery.
    fn alternator_path(
        charger_overrides: ComponentSpec,
    ) -> (ComponentGraphBuilder, ComponentHandle, ComponentHandle, ComponentHandle) {
        let mut builder = ComponentGraphBuilder::new();
        let alternator = builder.alternator();
        let starter = builder.starter_battery();
        let charger =
            builder.add_with(ComponentType::DcDcMpptCharger, "DC-DC MPPT", charger_overrides);
        let house = builder.house_battery();
        builder.chain(&[alternator, starter, charger, house]);
        (builder, starter, charger, house)
    }

    #[test]
    fn test_alternator_path() -> Result<(), Error> {
        let (builder, starter, charger, house) = alternator_path(ComponentSpec::default());
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &running(), None);
        let state = &stage.states[&charger.component_id()];
        let charger_state = state.charger.clone().unwrap_or_default();

        // (14.4 V - 12.8 V) * 5
        assert_abs_diff_eq!(state.current, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.power, 8.0 * 12.8, epsilon = 1e-9);
        assert_eq!(state.status, NodeStatus::Charging);
        assert_eq!(state.charge_stage, Some(ChargeStage::ConstantCurrent));
        assert_eq!(charger_state.source_battery, Some(starter.component_id()));
        assert_eq!(charger_state.target_battery, Some(house.component_id()));
        assert_abs_diff_eq!(charger_state.input_voltage, 14.4, epsilon = 1e-9);
        assert_abs_diff_eq!(
            charger_state.alternator_input_power,
            state.power,
            epsilon = 1e-9
        );

        assert_abs_diff_eq!(stage.generation, state.power, epsilon = 1e-9);
        assert_abs_diff_eq!(
            stage
                .accumulator
                .get(house.component_id())
                .map_or(0.0, |p| p.generation),
            state.power,
            epsilon = 1e-9
        );
        assert_eq!(stage.accumulator.get(starter.component_id()), None);

        // With the engine off the starter battery rests below the activation
        // voltage.
        let stage = resolve(&graph, &Environment::default(), None);
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.current, 0.0);
        assert_eq!(state.status, NodeStatus::Idle);
        assert_eq!(state.charge_stage, Some(ChargeStage::Idle));
        assert_eq!(stage.generation, 0.0);

        Ok(())
    }

    #[test]
    fn test_overvoltage_protection() -> Result<(), Error> {
        let (builder, _, charger, house) = alternator_path(ComponentSpec {
            max_input_voltage: Some(14.0),
            ..Default::default()
        });
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &running(), None);
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.status, NodeStatus::Fault);
        assert_eq!(
            state.charge_stage,
            Some(ChargeStage::OvervoltageProtection)
        );
        assert_eq!(state.current, 0.0);
        assert_eq!(stage.generation, 0.0);
        assert_eq!(stage.accumulator.get(house.component_id()), None);

        Ok(())
    }

    #[test]
    fn test_full_lithium_battery_stops_charging() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let solar = builder.solar_panel();
        let charger = builder.mppt_charger();
        let house = builder.house_battery();
        builder.chain(&[solar, charger, house]);
        let graph = builder.build(None)?;

        let environment = Environment {
            solar_irradiance: 1000.0,
            ..Default::default()
        };
        let stage = resolve(&graph, &environment, Some(&previous(&[(house, 100.0)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.current, 0.0);
        assert_eq!(state.charge_stage, Some(ChargeStage::FullStopped));
        assert_eq!(state.status, NodeStatus::Idle);
        assert_eq!(stage.generation, 0.0);

        // Constant voltage tapers off towards full.
        let stage = resolve(&graph, &environment, Some(&previous(&[(house, 97.5)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.charge_stage, Some(ChargeStage::ConstantVoltage));
        assert_abs_diff_eq!(state.current, 100.0 / 12.8 * 0.5, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn test_lead_acid_stages_and_limits() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let solar = builder.add_with(
            ComponentType::SolarPanel,
            "Big panel",
            ComponentSpec {
                wattage: Some(400.0),
                ..Default::default()
            },
        );
        let charger = builder.mppt_charger();
        let battery = builder.add_with(
            ComponentType::Battery,
            "House",
            ComponentSpec {
                capacity_ah: Some(100.0),
                chemistry: Some(BatteryChemistry::Agm),
                ..Default::default()
            },
        );
        builder.chain(&[solar, charger, battery]);
        let graph = builder.build(None)?;

        let environment = Environment {
            solar_irradiance: 1000.0,
            ..Default::default()
        };

        // 400 W / 12.8 V is limited by 0.3C of 100 Ah.
        let stage = resolve(&graph, &environment, Some(&previous(&[(battery, 50.0)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.charge_stage, Some(ChargeStage::Bulk));
        assert_abs_diff_eq!(state.current, 30.0, epsilon = 1e-9);
        let charger_state = state.charger.clone().unwrap_or_default();
        assert_abs_diff_eq!(charger_state.solar_input_power, 30.0 * 12.8, epsilon = 1e-9);
        assert_eq!(charger_state.alternator_input_power, 0.0);
        assert_abs_diff_eq!(
            charger_state.input_current,
            30.0 * 12.8 / 18.0,
            epsilon = 1e-9
        );

        let stage = resolve(&graph, &environment, Some(&previous(&[(battery, 90.0)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.charge_stage, Some(ChargeStage::Absorption));
        assert_abs_diff_eq!(state.current, 30.0 * 0.8, epsilon = 1e-9);

        let stage = resolve(&graph, &environment, Some(&previous(&[(battery, 98.0)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.charge_stage, Some(ChargeStage::Float));
        assert_abs_diff_eq!(state.current, 3.0, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn test_temperature_compensation() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let solar = builder.solar_panel();
        let charger = builder.mppt_charger();
        let battery = builder.battery();
        builder.chain(&[solar, charger, battery]);
        let graph = builder.build(None)?;

        let environment = Environment {
            solar_irradiance: 500.0,
            ambient_temperature: 35.0,
            ..Default::default()
        };
        let stage = resolve(&graph, &environment, None);
        let charger_state = stage.states[&charger.component_id()]
            .charger
            .clone()
            .unwrap_or_default();

        // AGM: -4 mV per cell per °C, 6 cells, 10 °C above reference.
        assert_abs_diff_eq!(charger_state.temperature_compensation, -0.24, epsilon = 1e-9);
        assert_abs_diff_eq!(charger_state.bulk_voltage, 14.16, epsilon = 1e-9);
        assert_abs_diff_eq!(charger_state.float_voltage, 13.36, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn test_roles_are_stable_across_ticks() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let first = builder.add_component(ComponentType::Battery, "Battery A");
        let charger = builder.mppt_charger();
        let second = builder.add_component(ComponentType::Battery, "Battery B");
        builder.connect(second, charger).connect(charger, first);
        let graph = builder.build(None)?;

        let environment = Environment::default();
        let mut last = None;
        for _ in 0..5 {
            let result = graph.simulate(&environment, last.as_ref(), 60.0);
            let charger_state = result
                .node_state(charger.component_id())
                .and_then(|s| s.charger.clone())
                .unwrap_or_default();
            assert_eq!(charger_state.source_battery, Some(first.component_id()));
            assert_eq!(charger_state.target_battery, Some(second.component_id()));
            last = Some(result);
        }

        Ok(())
    }

    #[test]
    fn test_charger_without_battery() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let solar = builder.solar_panel();
        let charger = builder.mppt_charger();
        builder.connect(solar, charger);
        let graph = builder.build(Some(SimulationConfig::default()))?;

        let environment = Environment {
            solar_irradiance: 1000.0,
            ..Default::default()
        };
        let stage = resolve(&graph, &environment, None);
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.status, NodeStatus::Idle);
        assert_eq!(state.current, 0.0);
        assert_eq!(stage.generation, 0.0);

        Ok(())
    }

    #[test]
    fn test_plain_dc_dc_charger() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let starter = builder.starter_battery();
        let charger = builder.dc_dc_charger();
        let house = builder.house_battery();
        builder.chain(&[starter, charger, house]);
        let graph = builder.build(None)?;

        let stage = resolve(&graph, &running(), None);
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.status, NodeStatus::Charging);
        assert_eq!(state.charge_stage, Some(ChargeStage::ConstantCurrent));
        assert_abs_diff_eq!(state.current, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.power, 20.0 * 12.8, epsilon = 1e-9);
        assert_eq!(
            state.charger.as_ref().and_then(|c| c.target_battery),
            Some(house.component_id())
        );
        assert!(stage.accumulator.get(house.component_id()).is_some());

        let stage = resolve(&graph, &Environment::default(), None);
        assert_eq!(stage.states[&charger.component_id()].status, NodeStatus::Idle);
        assert_eq!(stage.generation, 0.0);

        Ok(())
    }

    #[test]
    fn test_plain_dc_dc_charger_follows_charge_stage() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let starter = builder.starter_battery();
        let charger = builder.dc_dc_charger();
        let house = builder.house_battery();
        builder.chain(&[starter, charger, house]);
        let graph = builder.build(None)?;

        // A full LiFePO4 bank takes nothing, even with the engine running.
        let stage = resolve(&graph, &running(), Some(&previous(&[(house, 100.0)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.current, 0.0);
        assert_eq!(state.power, 0.0);
        assert_eq!(state.charge_stage, Some(ChargeStage::FullStopped));
        assert_eq!(state.status, NodeStatus::Idle);
        assert_eq!(stage.generation, 0.0);
        assert_eq!(stage.accumulator.get(house.component_id()), None);

        let stage = resolve(&graph, &running(), Some(&previous(&[(house, 97.5)])));
        let state = &stage.states[&charger.component_id()];
        assert_eq!(state.charge_stage, Some(ChargeStage::ConstantVoltage));
        assert_abs_diff_eq!(state.current, 10.0, epsilon = 1e-9);

        Ok(())
    }
}
