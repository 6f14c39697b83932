// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Component parameters, and the concrete `Component` and `Connection` types
//! for callers that don't bring their own `Node` and `Edge` implementations.

use serde::{Deserialize, Serialize};

use crate::{BatteryChemistry, ComponentType, Edge, Node};

/// The role a battery plays on board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatteryRole {
    /// Cranks the engine and feeds a DC-DC charger while the engine runs.
    Starter,
    /// Powers the house loads.
    House,
}

/// How the panels of a solar array are wired together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayConfiguration {
    /// Panel voltages add up, current stays that of a single panel.
    #[default]
    Series,
    /// Panel currents add up, voltage stays that of a single panel.
    Parallel,
}

/// Parameters of a component.
///
/// The same type holds both the static spec of a component and the values a
/// user entered for it.  Every field is optional: unset overrides fall back to
/// the spec, and unset spec values fall back to numeric defaults of the
/// simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentSpec {
    /// Nominal voltage, in volts.
    pub voltage: Option<f64>,
    /// Battery capacity, in amp-hours.
    pub capacity_ah: Option<f64>,
    pub chemistry: Option<BatteryChemistry>,
    /// Explicit battery role, takes precedence over label heuristics.
    pub role: Option<BatteryRole>,
    /// Solar nameplate power per panel, in watts.
    pub wattage: Option<f64>,
    /// Solar voltage at maximum power, per panel.
    pub vmp: Option<f64>,
    /// Solar open-circuit voltage, per panel.
    pub voc: Option<f64>,
    /// Solar current at maximum power, per panel.
    pub imp: Option<f64>,
    pub panel_count: Option<u32>,
    pub configuration: Option<ArrayConfiguration>,
    /// Alternator output, fuse, breaker or bus bar rating, in amps.
    pub rated_current: Option<f64>,
    /// Maximum charge current of a charger, in amps.
    pub charge_current: Option<f64>,
    pub max_input_voltage: Option<f64>,
    pub max_output_power: Option<f64>,
    /// Current drawn by a load while on, in amps.
    pub current_draw: Option<f64>,
    /// Expected daily run time of a load, in hours.
    pub hours_per_day: Option<f64>,
    /// User toggle of a load or a switch.
    pub is_on: Option<bool>,
    /// Manually marked blown fuse or tripped breaker.
    pub is_blown: Option<bool>,
}

impl ComponentSpec {
    /// Returns a spec with every field of `self` that is set, and the
    /// corresponding field of `fallback` otherwise.
    pub fn or(&self, fallback: &ComponentSpec) -> ComponentSpec {
        ComponentSpec {
            voltage: self.voltage.or(fallback.voltage),
            capacity_ah: self.capacity_ah.or(fallback.capacity_ah),
            chemistry: self.chemistry.or(fallback.chemistry),
            role: self.role.or(fallback.role),
            wattage: self.wattage.or(fallback.wattage),
            vmp: self.vmp.or(fallback.vmp),
            voc: self.voc.or(fallback.voc),
            imp: self.imp.or(fallback.imp),
            panel_count: self.panel_count.or(fallback.panel_count),
            configuration: self.configuration.or(fallback.configuration),
            rated_current: self.rated_current.or(fallback.rated_current),
            charge_current: self.charge_current.or(fallback.charge_current),
            max_input_voltage: self.max_input_voltage.or(fallback.max_input_voltage),
            max_output_power: self.max_output_power.or(fallback.max_output_power),
            current_draw: self.current_draw.or(fallback.current_draw),
            hours_per_day: self.hours_per_day.or(fallback.hours_per_day),
            is_on: self.is_on.or(fallback.is_on),
            is_blown: self.is_blown.or(fallback.is_blown),
        }
    }
}

/// A component on the diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    id: u64,
    component_type: ComponentType,
    name: String,
    spec: ComponentSpec,
    #[serde(default)]
    overrides: ComponentSpec,
}

impl Component {
    /// Creates a component with the registry defaults of its type as spec,
    /// and no overrides.
    pub fn new(id: u64, component_type: ComponentType, name: impl Into<String>) -> Self {
        Self {
            id,
            component_type,
            name: name.into(),
            spec: ComponentSpec::defaults_for(component_type),
            overrides: ComponentSpec::default(),
        }
    }

    /// Replaces the spec of the component.
    pub fn with_spec(mut self, spec: ComponentSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Replaces the user-entered values of the component.
    pub fn with_overrides(mut self, overrides: ComponentSpec) -> Self {
        self.overrides = overrides;
        self
    }

    /// Returns a mutable reference to the user-entered values.
    pub fn overrides_mut(&mut self) -> &mut ComponentSpec {
        &mut self.overrides
    }
}

impl Node for Component {
    fn component_id(&self) -> u64 {
        self.id
    }

    fn component_type(&self) -> ComponentType {
        self.component_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    fn overrides(&self) -> &ComponentSpec {
        &self.overrides
    }
}

/// A wire between two components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: u64,
    pub destination: u64,
}

impl Connection {
    pub fn new(source: u64, destination: u64) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl Edge for Connection {
    fn source(&self) -> u64 {
        self.source
    }

    fn destination(&self) -> u64 {
        self.destination
    }
}
