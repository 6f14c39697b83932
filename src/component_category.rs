// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `ComponentType` and `ComponentCategory` enums,
//! which represent the kind of a component and the simulation stage that
//! resolves it.

use crate::graph_traits::Node;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Represents the type of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Battery,
    BatteryBank,
    StarterBattery,
    HouseBattery,
    SolarPanel,
    SolarArray,
    Alternator,
    ShorePower,
    DcDcCharger,
    DcDcMpptCharger,
    Fuse,
    Breaker,
    BusBar,
    GroundBus,
    Switch,
    Relay,
    Light,
    BilgePump,
    Refrigerator,
    NavigationElectronics,
    Radio,
    GenericLoad,
}

impl ComponentType {
    /// Returns the category of this component type.
    ///
    /// The category alone decides which simulation stage resolves a component.
    pub fn category(&self) -> ComponentCategory {
        match self {
            ComponentType::Battery
            | ComponentType::BatteryBank
            | ComponentType::StarterBattery
            | ComponentType::HouseBattery
            | ComponentType::SolarPanel
            | ComponentType::SolarArray
            | ComponentType::Alternator
            | ComponentType::ShorePower => ComponentCategory::PowerSource,
            ComponentType::DcDcCharger | ComponentType::DcDcMpptCharger => {
                ComponentCategory::Charging
            }
            ComponentType::Fuse | ComponentType::Breaker => ComponentCategory::Protection,
            ComponentType::BusBar => ComponentCategory::Distribution,
            ComponentType::Switch | ComponentType::Relay => ComponentCategory::Switching,
            ComponentType::GroundBus => ComponentCategory::Ground,
            ComponentType::Light
            | ComponentType::BilgePump
            | ComponentType::Refrigerator
            | ComponentType::NavigationElectronics
            | ComponentType::Radio
            | ComponentType::GenericLoad => ComponentCategory::Load,
        }
    }

    pub(crate) fn is_battery(&self) -> bool {
        matches!(
            self,
            ComponentType::Battery
                | ComponentType::BatteryBank
                | ComponentType::StarterBattery
                | ComponentType::HouseBattery
        )
    }

    pub(crate) fn is_solar(&self) -> bool {
        matches!(self, ComponentType::SolarPanel | ComponentType::SolarArray)
    }
}

impl Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentType::Battery => write!(f, "Battery"),
            ComponentType::BatteryBank => write!(f, "BatteryBank"),
            ComponentType::StarterBattery => write!(f, "StarterBattery"),
            ComponentType::HouseBattery => write!(f, "HouseBattery"),
            ComponentType::SolarPanel => write!(f, "SolarPanel"),
            ComponentType::SolarArray => write!(f, "SolarArray"),
            ComponentType::Alternator => write!(f, "Alternator"),
            ComponentType::ShorePower => write!(f, "ShorePower"),
            ComponentType::DcDcCharger => write!(f, "DcDcCharger"),
            ComponentType::DcDcMpptCharger => write!(f, "DcDcMpptCharger"),
            ComponentType::Fuse => write!(f, "Fuse"),
            ComponentType::Breaker => write!(f, "Breaker"),
            ComponentType::BusBar => write!(f, "BusBar"),
            ComponentType::GroundBus => write!(f, "GroundBus"),
            ComponentType::Switch => write!(f, "Switch"),
            ComponentType::Relay => write!(f, "Relay"),
            ComponentType::Light => write!(f, "Light"),
            ComponentType::BilgePump => write!(f, "BilgePump"),
            ComponentType::Refrigerator => write!(f, "Refrigerator"),
            ComponentType::NavigationElectronics => write!(f, "NavigationElectronics"),
            ComponentType::Radio => write!(f, "Radio"),
            ComponentType::GenericLoad => write!(f, "GenericLoad"),
        }
    }
}

/// Represents the category of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentCategory {
    PowerSource,
    Charging,
    Protection,
    Distribution,
    Switching,
    Load,
    Ground,
}

impl Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentCategory::PowerSource => write!(f, "PowerSource"),
            ComponentCategory::Charging => write!(f, "Charging"),
            ComponentCategory::Protection => write!(f, "Protection"),
            ComponentCategory::Distribution => write!(f, "Distribution"),
            ComponentCategory::Switching => write!(f, "Switching"),
            ComponentCategory::Load => write!(f, "Load"),
            ComponentCategory::Ground => write!(f, "Ground"),
        }
    }
}

/// Predicates for checking the component type and category of a `Node`.
pub(crate) trait CategoryPredicates: Node {
    /// Pass-through components conduct, but are never a source, a load or a
    /// battery.  Tracing walks through them.
    fn is_pass_through(&self) -> bool {
        matches!(
            self.category(),
            ComponentCategory::Protection
                | ComponentCategory::Distribution
                | ComponentCategory::Switching
                | ComponentCategory::Ground
        )
    }

    fn is_battery(&self) -> bool {
        self.component_type().is_battery()
    }

    fn is_solar(&self) -> bool {
        self.component_type().is_solar()
    }

    fn is_alternator(&self) -> bool {
        self.component_type() == ComponentType::Alternator
    }

    fn is_charger(&self) -> bool {
        self.category() == ComponentCategory::Charging
    }

    fn is_mppt_charger(&self) -> bool {
        self.component_type() == ComponentType::DcDcMpptCharger
    }

    fn is_load(&self) -> bool {
        self.category() == ComponentCategory::Load
    }

    fn is_protection(&self) -> bool {
        self.category() == ComponentCategory::Protection
    }

    fn is_bus_bar(&self) -> bool {
        self.component_type() == ComponentType::BusBar
    }

    fn is_ground(&self) -> bool {
        self.category() == ComponentCategory::Ground
    }

    /// Batteries, shore power, alternators and chargers can power a load.
    fn is_power_supply(&self) -> bool {
        self.is_battery()
            || self.is_alternator()
            || self.is_charger()
            || self.component_type() == ComponentType::ShorePower
    }
}

/// Implement the `CategoryPredicates` trait for all types that implement the
/// `Node` trait.
impl<T: Node> CategoryPredicates for T {}
