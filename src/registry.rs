// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Static default specs for every component type.

use crate::{ArrayConfiguration, BatteryChemistry, BatteryRole, ComponentSpec, ComponentType};

impl ComponentSpec {
    /// Returns the default spec of the given component type.
    ///
    /// Parameters that don't apply to a type are left unset.
    pub fn defaults_for(component_type: ComponentType) -> ComponentSpec {
        match component_type {
            ComponentType::Battery => battery(100.0, BatteryChemistry::Agm, None),
            ComponentType::BatteryBank => battery(400.0, BatteryChemistry::Agm, None),
            ComponentType::StarterBattery => battery(
                70.0,
                BatteryChemistry::LeadAcid,
                Some(BatteryRole::Starter),
            ),
            ComponentType::HouseBattery => {
                battery(200.0, BatteryChemistry::LiFePO4, Some(BatteryRole::House))
            }
            ComponentType::SolarPanel => ComponentSpec {
                wattage: Some(100.0),
                vmp: Some(18.0),
                voc: Some(22.0),
                imp: Some(5.56),
                panel_count: Some(1),
                ..Default::default()
            },
            ComponentType::SolarArray => ComponentSpec {
                wattage: Some(100.0),
                vmp: Some(18.0),
                voc: Some(22.0),
                imp: Some(5.56),
                panel_count: Some(2),
                configuration: Some(ArrayConfiguration::Parallel),
                ..Default::default()
            },
            ComponentType::Alternator => ComponentSpec {
                voltage: Some(14.4),
                rated_current: Some(100.0),
                ..Default::default()
            },
            ComponentType::ShorePower => ComponentSpec {
                voltage: Some(120.0),
                rated_current: Some(30.0),
                ..Default::default()
            },
            ComponentType::DcDcCharger => ComponentSpec {
                voltage: Some(12.0),
                charge_current: Some(20.0),
                max_input_voltage: Some(16.0),
                max_output_power: Some(300.0),
                ..Default::default()
            },
            ComponentType::DcDcMpptCharger => ComponentSpec {
                voltage: Some(12.0),
                charge_current: Some(50.0),
                max_input_voltage: Some(25.0),
                max_output_power: Some(700.0),
                ..Default::default()
            },
            ComponentType::Fuse => rated(30.0),
            ComponentType::Breaker => rated(50.0),
            ComponentType::BusBar => rated(150.0),
            ComponentType::GroundBus => rated(150.0),
            ComponentType::Switch => ComponentSpec {
                rated_current: Some(100.0),
                is_on: Some(true),
                ..Default::default()
            },
            ComponentType::Relay => ComponentSpec {
                rated_current: Some(80.0),
                is_on: Some(true),
                ..Default::default()
            },
            ComponentType::Light => load(1.5, 5.0),
            ComponentType::BilgePump => load(5.0, 0.5),
            ComponentType::Refrigerator => load(4.0, 12.0),
            ComponentType::NavigationElectronics => load(2.0, 8.0),
            ComponentType::Radio => load(1.0, 6.0),
            ComponentType::GenericLoad => load(1.0, 4.0),
        }
    }
}

fn battery(
    capacity_ah: f64,
    chemistry: BatteryChemistry,
    role: Option<BatteryRole>,
) -> ComponentSpec {
    ComponentSpec {
        voltage: Some(12.0),
        capacity_ah: Some(capacity_ah),
        chemistry: Some(chemistry),
        role,
        ..Default::default()
    }
}

fn rated(rated_current: f64) -> ComponentSpec {
    ComponentSpec {
        rated_current: Some(rated_current),
        ..Default::default()
    }
}

fn load(current_draw: f64, hours_per_day: f64) -> ComponentSpec {
    ComponentSpec {
        voltage: Some(12.0),
        current_draw: Some(current_draw),
        hours_per_day: Some(hours_per_day),
        is_on: Some(true),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_defaults() {
        let spec = ComponentSpec::defaults_for(ComponentType::StarterBattery);
        assert_eq!(spec.role, Some(BatteryRole::Starter));
        assert_eq!(spec.chemistry, Some(BatteryChemistry::LeadAcid));

        let spec = ComponentSpec::defaults_for(ComponentType::HouseBattery);
        assert_eq!(spec.role, Some(BatteryRole::House));
        assert_eq!(spec.chemistry, Some(BatteryChemistry::LiFePO4));

        let spec = ComponentSpec::defaults_for(ComponentType::Battery);
        assert_eq!(spec.role, None);
    }

    #[test]
    fn test_loads_default_on() {
        for ty in [
            ComponentType::Light,
            ComponentType::BilgePump,
            ComponentType::Refrigerator,
            ComponentType::NavigationElectronics,
            ComponentType::Radio,
            ComponentType::GenericLoad,
        ] {
            let spec = ComponentSpec::defaults_for(ty);
            assert_eq!(spec.is_on, Some(true), "{ty}");
            assert!(spec.current_draw.is_some_and(|c| c > 0.0), "{ty}");
        }
    }
}
