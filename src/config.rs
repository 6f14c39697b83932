// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the simulation.

/// Configuration options for the simulation of a `ComponentGraph`.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// State of charge of a battery on the first tick, in percent.
    pub default_state_of_charge: f64,

    /// Voltage of a battery on the first tick.
    pub default_battery_voltage: f64,

    /// System voltage used when the graph has no battery.
    pub nominal_system_voltage: f64,

    /// Alternator speed below which it produces nothing.
    pub alternator_cut_in_rpm: f64,

    /// Alternator speed at which it reaches its rated current.
    pub alternator_full_output_rpm: f64,

    /// Regulated output voltage of an alternator.
    pub alternator_voltage: f64,

    /// Starter battery voltage above which a DC-DC charger starts drawing
    /// from the alternator path.
    pub charger_activation_voltage: f64,

    /// Amps of charge current per volt of difference between the alternator
    /// path and the target battery.
    pub alternator_current_gain: f64,

    /// Battery current a battery must exceed to leave `Idle`, in amps.
    pub hysteresis_enter_current: f64,

    /// Battery current below which a charging or discharging battery falls
    /// back to `Idle`, in amps.
    pub hysteresis_exit_current: f64,

    /// State of charge below which a warning is emitted, in percent.
    pub low_state_of_charge: f64,

    /// State of charge below which an error is emitted, in percent.
    pub critical_state_of_charge: f64,

    /// Share of a fuse's rating from which a warning is emitted.
    pub fuse_warning_ratio: f64,

    /// A fuse rated below this share of the current it carries is
    /// undersized.
    pub fuse_undersized_ratio: f64,

    /// Share of a charger's max input voltage from which a solar open
    /// circuit voltage produces a warning.
    pub solar_voc_warning_ratio: f64,

    /// Voltage difference between parallel house batteries that produces a
    /// warning.
    pub parallel_voltage_mismatch: f64,

    /// Share of total house battery capacity that daily demand may use.
    pub daily_demand_capacity_ratio: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_state_of_charge: 80.0,
            default_battery_voltage: 12.8,
            nominal_system_voltage: 12.8,
            alternator_cut_in_rpm: 800.0,
            alternator_full_output_rpm: 2000.0,
            alternator_voltage: 14.4,
            charger_activation_voltage: 13.2,
            alternator_current_gain: 5.0,
            hysteresis_enter_current: 0.5,
            hysteresis_exit_current: 0.1,
            low_state_of_charge: 20.0,
            critical_state_of_charge: 10.0,
            fuse_warning_ratio: 0.8,
            fuse_undersized_ratio: 0.8,
            solar_voc_warning_ratio: 0.9,
            parallel_voltage_mismatch: 0.5,
            daily_demand_capacity_ratio: 0.5,
        }
    }
}
