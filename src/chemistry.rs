// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Battery chemistries, their charge profiles and resting voltage curves.
//!
//! Chemistry-specific behavior is looked up once per battery as a
//! [`ChemistryProfile`], and the curve and charge-stage functions take the
//! profile as a parameter.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lowest voltage a 12V battery is ever reported at.
pub(crate) const MIN_BATTERY_VOLTAGE: f64 = 10.5;
/// Highest voltage a 12V battery is ever reported at.
pub(crate) const MAX_BATTERY_VOLTAGE: f64 = 14.6;

/// Cells in series in a 12V lead-acid bank.
const CELLS_PER_BANK: f64 = 6.0;
/// Temperature at which nominal charge voltages apply, in °C.
const REFERENCE_TEMPERATURE: f64 = 25.0;

/// Represents the chemistry of a battery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryChemistry {
    #[default]
    #[serde(rename = "lead-acid")]
    LeadAcid,
    #[serde(rename = "agm")]
    Agm,
    #[serde(rename = "gel")]
    Gel,
    #[serde(rename = "lithium")]
    Lithium,
    #[serde(rename = "lifepo4")]
    LiFePO4,
}

impl BatteryChemistry {
    /// Returns true for the chemistries charged with CC/CV and no float.
    pub fn is_lithium(&self) -> bool {
        matches!(self, BatteryChemistry::Lithium | BatteryChemistry::LiFePO4)
    }

    /// Returns the charge profile of the chemistry.
    pub fn profile(&self) -> &'static ChemistryProfile {
        match self {
            BatteryChemistry::LeadAcid => &LEAD_ACID,
            BatteryChemistry::Agm => &AGM,
            BatteryChemistry::Gel => &GEL,
            BatteryChemistry::Lithium => &LITHIUM,
            BatteryChemistry::LiFePO4 => &LIFEPO4,
        }
    }
}

impl Display for BatteryChemistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatteryChemistry::LeadAcid => write!(f, "LeadAcid"),
            BatteryChemistry::Agm => write!(f, "AGM"),
            BatteryChemistry::Gel => write!(f, "Gel"),
            BatteryChemistry::Lithium => write!(f, "Lithium"),
            BatteryChemistry::LiFePO4 => write!(f, "LiFePO4"),
        }
    }
}

/// Charge and discharge characteristics of a battery chemistry, for a 12V
/// bank.
#[derive(Clone, Debug, PartialEq)]
pub struct ChemistryProfile {
    pub chemistry: BatteryChemistry,
    /// Nominal bulk/absorption voltage at 25°C.
    pub bulk_voltage: f64,
    /// Nominal float voltage at 25°C.
    pub float_voltage: f64,
    /// Temperature compensation, in millivolts per cell per °C.
    pub temp_coefficient_mv: f64,
    /// Highest safe charge current, as a multiple of capacity.
    pub max_charge_c_rate: f64,
    /// Highest safe discharge current, as a multiple of capacity.
    pub max_discharge_c_rate: f64,
    /// Usable share of the capacity, in percent.
    pub max_depth_of_discharge: f64,
    /// Resting voltage when full.
    pub voltage_full: f64,
    /// Resting voltage at 50% state of charge.
    pub voltage_mid: f64,
    /// Resting voltage at the bottom knee of the curve.
    pub voltage_empty: f64,
}

const LEAD_ACID: ChemistryProfile = ChemistryProfile {
    chemistry: BatteryChemistry::LeadAcid,
    bulk_voltage: 14.4,
    float_voltage: 13.5,
    temp_coefficient_mv: -5.0,
    max_charge_c_rate: 0.2,
    max_discharge_c_rate: 0.25,
    max_depth_of_discharge: 50.0,
    voltage_full: 12.7,
    voltage_mid: 12.2,
    voltage_empty: 11.9,
};

const AGM: ChemistryProfile = ChemistryProfile {
    chemistry: BatteryChemistry::Agm,
    bulk_voltage: 14.4,
    float_voltage: 13.6,
    temp_coefficient_mv: -4.0,
    max_charge_c_rate: 0.3,
    max_discharge_c_rate: 0.5,
    max_depth_of_discharge: 50.0,
    voltage_full: 12.8,
    voltage_mid: 12.3,
    voltage_empty: 12.0,
};

const GEL: ChemistryProfile = ChemistryProfile {
    chemistry: BatteryChemistry::Gel,
    bulk_voltage: 14.1,
    float_voltage: 13.8,
    temp_coefficient_mv: -4.0,
    max_charge_c_rate: 0.2,
    max_discharge_c_rate: 0.3,
    max_depth_of_discharge: 50.0,
    voltage_full: 12.85,
    voltage_mid: 12.3,
    voltage_empty: 12.0,
};

const LITHIUM: ChemistryProfile = ChemistryProfile {
    chemistry: BatteryChemistry::Lithium,
    bulk_voltage: 14.4,
    float_voltage: 13.6,
    temp_coefficient_mv: 0.0,
    max_charge_c_rate: 0.5,
    max_discharge_c_rate: 1.0,
    max_depth_of_discharge: 80.0,
    voltage_full: 13.4,
    voltage_mid: 13.0,
    voltage_empty: 12.0,
};

const LIFEPO4: ChemistryProfile = ChemistryProfile {
    chemistry: BatteryChemistry::LiFePO4,
    bulk_voltage: 14.2,
    float_voltage: 13.5,
    temp_coefficient_mv: 0.0,
    max_charge_c_rate: 1.0,
    max_discharge_c_rate: 1.0,
    max_depth_of_discharge: 90.0,
    voltage_full: 13.6,
    voltage_mid: 13.2,
    voltage_empty: 12.0,
};

/// The stage a charger is in, labelled the way the monitor displays it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargeStage {
    /// No target battery, or no input to charge from.
    Idle,
    Bulk,
    Absorption,
    Float,
    /// Lithium bulk stage.
    ConstantCurrent,
    /// Lithium absorption stage.
    ConstantVoltage,
    /// Lithium battery is full, charging stops.
    FullStopped,
    OvervoltageProtection,
}

impl Display for ChargeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeStage::Idle => write!(f, "idle"),
            ChargeStage::Bulk => write!(f, "bulk"),
            ChargeStage::Absorption => write!(f, "absorption"),
            ChargeStage::Float => write!(f, "float"),
            ChargeStage::ConstantCurrent => write!(f, "bulk (CC)"),
            ChargeStage::ConstantVoltage => write!(f, "absorption (CV)"),
            ChargeStage::FullStopped => write!(f, "full (stopped)"),
            ChargeStage::OvervoltageProtection => write!(f, "overvoltage protection"),
        }
    }
}

impl ChemistryProfile {
    /// Returns the charge stage for a battery at the given state of charge,
    /// and the factor to scale the otherwise allowed charge current with.
    pub fn charge_stage(&self, soc: f64) -> (ChargeStage, f64) {
        if self.chemistry.is_lithium() {
            if soc < 95.0 {
                (ChargeStage::ConstantCurrent, 1.0)
            } else if soc < 100.0 {
                (ChargeStage::ConstantVoltage, (100.0 - soc) / 5.0)
            } else {
                (ChargeStage::FullStopped, 0.0)
            }
        } else if soc < 80.0 {
            (ChargeStage::Bulk, 1.0)
        } else if soc < 95.0 {
            (ChargeStage::Absorption, 0.7 + ((95.0 - soc) / 15.0) * 0.3)
        } else {
            (ChargeStage::Float, 0.1)
        }
    }

    /// Returns the shift of the bulk and float voltages at the given ambient
    /// temperature, in volts.
    pub fn temperature_compensation(&self, ambient_temperature: f64) -> f64 {
        self.temp_coefficient_mv * (ambient_temperature - REFERENCE_TEMPERATURE) * CELLS_PER_BANK
            / 1000.0
    }

    /// Returns the resting voltage at the given state of charge, clamped to
    /// the reportable battery voltage range.
    pub fn resting_voltage(&self, soc: f64) -> f64 {
        let soc = soc.clamp(0.0, 100.0);
        let voltage = if self.chemistry.is_lithium() {
            let knee = self.voltage_mid - 35.0 * 0.005;
            let top = self.voltage_mid + 45.0 * 0.005;
            if soc > 95.0 {
                top + (self.voltage_full - top) * (soc - 95.0) / 5.0
            } else if soc > 15.0 {
                self.voltage_mid + (soc - 50.0) * 0.005
            } else {
                self.voltage_empty + (knee - self.voltage_empty) * soc / 15.0
            }
        } else {
            let slope = (self.voltage_mid - self.voltage_empty) / 30.0;
            let upper_knee = self.voltage_mid + 30.0 * slope;
            if soc > 80.0 {
                upper_knee + (self.voltage_full - upper_knee) * (soc - 80.0) / 20.0
            } else if soc > 20.0 {
                self.voltage_empty + (soc - 20.0) * slope
            } else {
                self.voltage_empty - (20.0 - soc) * 0.05
            }
        };
        voltage.clamp(MIN_BATTERY_VOLTAGE, MAX_BATTERY_VOLTAGE)
    }
}
