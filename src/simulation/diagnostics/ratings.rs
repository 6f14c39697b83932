// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Rules that hold computed currents and voltages against component ratings
//! and chemistry limits.

use crate::{
    component_category::CategoryPredicates, ArrayConfiguration, BatteryRole, ComponentType, Edge,
    Node,
};

use crate::simulation::batteries::{capacity_ah, chemistry};
use crate::simulation::roles::battery_role;
use crate::simulation::{DiagnosticCode, NodeStatus};

use super::DiagnosticsEngine;

const DEFAULT_HOURS_PER_DAY: f64 = 4.0;
/// Open circuit voltage of a panel relative to its Vmp, when not given.
const VOC_PER_VMP: f64 = 1.2;

/// Returns the open circuit voltage a solar panel or array presents to a
/// charger.
fn open_circuit_voltage<N: Node>(solar: &N) -> f64 {
    let params = solar.parameters();
    let voc = params
        .voc
        .or(params.vmp.map(|vmp| vmp * VOC_PER_VMP))
        .unwrap_or(0.0);
    match (solar.component_type(), params.configuration.unwrap_or_default()) {
        (ComponentType::SolarArray, ArrayConfiguration::Series) => {
            voc * params.panel_count.unwrap_or(1).max(1) as f64
        }
        _ => voc,
    }
}

fn is_house_battery<N: Node>(battery: &N) -> bool {
    battery_role(battery) != Some(BatteryRole::Starter)
}

impl<N, E> DiagnosticsEngine<'_, N, E>
where
    N: Node,
    E: Edge,
{
    /// Fuses and breakers above, or close to, their rating.
    pub(super) fn check_fuse_ratings(&mut self) {
        let graph = self.graph;
        let warning_ratio = graph.config().fuse_warning_ratio;

        for protection in graph.components().filter(|n| n.is_protection()) {
            let params = protection.parameters();
            let rating = params.rated_current.unwrap_or(0.0);
            if params.is_blown.unwrap_or(false) || rating <= 0.0 {
                continue;
            }
            let id = protection.component_id();
            let current = self.state(id).map_or(0.0, |s| s.current);

            if current > rating {
                self.report.warn(
                    DiagnosticCode::FuseOverloaded,
                    vec![id],
                    format!(
                        "'{}' is rated {} A but carries {:.1} A.",
                        protection.name(),
                        rating,
                        current
                    ),
                );
            } else if current > 0.0 && current >= rating * warning_ratio {
                self.report.warn(
                    DiagnosticCode::FuseNearRating,
                    vec![id],
                    format!(
                        "'{}' carries {:.1} A, {:.0}% of its {} A rating.",
                        protection.name(),
                        current,
                        current / rating * 100.0,
                        rating
                    ),
                );
            }
        }
    }

    /// Fuses and breakers rated well below the current they carry, which
    /// need a larger size rather than a lighter load.
    pub(super) fn check_undersized_fuses(&mut self) {
        let graph = self.graph;
        let ratio = graph.config().fuse_undersized_ratio;

        for protection in graph.components().filter(|n| n.is_protection()) {
            let params = protection.parameters();
            let rating = params.rated_current.unwrap_or(0.0);
            if params.is_blown.unwrap_or(false) || rating <= 0.0 {
                continue;
            }
            let id = protection.component_id();
            let current = self.state(id).map_or(0.0, |s| s.current);

            if rating < current * ratio {
                self.report.warn(
                    DiagnosticCode::FuseUndersized,
                    vec![id],
                    format!(
                        "'{}' is undersized: rated {} A for {:.1} A, it should be at least \
                         {:.1} A.",
                        protection.name(),
                        rating,
                        current,
                        current * ratio
                    ),
                );
            }
        }
    }

    /// Solar open circuit voltage against the charger's maximum input.
    pub(super) fn check_solar_voc(&mut self) {
        let graph = self.graph;
        let warning_ratio = graph.config().solar_voc_warning_ratio;

        for charger in graph.components().filter(|n| n.is_charger()) {
            let Some(max_input_voltage) = charger.parameters().max_input_voltage else {
                continue;
            };
            for solar in graph
                .traced(charger.component_id())
                .into_iter()
                .filter(|n| n.is_solar())
            {
                let voc = open_circuit_voltage(solar);
                let ids = vec![solar.component_id(), charger.component_id()];
                if voc > max_input_voltage {
                    self.report.error(
                        DiagnosticCode::SolarVocExceedsCharger,
                        ids,
                        format!(
                            "'{}' has an open circuit voltage of {:.1} V, above the {} V \
                             maximum input of '{}'.",
                            solar.name(),
                            voc,
                            max_input_voltage,
                            charger.name()
                        ),
                    );
                } else if voc >= max_input_voltage * warning_ratio {
                    self.report.warn(
                        DiagnosticCode::SolarVocNearChargerLimit,
                        ids,
                        format!(
                            "'{}' has an open circuit voltage of {:.1} V, close to the {} V \
                             maximum input of '{}'.",
                            solar.name(),
                            voc,
                            max_input_voltage,
                            charger.name()
                        ),
                    );
                }
            }
        }
    }

    /// Daily amp hours of the active loads against the usable house battery
    /// capacity.
    pub(super) fn check_daily_demand(&mut self) {
        let graph = self.graph;

        let demand: f64 = graph
            .components()
            .filter(|n| n.is_load())
            .filter_map(|load| {
                let state = self
                    .state(load.component_id())
                    .filter(|s| s.status == NodeStatus::On)?;
                let hours = load
                    .parameters()
                    .hours_per_day
                    .unwrap_or(DEFAULT_HOURS_PER_DAY);
                Some(state.current * hours)
            })
            .sum();
        if demand <= 0.0 {
            return;
        }

        let house_batteries = graph
            .components()
            .filter(|n| n.is_battery() && is_house_battery(*n))
            .collect::<Vec<_>>();
        let capacity: f64 = house_batteries.iter().map(|n| capacity_ah(*n)).sum();
        let usable = capacity * graph.config().daily_demand_capacity_ratio;

        if demand > usable {
            self.report.warn(
                DiagnosticCode::DailyDemandExceedsCapacity,
                house_batteries.iter().map(|n| n.component_id()).collect(),
                format!(
                    "Loads use {:.1} Ah a day, more than the {:.1} Ah that {:.0} Ah of house \
                     batteries can provide.",
                    demand, usable, capacity
                ),
            );
        }
    }

    /// Chargers rated for more current than their target battery's chemistry
    /// safely takes.
    pub(super) fn check_charge_rates(&mut self) {
        let graph = self.graph;
        for charger in graph.components().filter(|n| n.is_charger()) {
            let Some(rated) = charger.parameters().charge_current else {
                continue;
            };
            let Some(target) = self
                .state(charger.component_id())
                .and_then(|s| s.charger.as_ref())
                .and_then(|c| c.target_battery)
                .and_then(|id| graph.component(id).ok())
            else {
                continue;
            };

            let profile = chemistry(target).profile();
            let limit = capacity_ah(target) * profile.max_charge_c_rate;
            if rated > limit {
                self.report.warn(
                    DiagnosticCode::ChargeRateExceedsChemistry,
                    vec![charger.component_id(), target.component_id()],
                    format!(
                        "'{}' charges at up to {} A, above the {:.1} A that '{}' ({}) \
                         safely takes.",
                        charger.name(),
                        rated,
                        limit,
                        target.name(),
                        profile.chemistry
                    ),
                );
            }
        }
    }

    pub(super) fn check_discharge_rates(&mut self) {
        let graph = self.graph;
        for battery in graph.components().filter(|n| n.is_battery()) {
            let Some(state) = self
                .state(battery.component_id())
                .filter(|s| s.status == NodeStatus::Discharging)
            else {
                continue;
            };

            let profile = chemistry(battery).profile();
            let limit = capacity_ah(battery) * profile.max_discharge_c_rate;
            let current = state.current.abs();
            if current > limit {
                self.report.warn(
                    DiagnosticCode::DischargeRateExceedsChemistry,
                    vec![battery.component_id()],
                    format!(
                        "'{}' discharges at {:.1} A, above its {:.1} A limit.",
                        battery.name(),
                        current,
                        limit
                    ),
                );
            }
        }
    }

    /// House batteries wired in parallel at different voltages.
    pub(super) fn check_parallel_batteries(&mut self) {
        let graph = self.graph;
        let threshold = graph.config().parallel_voltage_mismatch;

        for battery in graph
            .components()
            .filter(|n| n.is_battery() && is_house_battery(*n))
        {
            let id = battery.component_id();
            let Some(voltage) = self.state(id).map(|s| s.voltage) else {
                continue;
            };
            for other in graph.traced(id).into_iter().filter(|n| {
                n.component_id() > id && n.is_battery() && is_house_battery(*n)
            }) {
                let Some(other_voltage) = self.state(other.component_id()).map(|s| s.voltage)
                else {
                    continue;
                };
                let difference = (voltage - other_voltage).abs();
                if difference > threshold {
                    self.report.warn(
                        DiagnosticCode::ParallelVoltageMismatch,
                        vec![id, other.component_id()],
                        format!(
                            "'{}' ({:.2} V) and '{}' ({:.2} V) are in parallel with a \
                             {:.2} V difference.",
                            battery.name(),
                            voltage,
                            other.name(),
                            other_voltage,
                            difference
                        ),
                    );
                }
            }
        }
    }

    /// Bus bars carrying more load current than their rating.
    pub(super) fn check_bus_bars(&mut self) {
        let graph = self.graph;
        for bus in graph.components().filter(|n| n.is_bus_bar()) {
            let Some(rating) = bus.parameters().rated_current.filter(|r| *r > 0.0) else {
                continue;
            };
            let current: f64 = graph
                .traced(bus.component_id())
                .into_iter()
                .filter(|n| n.is_load())
                .filter_map(|n| self.state(n.component_id()))
                .filter(|s| s.status == NodeStatus::On)
                .map(|s| s.current)
                .sum();

            if current > rating {
                self.report.error(
                    DiagnosticCode::BusBarOverloaded,
                    vec![bus.component_id()],
                    format!(
                        "'{}' carries {:.1} A of loads, above its {} A rating.",
                        bus.name(),
                        current,
                        rating
                    ),
                );
            }
        }
    }
}
