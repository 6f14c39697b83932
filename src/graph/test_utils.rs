// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains the
//! `ComponentGraphBuilder`, which can declaratively build boat wiring
//! diagrams for use in tests.

use crate::{
    Component, ComponentGraph, ComponentSpec, ComponentType, Connection, Error, Node,
    SimulationConfig,
};

/// Represents a component added to the `ComponentGraphBuilder`.
#[derive(Debug, Eq, Hash, PartialEq, Copy, Clone)]
pub(crate) struct ComponentHandle(u64);

impl ComponentHandle {
    /// Returns the component ID of the component.
    pub(crate) fn component_id(&self) -> u64 {
        self.0
    }
}

/// A builder for creating wiring diagrams easily, for use in tests.
pub(crate) struct ComponentGraphBuilder {
    components: Vec<Component>,
    connections: Vec<Connection>,
    next_id: u64,
}

impl ComponentGraphBuilder {
    /// Creates a new `ComponentGraphBuilder`.
    pub(crate) fn new() -> Self {
        ComponentGraphBuilder {
            components: Vec::new(),
            connections: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a component with registry defaults and returns its handle.
    pub(crate) fn add_component(
        &mut self,
        component_type: ComponentType,
        name: &str,
    ) -> ComponentHandle {
        self.add_with(component_type, name, ComponentSpec::default())
    }

    /// Adds a component with the given overrides and returns its handle.
    pub(crate) fn add_with(
        &mut self,
        component_type: ComponentType,
        name: &str,
        overrides: ComponentSpec,
    ) -> ComponentHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.components
            .push(Component::new(id, component_type, name).with_overrides(overrides));
        ComponentHandle(id)
    }

    /// Replaces the overrides of an already added component.
    pub(crate) fn set_overrides(
        &mut self,
        handle: ComponentHandle,
        overrides: ComponentSpec,
    ) -> &mut Self {
        if let Some(component) = self
            .components
            .iter_mut()
            .find(|c| c.component_id() == handle.0)
        {
            *component.overrides_mut() = overrides;
        }
        self
    }

    pub(crate) fn battery(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::Battery, "Battery")
    }

    pub(crate) fn starter_battery(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::StarterBattery, "Starter")
    }

    pub(crate) fn house_battery(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::HouseBattery, "House bank")
    }

    pub(crate) fn solar_panel(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::SolarPanel, "Solar panel")
    }

    pub(crate) fn alternator(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::Alternator, "Alternator")
    }

    pub(crate) fn mppt_charger(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::DcDcMpptCharger, "DC-DC MPPT")
    }

    pub(crate) fn dc_dc_charger(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::DcDcCharger, "DC-DC")
    }

    /// Adds a fuse with the given rating, in amps.
    pub(crate) fn fuse(&mut self, rating: f64) -> ComponentHandle {
        self.add_with(
            ComponentType::Fuse,
            "Fuse",
            ComponentSpec {
                rated_current: Some(rating),
                ..Default::default()
            },
        )
    }

    pub(crate) fn bus_bar(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::BusBar, "Positive bus")
    }

    pub(crate) fn ground_bus(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::GroundBus, "Negative bus")
    }

    pub(crate) fn light(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::Light, "Cabin light")
    }

    pub(crate) fn radio(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::Radio, "VHF radio")
    }

    pub(crate) fn bilge_pump(&mut self) -> ComponentHandle {
        self.add_component(ComponentType::BilgePump, "Bilge pump")
    }

    /// Adds a load drawing the given current, in amps.
    pub(crate) fn load(&mut self, current_draw: f64) -> ComponentHandle {
        self.add_with(
            ComponentType::GenericLoad,
            "Load",
            ComponentSpec {
                current_draw: Some(current_draw),
                ..Default::default()
            },
        )
    }

    /// Connects two components in the graph.
    pub(crate) fn connect(&mut self, from: ComponentHandle, to: ComponentHandle) -> &mut Self {
        self.connections.push(Connection::new(from.0, to.0));
        self
    }

    /// Connects each of the given components to the next one.
    pub(crate) fn chain(&mut self, handles: &[ComponentHandle]) -> &mut Self {
        for pair in handles.windows(2) {
            self.connect(pair[0], pair[1]);
        }
        self
    }

    /// Builds and returns the component graph from the components and
    /// connections added to the builder.
    pub(crate) fn build(
        &self,
        config: Option<SimulationConfig>,
    ) -> Result<ComponentGraph<Component, Connection>, Error> {
        ComponentGraph::try_new(
            self.components.clone(),
            self.connections.clone(),
            config.unwrap_or_default(),
        )
    }
}
