// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Marine DC Simulator

This is a library for simulating the low-voltage DC electrical network of a
boat: batteries, solar panels, alternators, DC-DC chargers, fuses, bus bars,
switches and loads, wired together as an undirected graph.

The graph never declares a direction of current flow.  Instead, the library
*traces* through pass-through components (fuses, breakers, bus bars, switches
and ground buses) to find the real electrical endpoints on either side of any
component, and resolves every tick as a fixed sequence of stages.

## The `Node` and `Edge` traits

The main struct is [`ComponentGraph`], instances of which can be created by
passing an iterator of components and the wires between them to the
[`try_new`][ComponentGraph::try_new] method.

The library doesn't need to know the caller's component and wire types, it
uses traits to interact with them.  To be usable with this library, the types
must implement the [`Node`] and [`Edge`] traits respectively.  Callers without
a model of their own can use the provided [`Component`] and [`Connection`]
types.

## Validation

The [`try_new`][ComponentGraph::try_new] method checks that:

- Component IDs are unique.
- Connections point to existing components.
- No component is connected to itself.

Unconnected components are allowed; they are reported by the diagnostics of
each tick instead.

## Simulation

[`simulate`][ComponentGraph::simulate] computes one tick from the graph, an
[`Environment`] snapshot, the previous tick's [`SimulationResult`] and the
elapsed simulated time.  The stages run in this order:

1. Sources: batteries (provisional), solar panels and arrays, alternators
   and shore power.
2. Chargers: DC-DC and DC-DC MPPT chargers.
3. Loads, protection and distribution.
4. Battery finalization: state of charge, resting voltage and status.
5. Diagnostics.

Each stage reads only the outputs of the stages before it.  The only state
carried across ticks is each battery's state of charge, voltage and
charge/discharge status, taken from the explicit previous result.
*/

mod chemistry;
pub use chemistry::{BatteryChemistry, ChargeStage, ChemistryProfile};

mod component;
pub use component::{ArrayConfiguration, BatteryRole, Component, ComponentSpec, Connection};

mod component_category;
pub use component_category::{ComponentCategory, ComponentType};

mod config;
pub use config::SimulationConfig;

mod graph;
pub use graph::{iterators, ComponentGraph};

mod graph_traits;
pub use graph_traits::{Edge, Node};

mod error;
pub use error::Error;

mod registry;

mod simulation;
pub use simulation::{
    ChargerState, Diagnostic, DiagnosticCode, EdgeState, Environment, NodeState,
    NodeStatus, SimulationResult,
};
