// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the connectivity tracer and the queries built on it.
//!
//! Tracing walks the graph from a component through pass-through components
//! (protection, distribution, switching and ground), and collects the real
//! components it reaches.  Real components end the walk: they are electrical
//! endpoints, never hubs.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::{
    component_category::CategoryPredicates, ComponentCategory, ComponentGraph, ComponentType,
    Edge, Error, Node,
};

/// Traversal methods.
impl<N, E> ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    fn index_of(&self, component_id: u64) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(&component_id)
            .copied()
            .ok_or_else(|| Error::unknown_component(component_id))
    }

    /// Walks the graph from `start`, through every component for which
    /// `transparent` returns true.
    ///
    /// Each component is visited at most once, so a component reachable over
    /// several paths is returned once, and cycles terminate.
    fn trace_from(&self, start: NodeIndex, transparent: &impl Fn(&N) -> bool) -> Vec<&N> {
        let mut visited = HashSet::from([start]);
        let mut found = vec![];
        self.trace_into(start, transparent, &mut visited, &mut found);
        found
    }

    fn trace_into<'a>(
        &'a self,
        index: NodeIndex,
        transparent: &impl Fn(&N) -> bool,
        visited: &mut HashSet<NodeIndex>,
        found: &mut Vec<&'a N>,
    ) {
        // Neighbors in the order the components were added, so that traces
        // don't depend on the order of the wires.
        let mut neighbors = self.graph.neighbors(index).collect::<Vec<_>>();
        neighbors.sort();

        for neighbor in neighbors {
            if !visited.insert(neighbor) {
                continue;
            }
            let node = &self.graph[neighbor];
            if transparent(node) {
                self.trace_into(neighbor, transparent, visited, found);
            } else {
                found.push(node);
            }
        }
    }

    /// Returns the real components reachable from the given component,
    /// through any number of pass-through components.
    ///
    /// An unconnected component traces to nothing, which means it is
    /// unpowered.
    pub fn trace(&self, component_id: u64) -> Result<Vec<&N>, Error> {
        let index = self.index_of(component_id)?;
        Ok(self.trace_from(index, &|n: &N| n.is_pass_through()))
    }

    /// Returns the traced components of the given type.
    pub fn trace_type(
        &self,
        component_id: u64,
        component_type: ComponentType,
    ) -> Result<Vec<&N>, Error> {
        Ok(self
            .trace(component_id)?
            .into_iter()
            .filter(|n| n.component_type() == component_type)
            .collect())
    }

    /// Returns the traced components of the given category.
    pub fn trace_category(
        &self,
        component_id: u64,
        category: ComponentCategory,
    ) -> Result<Vec<&N>, Error> {
        Ok(self
            .trace(component_id)?
            .into_iter()
            .filter(|n| n.category() == category)
            .collect())
    }

    /// Returns true if the given component traces to any battery.
    pub fn is_connected_to_battery(&self, component_id: u64) -> Result<bool, Error> {
        Ok(self.trace(component_id)?.iter().any(|n| n.is_battery()))
    }

    /// Returns true if the given component traces to a battery, shore power,
    /// an alternator or a charger.
    pub fn is_connected_to_power_source(&self, component_id: u64) -> Result<bool, Error> {
        Ok(self
            .trace(component_id)?
            .iter()
            .any(|n| n.is_power_supply()))
    }

    /// Returns the first battery the given component traces to.
    pub fn first_connected_battery(&self, component_id: u64) -> Result<Option<&N>, Error> {
        Ok(self
            .trace(component_id)?
            .into_iter()
            .find(|n| n.is_battery()))
    }

    /// Like [`trace`][Self::trace], for ids that are known to exist.
    pub(crate) fn traced(&self, component_id: u64) -> Vec<&N> {
        self.trace(component_id).unwrap_or_default()
    }

    /// Returns the components reachable from the given component on the
    /// positive side without passing through a fuse or a breaker.
    ///
    /// Protection and ground components end this walk, and are returned along
    /// with the real components.
    pub(crate) fn traced_unprotected(&self, component_id: u64) -> Vec<&N> {
        let Ok(index) = self.index_of(component_id) else {
            return vec![];
        };
        self.trace_from(index, &|n: &N| {
            n.is_pass_through() && !n.is_protection() && !n.is_ground()
        })
    }

    /// Returns the number of wires attached to the given component.
    pub(crate) fn wire_count(&self, component_id: u64) -> usize {
        self.index_of(component_id)
            .map(|index| self.graph.neighbors(index).count())
            .unwrap_or(0)
    }
}
