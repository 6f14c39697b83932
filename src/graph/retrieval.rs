// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving components and connections from a [`ComponentGraph`].

use crate::iterators::{Components, Connections, Neighbors};
use crate::{ComponentGraph, Edge, Error, Node};

/// `Component` and `Connection` retrieval.
impl<N, E> ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    /// Returns the component with the given `component_id`, if it exists.
    pub fn component(&self, component_id: u64) -> Result<&N, Error> {
        self.node_indices
            .get(&component_id)
            .map(|i| &self.graph[*i])
            .ok_or_else(|| Error::unknown_component(component_id))
    }

    /// Returns an iterator over the components in the graph.
    pub fn components(&self) -> Components<N> {
        Components {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns an iterator over the connections in the graph.
    pub fn connections(&self) -> Connections<E> {
        Connections {
            edges: &self.edges,
            iter: self.graph.raw_edges().iter(),
        }
    }

    /// Returns an iterator over the components wired directly to the
    /// component with the given `component_id`.
    ///
    /// Returns an error if the given `component_id` does not exist.
    pub fn neighbors(&self, component_id: u64) -> Result<Neighbors<N>, Error> {
        self.node_indices
            .get(&component_id)
            .map(|&index| Neighbors {
                graph: &self.graph,
                iter: self.graph.neighbors(index),
            })
            .ok_or_else(|| Error::unknown_component(component_id))
    }
}
