// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the components of a boat's DC network, and the
//! wires between them.

mod creation;
mod retrieval;
mod traversal;

pub mod iterators;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::{Edge, Node, SimulationConfig};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

/// `Node`s stored in an `UnGraph` instance can be addressed with `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any `component_id`, so
/// that Nodes in the `UnGraph` can be retrieved from their `component_id`s.
pub(crate) type NodeIndexMap = HashMap<u64, NodeIndex>;

/// `Edge`s are not stored in the `UnGraph` instance, so we need to store them
/// separately.
///
/// `EdgeMap` can be used to lookup the `Edge` for any pair of source and
/// destination `NodeIndex` values, in the order they were connected in.
pub(crate) type EdgeMap<E> = HashMap<(NodeIndex, NodeIndex), E>;

/// A graph representation of the components of a boat's DC network and the
/// wires between them.
pub struct ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    graph: UnGraph<N, ()>,
    node_indices: NodeIndexMap,
    edges: EdgeMap<E>,
    config: SimulationConfig,
}

impl<N, E> ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    /// Returns the simulation config of the graph.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
