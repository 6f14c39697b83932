// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`ComponentGraph`] instances from given components and
//! connections.

use petgraph::graph::UnGraph;

use crate::{Edge, Error, Node, SimulationConfig};

use super::{ComponentGraph, EdgeMap, NodeIndexMap};

/// `ComponentGraph` instantiation.
impl<N, E> ComponentGraph<N, E>
where
    N: Node,
    E: Edge,
{
    /// Creates a new [`ComponentGraph`] from the given components and connections.
    ///
    /// Returns an error if the graph is invalid.
    pub fn try_new<NodeIterator: IntoIterator<Item = N>, EdgeIterator: IntoIterator<Item = E>>(
        components: NodeIterator,
        connections: EdgeIterator,
        config: SimulationConfig,
    ) -> Result<Self, Error> {
        let (graph, indices) = Self::create_graph(components)?;

        let mut cg = Self {
            graph,
            node_indices: indices,
            edges: EdgeMap::new(),
            config,
        };
        cg.add_connections(connections)?;

        tracing::debug!(
            "Created component graph with {} components and {} connections.",
            cg.graph.node_count(),
            cg.graph.edge_count()
        );

        Ok(cg)
    }

    fn create_graph(
        components: impl IntoIterator<Item = N>,
    ) -> Result<(UnGraph<N, ()>, NodeIndexMap), Error> {
        let mut graph = UnGraph::new_undirected();
        let mut indices = NodeIndexMap::new();

        for component in components {
            let cid = component.component_id();

            if indices.contains_key(&cid) {
                return Err(Error::duplicate_component(cid));
            }

            let idx = graph.add_node(component);
            indices.insert(cid, idx);
        }

        Ok((graph, indices))
    }

    fn add_connections(&mut self, connections: impl IntoIterator<Item = E>) -> Result<(), Error> {
        for connection in connections {
            let sid = connection.source();
            let did = connection.destination();

            if sid == did {
                return Err(Error::self_connection(sid));
            }
            for cid in [sid, did] {
                if !self.node_indices.contains_key(&cid) {
                    return Err(Error::dangling_connection(sid, did, cid));
                }
            }

            let source_idx = self.node_indices[&sid];
            let dest_idx = self.node_indices[&did];

            // Parallel wires between the same two components are one
            // electrical connection.
            if self.graph.find_edge(source_idx, dest_idx).is_some() {
                continue;
            }
            self.edges.insert((source_idx, dest_idx), connection);
            self.graph.add_edge(source_idx, dest_idx, ());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentType, Connection};

    fn nodes_and_edges() -> (Vec<Component>, Vec<Connection>) {
        let components = vec![
            Component::new(1, ComponentType::HouseBattery, "House"),
            Component::new(2, ComponentType::Fuse, "Main fuse"),
            Component::new(3, ComponentType::BusBar, "Positive bus"),
            Component::new(4, ComponentType::Light, "Cabin light"),
            Component::new(5, ComponentType::GroundBus, "Negative bus"),
        ];
        let connections = vec![
            Connection::new(1, 2),
            Connection::new(2, 3),
            Connection::new(3, 4),
            Connection::new(4, 5),
            Connection::new(5, 1),
        ];

        (components, connections)
    }

    #[test]
    fn test_component_validation() {
        let config = SimulationConfig::default();
        let (mut components, connections) = nodes_and_edges();

        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_ok()
        );

        components.push(Component::new(3, ComponentType::Switch, "Duplicate"));
        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_err_and(|e| e == Error::duplicate_component(3))
        );

        components.pop();
        components.push(Component::new(6, ComponentType::Radio, "VHF"));
        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_ok(),
            "unconnected components are reported by diagnostics, not rejected"
        );
    }

    #[test]
    fn test_connection_validation() {
        let config = SimulationConfig::default();
        let (components, mut connections) = nodes_and_edges();

        connections.push(Connection::new(2, 2));
        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_err_and(|e| e == Error::self_connection(2))
        );

        connections.pop();
        connections.push(Connection::new(2, 9));
        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_err_and(|e| e == Error::dangling_connection(2, 9, 9))
        );

        connections.pop();
        assert!(
            ComponentGraph::try_new(components.clone(), connections.clone(), config.clone())
                .is_ok()
        );
    }

    #[test]
    fn test_parallel_wires_collapse() -> Result<(), Error> {
        let (components, mut connections) = nodes_and_edges();
        connections.push(Connection::new(2, 1));
        connections.push(Connection::new(1, 2));

        let graph = ComponentGraph::try_new(components, connections, SimulationConfig::default())?;
        assert_eq!(graph.connections().count(), 5);
        assert_eq!(graph.neighbors(1)?.count(), 2);

        Ok(())
    }
}
