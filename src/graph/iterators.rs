// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over the components and wires of a `ComponentGraph`.

use petgraph::graph::UnGraph;

use super::EdgeMap;
use crate::{Edge, Node};

/// The components of a `ComponentGraph`, in the order they were added.
pub struct Components<'a, N>
where
    N: Node,
{
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<N>>,
}

impl<'a, N> Iterator for Components<'a, N>
where
    N: Node,
{
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<N> ExactSizeIterator for Components<'_, N> where N: Node {}

/// The wires of a `ComponentGraph`, in the order they were connected.
///
/// Parallel wires between the same two components were collapsed when the
/// graph was built, so only the first of them is yielded.
pub struct Connections<'a, E>
where
    E: Edge,
{
    pub(crate) edges: &'a EdgeMap<E>,
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Edge<()>>,
}

impl<'a, E> Iterator for Connections<'a, E>
where
    E: Edge,
{
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        let edges = self.edges;
        self.iter
            .by_ref()
            .find_map(|e| edges.get(&(e.source(), e.target())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

/// The components wired directly to a component, whatever their category.
pub struct Neighbors<'a, N>
where
    N: Node,
{
    pub(crate) graph: &'a UnGraph<N, ()>,
    pub(crate) iter: petgraph::graph::Neighbors<'a, ()>,
}

impl<'a, N> Iterator for Neighbors<'a, N>
where
    N: Node,
{
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::ComponentGraphBuilder;
    use crate::{Edge, Error, Node};

    #[test]
    fn test_iterators() -> Result<(), Error> {
        let mut builder = ComponentGraphBuilder::new();
        let battery = builder.battery();
        let fuse = builder.fuse(20.0);
        let light = builder.light();
        let radio = builder.radio();
        builder
            .chain(&[battery, fuse, light])
            .connect(light, fuse)
            .connect(fuse, radio);
        let graph = builder.build(None)?;

        let components = graph.components();
        assert_eq!(components.len(), 4);
        assert_eq!(
            components.map(|n| n.component_id()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        // The light to fuse wire duplicates the fuse to light one.
        assert_eq!(
            graph
                .connections()
                .map(|e| (e.source(), e.destination()))
                .collect::<Vec<_>>(),
            vec![(1, 2), (2, 3), (2, 4)]
        );

        let mut wired = graph
            .neighbors(fuse.component_id())?
            .map(|n| n.component_id())
            .collect::<Vec<_>>();
        wired.sort();
        assert_eq!(wired, vec![1, 3, 4]);

        Ok(())
    }
}
