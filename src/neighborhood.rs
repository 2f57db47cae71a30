/*!

A `NeighborhoodIndex` maps every location to the set of locations an individual standing there
can reach in one movement step: the location itself (staying put) followed by its neighbors in
ascending order.

The index is derived once per run from the [`LocationGraph`] and is read-only thereafter. It is
stored in compressed form: all neighborhoods are concatenated in a single vector, and an offsets
vector indexed by `LocationId` marks where each one starts. Looking up a neighborhood is two index
operations and yields a slice, so workers can share the index by reference without locking.

*/

use std::ops::Index;

use crate::error::ContagionError;
use crate::graph::{LocationGraph, LocationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodIndex {
    /// `offsets[i]..offsets[i + 1]` is the range of `members` holding location `i`'s neighborhood.
    offsets: Vec<usize>,
    members: Vec<LocationId>,
}

impl NeighborhoodIndex {
    /// Builds the neighborhood of every location in `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidGraph`] if the graph has no locations.
    pub fn build(graph: &LocationGraph) -> Result<Self, ContagionError> {
        if graph.is_empty() {
            return Err(ContagionError::invalid_graph("graph has no locations"));
        }

        let mut offsets = Vec::with_capacity(graph.location_count() + 1);
        let mut members = Vec::with_capacity(graph.location_count() + 2 * graph.edge_count());
        offsets.push(0);
        for location in graph.locations() {
            members.push(location);
            members.extend_from_slice(graph.neighbors(location));
            offsets.push(members.len());
        }

        Ok(NeighborhoodIndex { offsets, members })
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// The neighborhood of `location`, or `None` if the location is not in the index.
    #[must_use]
    pub fn get(&self, location: LocationId) -> Option<&[LocationId]> {
        let start = *self.offsets.get(location.index())?;
        let end = *self.offsets.get(location.index() + 1)?;
        Some(&self.members[start..end])
    }
}

impl Index<LocationId> for NeighborhoodIndex {
    type Output = [LocationId];

    /// # Panics
    ///
    /// Panics if `location` is not in the index.
    fn index(&self, location: LocationId) -> &Self::Output {
        self.get(location)
            .unwrap_or_else(|| panic!("location {location} is not in the neighborhood index"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LocationGraphBuilder;

    fn ids(ids: &[u32]) -> Vec<LocationId> {
        ids.iter().copied().map(LocationId).collect()
    }

    #[test]
    fn every_neighborhood_starts_with_itself() {
        let mut builder = LocationGraphBuilder::new();
        builder.add_edge(0, 1).unwrap().add_edge(1, 2).unwrap();
        let graph = builder.build().unwrap();

        let index = NeighborhoodIndex::build(&graph).unwrap();
        assert_eq!(index.location_count(), 3);
        assert_eq!(index[LocationId(0)], ids(&[0, 1])[..]);
        assert_eq!(index[LocationId(1)], ids(&[1, 0, 2])[..]);
        assert_eq!(index[LocationId(2)], ids(&[2, 1])[..]);
    }

    #[test]
    fn isolated_locations_contain_only_themselves() {
        let mut builder = LocationGraphBuilder::with_locations(4);
        builder.add_edge(0, 1).unwrap();
        let graph = builder.build().unwrap();

        let index = NeighborhoodIndex::build(&graph).unwrap();
        assert_eq!(index[LocationId(2)], ids(&[2])[..]);
        assert_eq!(index[LocationId(3)], ids(&[3])[..]);
    }

    #[test]
    fn unknown_location_is_absent() {
        let graph = LocationGraphBuilder::with_locations(1).build().unwrap();
        let index = NeighborhoodIndex::build(&graph).unwrap();
        assert!(index.get(LocationId(1)).is_none());
    }

    #[test]
    fn build_is_deterministic() {
        let mut builder = LocationGraphBuilder::new();
        for (a, b) in [(3, 1), (0, 3), (2, 3), (1, 2)] {
            builder.add_edge(a, b).unwrap();
        }
        let graph = builder.build().unwrap();
        assert_eq!(
            NeighborhoodIndex::build(&graph).unwrap(),
            NeighborhoodIndex::build(&graph).unwrap()
        );
        assert_eq!(
            NeighborhoodIndex::build(&graph).unwrap()[LocationId(3)],
            ids(&[3, 0, 1, 2])[..]
        );
    }
}
