//! The static graph of locations that individuals occupy.
//!
//! A [`LocationGraph`] is an undirected graph whose vertices are [`LocationId`]s. It is assembled
//! with a [`LocationGraphBuilder`] (or loaded from an edge list, see [`loader`]) and is immutable
//! afterwards: the finished graph only exposes read accessors, so it can be shared by reference
//! with every worker for the duration of a run.
//!
//! Locations are dense indices `0..location_count()`. Like an adjacency list with vector vertex
//! storage, adding an edge that names a location beyond the current range grows the graph to
//! include it, and every location in between exists as an isolated vertex.

pub mod loader;

use std::fmt::{self, Display};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ContagionError;
use crate::hashing::{HashSet, HashSetExt};

/// Identifier of a location; a vertex of the [`LocationGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationId(pub u32);

impl LocationId {
    /// The location's position in per-location tables.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for LocationId {
    fn from(value: u32) -> Self {
        LocationId(value)
    }
}

impl Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable undirected graph of locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGraph {
    /// Sorted, deduplicated neighbors of every location, excluding the location itself.
    adjacency_lists: Vec<Vec<LocationId>>,
    edge_count: usize,
}

impl LocationGraph {
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.adjacency_lists.len()
    }

    /// The number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency_lists.is_empty()
    }

    /// Iterates over every location in ascending order.
    pub fn locations(&self) -> impl ExactSizeIterator<Item = LocationId> + '_ {
        (0..self.adjacency_lists.len()).map(|index| LocationId(index as u32))
    }

    /// The locations adjacent to `location`, in ascending order. Returns an empty slice for a
    /// location outside the graph.
    #[must_use]
    pub fn neighbors(&self, location: LocationId) -> &[LocationId] {
        self.adjacency_lists
            .get(location.index())
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn degree(&self, location: LocationId) -> usize {
        self.neighbors(location).len()
    }

    /// Iterates over every undirected edge once, as `(lower, higher)` pairs in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (LocationId, LocationId)> + '_ {
        self.locations().flat_map(move |location| {
            self.neighbors(location)
                .iter()
                .filter(move |&&neighbor| neighbor > location)
                .map(move |&neighbor| (location, neighbor))
        })
    }
}

/// Accumulates locations and edges for a [`LocationGraph`].
#[derive(Debug, Default)]
pub struct LocationGraphBuilder {
    location_count: u32,
    edges: HashSet<(LocationId, LocationId)>,
}

impl LocationGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a graph containing the locations `0..location_count` and no edges.
    #[must_use]
    pub fn with_locations(location_count: u32) -> Self {
        LocationGraphBuilder {
            location_count,
            edges: HashSet::new(),
        }
    }

    /// Adds a new isolated location and returns its id.
    pub fn add_location(&mut self) -> LocationId {
        let location = LocationId(self.location_count);
        self.location_count += 1;
        location
    }

    /// Adds an undirected edge between the locations with ids `a` and `b`, growing the graph to
    /// include both.
    ///
    /// Self-loops are accepted and ignored, as a location is always reachable from itself.
    /// Adding an edge that already exists (in either direction) has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidGraph`] if an endpoint is `u32::MAX`, which would make
    /// the location count overflow.
    pub fn add_edge(&mut self, a: u32, b: u32) -> Result<&mut Self, ContagionError> {
        let (a, b) = (LocationId(a), LocationId(b));
        let highest = a.max(b);
        let required = highest.0.checked_add(1).ok_or_else(|| {
            ContagionError::invalid_graph(format!("location id {highest} is out of range"))
        })?;
        self.location_count = self.location_count.max(required);

        if a != b {
            self.edges.insert((a.min(b), highest));
        }
        Ok(self)
    }

    /// Finalizes the graph.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidGraph`] if the graph has no locations.
    pub fn build(self) -> Result<LocationGraph, ContagionError> {
        if self.location_count == 0 {
            return Err(ContagionError::invalid_graph("graph has no locations"));
        }

        let mut adjacency_lists = vec![Vec::new(); self.location_count as usize];
        for &(a, b) in &self.edges {
            adjacency_lists[a.index()].push(b);
            adjacency_lists[b.index()].push(a);
        }
        for list in &mut adjacency_lists {
            list.sort_unstable();
        }

        debug!(
            "built location graph with {} locations and {} edges",
            adjacency_lists.len(),
            self.edges.len()
        );
        Ok(LocationGraph {
            adjacency_lists,
            edge_count: self.edges.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> LocationGraph {
        let mut builder = LocationGraphBuilder::new();
        builder.add_edge(0, 1).unwrap().add_edge(1, 2).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn empty_graph_is_invalid() {
        let result = LocationGraphBuilder::new().build();
        assert!(matches!(result, Err(ContagionError::InvalidGraph(_))));
    }

    #[test]
    fn edges_are_undirected() {
        let graph = path_graph();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(LocationId(1)), &[LocationId(0), LocationId(2)]);
        assert_eq!(graph.neighbors(LocationId(0)), &[LocationId(1)]);
        assert_eq!(graph.neighbors(LocationId(2)), &[LocationId(1)]);
    }

    #[test]
    fn duplicate_and_reversed_edges_collapse() {
        let mut builder = LocationGraphBuilder::new();
        builder
            .add_edge(0, 1)
            .unwrap()
            .add_edge(1, 0)
            .unwrap()
            .add_edge(0, 1)
            .unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree(LocationId(0)), 1);
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut builder = LocationGraphBuilder::new();
        builder.add_edge(2, 2).unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(LocationId(2)).is_empty());
    }

    #[test]
    fn edges_grow_the_graph_with_isolated_locations() {
        let mut builder = LocationGraphBuilder::with_locations(2);
        builder.add_edge(0, 5).unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.location_count(), 6);
        for isolated in 1..5 {
            assert!(graph.neighbors(LocationId(isolated)).is_empty());
        }
    }

    #[test]
    fn add_location_appends() {
        let mut builder = LocationGraphBuilder::with_locations(2);
        let added = builder.add_location();
        assert_eq!(added, LocationId(2));
        builder.add_edge(0, added.0).unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.neighbors(added), &[LocationId(0)]);
    }

    #[test]
    fn out_of_range_location_is_rejected() {
        let mut builder = LocationGraphBuilder::new();
        assert!(matches!(
            builder.add_edge(0, u32::MAX),
            Err(ContagionError::InvalidGraph(_))
        ));
    }

    #[test]
    fn edges_are_listed_once() {
        let graph = path_graph();
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(
            edges,
            vec![
                (LocationId(0), LocationId(1)),
                (LocationId(1), LocationId(2))
            ]
        );
    }

    #[test]
    fn unknown_location_has_no_neighbors() {
        let graph = path_graph();
        assert!(graph.neighbors(LocationId(99)).is_empty());
    }
}
