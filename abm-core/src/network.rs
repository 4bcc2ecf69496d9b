//! Household social network.
//!
//! An undirected graph whose vertex `i` is household `i`. Vertices are never added
//! or removed after construction; only edges move, one at a time, via [`SocialNetwork::rewire`].

use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use rand::Rng;

use crate::types::HouseholdId;

/// Pair draws a rewiring event may spend looking for an unconnected pair.
pub const MAX_PAIR_DRAWS: usize = 100;

/// Edges touched by one rewiring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewiring {
    pub removed: Option<(HouseholdId, HouseholdId)>,
    /// `None` only when no unconnected pair turned up within [`MAX_PAIR_DRAWS`] draws,
    /// which in practice means the graph is complete.
    pub added: Option<(HouseholdId, HouseholdId)>,
}

#[derive(Debug, Clone)]
pub struct SocialNetwork {
    graph: UnGraph<HouseholdId, ()>,
}

impl SocialNetwork {
    /// `n` isolated households.
    pub fn edgeless(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, 0);
        for i in 0..n {
            graph.add_node(HouseholdId::new(i as u32));
        }
        Self { graph }
    }

    /// Watts-Strogatz small world: ring lattice of degree `k` (rounded down to even),
    /// each lattice edge rewired to a uniform new endpoint with probability `beta`.
    ///
    /// Draws: one roll per lattice edge, plus endpoint picks for rolls that hit.
    pub fn small_world<R: Rng>(n: usize, k: usize, beta: f64, rng: &mut R) -> Self {
        let half_k = k / 2;
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(n * half_k);
        let mut present: HashSet<(usize, usize)> = HashSet::with_capacity(n * half_k);

        for i in 0..n {
            for j in 1..=half_k {
                let neighbor = (i + j) % n;
                let key = ordered(i, neighbor);
                if neighbor != i && present.insert(key) {
                    edges.push(key);
                }
            }
        }

        for slot in 0..edges.len() {
            let roll: f64 = rng.random();
            if roll >= beta {
                continue;
            }
            let (source, old_target) = edges[slot];
            for _ in 0..n {
                let target = rng.random_range(0..n);
                let key = ordered(source, target);
                if target != source && !present.contains(&key) {
                    present.remove(&ordered(source, old_target));
                    present.insert(key);
                    edges[slot] = key;
                    break;
                }
            }
        }

        let mut network = Self::edgeless(n);
        for (a, b) in edges {
            network
                .graph
                .add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        }
        network
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, id: HouseholdId) -> impl Iterator<Item = HouseholdId> + '_ {
        self.graph
            .neighbors(NodeIndex::new(id.index()))
            .map(|n| self.graph[n])
    }

    pub fn degree(&self, id: HouseholdId) -> usize {
        self.neighbors(id).count()
    }

    pub fn contains_edge(&self, a: HouseholdId, b: HouseholdId) -> bool {
        self.graph
            .contains_edge(NodeIndex::new(a.index()), NodeIndex::new(b.index()))
    }

    /// Add an edge unless it would be a self-loop or a duplicate. Returns whether it was added.
    pub fn connect(&mut self, a: HouseholdId, b: HouseholdId) -> bool {
        if a == b || self.contains_edge(a, b) {
            return false;
        }
        let n = self.vertex_count();
        if a.index() >= n || b.index() >= n {
            return false;
        }
        self.graph
            .add_edge(NodeIndex::new(a.index()), NodeIndex::new(b.index()), ());
        true
    }

    /// Mean of `adoption` over `id`'s neighbours; 0 for an isolated household.
    pub fn social_signal(&self, id: HouseholdId, adoption: &[f64]) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for neighbor in self.neighbors(id) {
            total += adoption.get(neighbor.index()).copied().unwrap_or(0.0);
            count += 1;
        }
        if count == 0 { 0.0 } else { total / count as f64 }
    }

    /// Signals for every household, read from one adoption snapshot.
    pub fn social_signals(&self, adoption: &[f64]) -> Vec<f64> {
        (0..self.vertex_count())
            .map(|i| self.social_signal(HouseholdId::new(i as u32), adoption))
            .collect()
    }

    /// With probability `probability`, drop one uniformly chosen edge and connect one
    /// uniformly chosen pair of distinct, unconnected households. The edge count is
    /// unchanged unless the graph is complete or empty.
    ///
    /// Draws: one trigger roll; if it fires, one edge pick (when any edge exists)
    /// followed by two vertex picks per candidate pair (when there are at least two
    /// households), redrawn until the pair is unconnected, at most [`MAX_PAIR_DRAWS`] times.
    pub fn rewire<R: Rng>(&mut self, probability: f64, rng: &mut R) -> Option<Rewiring> {
        let roll: f64 = rng.random();
        if roll >= probability {
            return None;
        }

        let removed = if self.edge_count() > 0 {
            let edge = EdgeIndex::new(rng.random_range(0..self.edge_count()));
            let endpoints = self
                .graph
                .edge_endpoints(edge)
                .map(|(a, b)| (self.graph[a], self.graph[b]));
            self.graph.remove_edge(edge);
            endpoints
        } else {
            None
        };

        let n = self.vertex_count();
        let mut added = None;
        if n >= 2 {
            for _ in 0..MAX_PAIR_DRAWS {
                let a = rng.random_range(0..n);
                let mut b = rng.random_range(0..n - 1);
                if b >= a {
                    b += 1;
                }
                let (a, b) = (HouseholdId::new(a as u32), HouseholdId::new(b as u32));
                if self.connect(a, b) {
                    added = Some((a, b));
                    break;
                }
            }
        }

        Some(Rewiring { removed, added })
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
