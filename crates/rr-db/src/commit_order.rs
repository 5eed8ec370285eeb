//! Insert ordering for pending entities
//!
//! An entity that references another pending entity through an owning
//! association has to be inserted after it, so the referenced row exists and
//! its generated identifier can be bound into the join column.

use crate::error::{DbError, DbResult};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rr_core::EntityKey;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Dependency graph of pending inserts
#[derive(Debug, Default)]
pub struct CommitOrder {
    graph: DiGraph<EntityKey, ()>,
    node_map: HashMap<EntityKey, NodeIndex>,
}

impl CommitOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. Entities added earlier are ordered first when no
    /// dependency says otherwise.
    pub fn add_entity(&mut self, key: EntityKey) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&key) {
            idx
        } else {
            let idx = self.graph.add_node(key);
            self.node_map.insert(key, idx);
            idx
        }
    }

    /// Record that `dependent` must be inserted after `dependency`
    pub fn add_dependency(&mut self, dependent: EntityKey, dependency: EntityKey) {
        if dependent == dependency {
            return;
        }
        let from = self.add_entity(dependency);
        let to = self.add_entity(dependent);
        // Edge goes from dependency to dependent
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Entities in insert order (dependencies first)
    pub fn order(&self) -> DbResult<Vec<EntityKey>> {
        if let Err(cycle) = toposort(&self.graph, None) {
            return Err(DbError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            });
        }

        // Kahn's algorithm, always taking the earliest-added ready node
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    self.graph.edges_directed(idx, Direction::Incoming).count(),
                )
            })
            .collect();
        let mut ready: BTreeSet<NodeIndex> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| idx)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(idx) = ready.pop_first() {
            order.push(self.graph[idx]);
            for edge in self.graph.edges(idx) {
                if let Some(deg) = in_degree.get_mut(&edge.target()) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(edge.target());
                    }
                }
            }
        }
        Ok(order)
    }

    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());
            if target == start || visited.contains(&target) {
                break;
            }
            visited.insert(target);
            current = target;
        }
        path.join(" -> ")
    }
}

#[cfg(test)]
#[path = "commit_order_test.rs"]
mod tests;
