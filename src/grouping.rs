use crate::data::{Groups, RosterRow, StudentId};
use itertools::Itertools;
use log::{debug, info, trace};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Undirected graph over roster positions; an edge joins two students
/// sitting exams in the same (date, time) slot.
#[derive(Debug, Clone)]
pub struct ConflictGraph {
    ids: Vec<StudentId>,
    adjacency: Vec<BTreeSet<usize>>,
}

impl ConflictGraph {
    pub fn from_roster(roster: &[RosterRow]) -> Self {
        let ids: Vec<StudentId> = roster.iter().map(|r| r.student_id.clone()).collect();
        let mut adjacency = vec![BTreeSet::new(); roster.len()];

        // only students inside one slot bucket can conflict
        let buckets = roster
            .iter()
            .enumerate()
            .map(|(i, row)| (row.slot(), i))
            .into_group_map();

        for members in buckets.values() {
            for (&a, &b) in members.iter().tuple_combinations() {
                adjacency[a].insert(b);
                adjacency[b].insert(a);
            }
        }

        let graph = Self { ids, adjacency };
        debug!(
            "Conflict graph built: {} students, {} conflicts",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[node].iter().copied()
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }
}

/// Saturation-degree greedy coloring. Returns the color of every node.
///
/// The next node is the uncolored one with the most distinct neighbor
/// colors, then the highest degree, then the smallest id. With nothing
/// colored yet this picks the max-degree node, so the first pick needs no
/// special case.
pub fn dsatur(graph: &ConflictGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut colors: Vec<Option<usize>> = vec![None; n];
    let mut saturation: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

    for _ in 0..n {
        let Some(next) = (0..n)
            .filter(|&v| colors[v].is_none())
            .max_by_key(|&v| (saturation[v].len(), graph.degree(v), Reverse(graph.id(v))))
        else {
            break;
        };

        let color = (0..)
            .find(|c| !saturation[next].contains(c))
            .unwrap_or_default();
        colors[next] = Some(color);
        trace!("Colored {} with {}", graph.id(next), color);

        for nbr in graph.neighbors(next) {
            if colors[nbr].is_none() {
                saturation[nbr].insert(color);
            }
        }
    }

    colors.into_iter().map(Option::unwrap_or_default).collect()
}

/// Partitions the roster into conflict-free groups keyed by color index.
/// Members keep roster order.
pub fn group(roster: &[RosterRow]) -> Groups {
    let graph = ConflictGraph::from_roster(roster);
    if graph.node_count() == 0 {
        return Groups::new();
    }

    let colors = dsatur(&graph);
    let mut groups = Groups::new();
    for (node, color) in colors.into_iter().enumerate() {
        groups
            .entry(color)
            .or_default()
            .push(graph.id(node).to_string());
    }

    info!(
        "Grouped {} students into {} conflict-free groups",
        graph.node_count(),
        groups.len()
    );
    groups
}
