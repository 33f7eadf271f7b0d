//! Generic A* search.
//!
//! Used both for tile pathfinding and for action planning over fact sets.
//! Open-set entries are ordered by `f = g + h`, then by insertion sequence, so
//! results are a pure function of the inputs. While searching, the node with
//! the lowest heuristic seen so far is remembered; when the search fails or
//! runs out of time, the path to that node is returned as a best effort.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// An outbound edge produced by the neighbour function.
#[derive(Debug, Clone)]
pub struct Edge<N, E> {
    pub to: N,
    pub label: E,
    pub cost: f32,
}

/// A path from the start node: each step is the edge label taken and the
/// node it leads to. The start node itself is not included.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath<N, E> {
    pub steps: Vec<(E, N)>,
    pub cost: f32,
}

impl<N, E> SearchPath<N, E> {
    fn empty() -> Self {
        Self {
            steps: Vec::new(),
            cost: 0.0,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.steps.iter().map(|(_, node)| node)
    }

    pub fn labels(&self) -> impl Iterator<Item = &E> {
        self.steps.iter().map(|(label, _)| label)
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<N, E> {
    /// Reached a node accepted by the goal test.
    Success(SearchPath<N, E>),
    /// Open set exhausted; best-effort path toward the closest node.
    NoPath(SearchPath<N, E>),
    /// Timeout elapsed; best-effort path toward the closest node so far.
    Timeout(SearchPath<N, E>),
}

impl<N, E> SearchOutcome<N, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success(_))
    }

    pub fn path(&self) -> &SearchPath<N, E> {
        match self {
            SearchOutcome::Success(p) | SearchOutcome::NoPath(p) | SearchOutcome::Timeout(p) => p,
        }
    }

    pub fn into_path(self) -> SearchPath<N, E> {
        match self {
            SearchOutcome::Success(p) | SearchOutcome::NoPath(p) | SearchOutcome::Timeout(p) => p,
        }
    }
}

struct Record<N, E> {
    node: N,
    g: f32,
    h: f32,
    parent: Option<(usize, E)>,
    closed: bool,
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    f: f32,
    seq: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smallest f (then oldest entry) is "greatest".
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Run A* from `start` until `is_end` accepts a node.
///
/// `neighbors` lists outbound edges of a node; `heuristic` estimates the
/// remaining cost. With a `timeout`, the search stops once that much wall
/// time has passed and reports [`SearchOutcome::Timeout`].
pub fn astar<N, E, FEnd, FNeighbors, FHeuristic>(
    start: N,
    is_end: FEnd,
    mut neighbors: FNeighbors,
    heuristic: FHeuristic,
    timeout: Option<Duration>,
) -> SearchOutcome<N, E>
where
    N: Clone + Eq + Hash,
    E: Clone,
    FEnd: Fn(&N) -> bool,
    FNeighbors: FnMut(&N) -> Vec<Edge<N, E>>,
    FHeuristic: Fn(&N) -> f32,
{
    if is_end(&start) {
        return SearchOutcome::Success(SearchPath::empty());
    }

    let started = Instant::now();
    let mut records: Vec<Record<N, E>> = Vec::new();
    let mut index_of: HashMap<N, usize> = HashMap::new();
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    let h_start = heuristic(&start);
    index_of.insert(start.clone(), 0);
    records.push(Record {
        node: start,
        g: 0.0,
        h: h_start,
        parent: None,
        closed: false,
    });
    open.push(OpenEntry {
        f: h_start,
        seq,
        index: 0,
    });
    let mut closest = 0usize;

    while let Some(entry) = open.pop() {
        let current = entry.index;
        if records[current].closed {
            continue;
        }
        if is_end(&records[current].node) {
            return SearchOutcome::Success(reconstruct(&records, current));
        }
        records[current].closed = true;

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                return SearchOutcome::Timeout(reconstruct(&records, closest));
            }
        }

        let current_g = records[current].g;
        let current_node = records[current].node.clone();
        for edge in neighbors(&current_node) {
            let tentative_g = current_g + edge.cost;
            let index = match index_of.entry(edge.to) {
                Entry::Occupied(slot) => {
                    let index = *slot.get();
                    let record = &mut records[index];
                    if record.closed || tentative_g >= record.g {
                        continue;
                    }
                    record.g = tentative_g;
                    record.parent = Some((current, edge.label));
                    index
                }
                Entry::Vacant(slot) => {
                    let index = records.len();
                    let h = heuristic(slot.key());
                    records.push(Record {
                        node: slot.key().clone(),
                        g: tentative_g,
                        h,
                        parent: Some((current, edge.label)),
                        closed: false,
                    });
                    slot.insert(index);
                    index
                }
            };

            let record = &records[index];
            let best = &records[closest];
            if record.h < best.h || (record.h == best.h && record.g < best.g) {
                closest = index;
            }
            seq += 1;
            open.push(OpenEntry {
                f: record.g + record.h,
                seq,
                index,
            });
        }
    }

    SearchOutcome::NoPath(reconstruct(&records, closest))
}

fn reconstruct<N: Clone, E: Clone>(records: &[Record<N, E>], end: usize) -> SearchPath<N, E> {
    let mut steps = Vec::new();
    let mut current = end;
    while let Some((parent, label)) = &records[current].parent {
        steps.push((label.clone(), records[current].node.clone()));
        current = *parent;
    }
    steps.reverse();
    SearchPath {
        steps,
        cost: records[end].g,
    }
}
