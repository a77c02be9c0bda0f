//! Dependency graph restricted to the closure of the requested goals.
//!
//! # Algorithm
//!
//! 1. Breadth-first walk from the goals. Every reachable name becomes a
//!    node, including prerequisites that have no rule (leaf inputs).
//! 2. Kahn's algorithm over explicit in-degree counters emits levels: each
//!    level holds the nodes whose prerequisites all sit in earlier levels.
//! 3. Nodes left over once no in-degree reaches zero cannot be ordered.
//!    Those still referenced by another leftover node form the cycle map;
//!    the rest are blocked behind a cycle.
//!
//! Within a level, nodes keep BFS discovery order. Rule lookups go through
//! [`Makefile::index`], so the whole pass is O(V+E).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::makefile::Makefile;

#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    /// Requested goals, de-duplicated on first occurrence.
    goals: Vec<String>,

    /// Dependency edges: target -> direct prerequisites.
    edges: HashMap<String, Vec<String>>,

    /// Reverse edges: target -> targets that depend on it.
    reverse_edges: HashMap<String, Vec<String>>,

    /// Discovery order (for stable levels).
    insertion_order: Vec<String>,

    levels: Vec<Vec<String>>,

    /// Targets that could not be ordered -> their unresolved prerequisites.
    cycles: HashMap<String, Vec<String>>,

    /// Unorderable targets not themselves on a cycle -> unresolved prerequisites.
    blocked: HashMap<String, Vec<String>>,
}

impl BuildGraph {
    /// Builds the graph for `goals` and sorts it into levels.
    pub fn new<S: AsRef<str>>(mf: &Makefile, goals: &[S]) -> Self {
        let mut graph = Self::default();

        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for goal in goals {
            let goal = goal.as_ref();
            if seen.insert(goal.to_string()) {
                graph.goals.push(goal.to_string());
                queue.push_back(goal.to_string());
            }
        }

        let rules = mf.index();
        while let Some(target) = queue.pop_front() {
            let mut prereqs: Vec<String> = Vec::new();
            if let Some(rule) = rules.get(target.as_str()) {
                let mut listed: HashSet<&str> = HashSet::with_capacity(rule.prereqs.len());
                for prereq in &rule.prereqs {
                    if !listed.insert(prereq.as_str()) {
                        continue;
                    }
                    prereqs.push(prereq.clone());
                    graph
                        .reverse_edges
                        .entry(prereq.clone())
                        .or_default()
                        .push(target.clone());
                    if seen.insert(prereq.clone()) {
                        queue.push_back(prereq.clone());
                    }
                }
            }
            graph.insertion_order.push(target.clone());
            graph.edges.insert(target, prereqs);
        }

        graph.topological_sort();
        graph
    }

    /// Kahn's algorithm, one level per pass.
    fn topological_sort(&mut self) {
        let order: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        // edges[A] = [B, C] means A waits on B and C, so A's in-degree is 2.
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(t, deps)| (t.as_str(), deps.len()))
            .collect();

        let mut current: Vec<&str> = self
            .insertion_order
            .iter()
            .map(String::as_str)
            .filter(|t| in_degree[t] == 0)
            .collect();

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut processed = 0;

        while !current.is_empty() {
            processed += current.len();
            let mut next: Vec<&str> = Vec::new();

            for target in &current {
                let Some(dependents) = self.reverse_edges.get(*target) else {
                    continue;
                };
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }

            levels.push(current.iter().map(|t| t.to_string()).collect());
            next.sort_by_key(|t| order[t]);
            current = next;
        }

        if processed != self.edges.len() {
            let remaining: HashSet<&str> = in_degree
                .iter()
                .filter(|(_, &d)| d > 0)
                .map(|(t, _)| *t)
                .collect();

            let unresolved = |target: &str| -> Vec<String> {
                self.edges[target]
                    .iter()
                    .filter(|d| remaining.contains(d.as_str()))
                    .cloned()
                    .collect()
            };

            let referenced: HashSet<String> = remaining
                .iter()
                .flat_map(|t| unresolved(*t))
                .collect();

            for target in &remaining {
                let deps = unresolved(*target);
                if referenced.contains(*target) {
                    self.cycles.insert(target.to_string(), deps);
                } else {
                    self.blocked.insert(target.to_string(), deps);
                }
            }
            tracing::debug!(
                cycles = self.cycles.len(),
                blocked = self.blocked.len(),
                "dependency graph has unorderable targets"
            );
        }

        self.levels = levels;
    }

    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    /// Level-ordered targets; every target appears in at most one level.
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn cycles(&self) -> &HashMap<String, Vec<String>> {
        &self.cycles
    }

    pub fn blocked(&self) -> &HashMap<String, Vec<String>> {
        &self.blocked
    }

    /// Direct prerequisites of `target`, empty if unknown.
    pub fn dependencies(&self, target: &str) -> &[String] {
        self.edges.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Targets that list `target` as a prerequisite.
    pub fn dependents(&self, target: &str) -> &[String] {
        self.reverse_edges
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, target: &str) -> bool {
        self.edges.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
