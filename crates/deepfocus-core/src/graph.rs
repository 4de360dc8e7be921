//! Prerequisite skill graph over learning nodes.
//!
//! The graph is read-only for the lifetime of a session. All queries take
//! the caller's [`ProgressState`] explicitly; there is no ambient progress
//! state anywhere in this module.
//!
//! Acyclicity of the prerequisite relation is deliberately not validated:
//! a cycle simply leaves its members permanently locked.
//! [`SkillGraph::unreachable_nodes`] exists so the CLI can surface such
//! nodes, but nothing rejects them at load time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::progress::ProgressState;

/// A single unit of gated learning content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningNode {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-text category, e.g. "Physics".
    pub subject: String,
    /// Ordering hint within a subject, >= 1.
    pub level: u32,
    /// Ids of nodes that must be completed first. May be empty.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Opaque handle to the playable content (e.g. a YouTube video id).
    pub media_ref: String,
    /// Media length in seconds, > 0.
    pub duration_secs: u32,
}

/// Ordered collection of learning nodes, read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGraph {
    pub id: String,
    pub name: String,
    pub nodes: Vec<LearningNode>,
}

impl SkillGraph {
    pub fn new(id: impl Into<String>, name: impl Into<String>, nodes: Vec<LearningNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes,
        }
    }

    /// True iff every prerequisite of `node` has been completed.
    /// A node with no prerequisites is always unlocked.
    pub fn is_unlocked(&self, node: &LearningNode, progress: &ProgressState) -> bool {
        node.prerequisites
            .iter()
            .all(|id| progress.is_completed(id))
    }

    /// True iff `node` itself has been completed.
    pub fn is_completed(&self, node: &LearningNode, progress: &ProgressState) -> bool {
        progress.is_completed(&node.id)
    }

    pub fn get(&self, node_id: &str) -> Option<&LearningNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Nodes grouped by subject, each group sorted by level ascending.
    /// Subjects come out in alphabetical order.
    pub fn nodes_by_subject(&self) -> BTreeMap<String, Vec<&LearningNode>> {
        let mut map: BTreeMap<String, Vec<&LearningNode>> = BTreeMap::new();
        for node in &self.nodes {
            map.entry(node.subject.clone()).or_default().push(node);
        }
        for group in map.values_mut() {
            group.sort_by_key(|n| n.level);
        }
        map
    }

    /// Nodes that can never unlock: a prerequisite id is missing from the
    /// graph, or the node sits on a prerequisite cycle.
    pub fn unreachable_nodes(&self) -> Vec<&LearningNode> {
        let mut reachable: Vec<&str> = Vec::new();
        loop {
            let mut grew = false;
            for node in &self.nodes {
                if reachable.contains(&node.id.as_str()) {
                    continue;
                }
                let ready = node
                    .prerequisites
                    .iter()
                    .all(|p| reachable.contains(&p.as_str()));
                if ready {
                    reachable.push(&node.id);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        self.nodes
            .iter()
            .filter(|n| !reachable.contains(&n.id.as_str()))
            .collect()
    }

    /// The built-in catalog: three subject branches with linear
    /// prerequisite chains. Used by the CLI when no custom graph is given.
    pub fn default_catalog() -> Self {
        let node = |id: &str,
                    title: &str,
                    description: &str,
                    media_ref: &str,
                    level: u32,
                    subject: &str,
                    prerequisites: &[&str],
                    duration_secs: u32| LearningNode {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            subject: subject.into(),
            level,
            prerequisites: prerequisites.iter().map(|s| s.to_string()).collect(),
            media_ref: media_ref.into(),
            duration_secs,
        };
        Self::new(
            "st-master",
            "Deep Learning Nexus",
            vec![
                node(
                    "p1",
                    "The Map of Physics",
                    "A birds-eye view of the entire field of physics.",
                    "ZihywtixUhe",
                    1,
                    "Physics",
                    &[],
                    840,
                ),
                node(
                    "p2",
                    "Newtonian Mechanics",
                    "Laws of motion, gravity, and the clockwork universe.",
                    "kS57nASer60",
                    2,
                    "Physics",
                    &["p1"],
                    600,
                ),
                node(
                    "p4",
                    "Special Relativity",
                    "Einstein's revolution in space and time.",
                    "ev9zrt__lec",
                    3,
                    "Physics",
                    &["p2"],
                    900,
                ),
                node(
                    "n1",
                    "Neuroscience 101",
                    "Understanding the basic architecture of the human brain.",
                    "6qS83wD29PY",
                    1,
                    "Neuroscience",
                    &[],
                    720,
                ),
                node(
                    "n2",
                    "The Dopamine Circuit",
                    "How reward systems drive behavior and addiction.",
                    "X9S6XfC0-I8",
                    2,
                    "Neuroscience",
                    &["n1"],
                    600,
                ),
                node(
                    "phi1",
                    "Epistemology: How we Know",
                    "The study of knowledge and justified belief.",
                    "L45Q1_psDqk",
                    1,
                    "Philosophy",
                    &[],
                    540,
                ),
                node(
                    "phi2",
                    "The Existentialist Crisis",
                    "Exploring freedom, choice, and responsibility in a chaotic world.",
                    "YaDvRdLMkHs",
                    2,
                    "Philosophy",
                    &["phi1"],
                    660,
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_and_progress() -> (SkillGraph, ProgressState) {
        (SkillGraph::default_catalog(), ProgressState::default())
    }

    #[test]
    fn root_nodes_always_unlocked() {
        let (graph, progress) = graph_and_progress();
        let p1 = graph.get("p1").unwrap();
        assert!(p1.prerequisites.is_empty());
        assert!(graph.is_unlocked(p1, &progress));
    }

    #[test]
    fn locked_until_prerequisites_complete() {
        let (graph, mut progress) = graph_and_progress();
        let p2 = graph.get("p2").unwrap();
        assert!(!graph.is_unlocked(p2, &progress));

        progress.complete_node("p1", 100);
        assert!(graph.is_unlocked(p2, &progress));
    }

    #[test]
    fn missing_prerequisite_id_reads_as_not_completed() {
        let (graph, progress) = graph_and_progress();
        let mut orphan = graph.get("p2").unwrap().clone();
        orphan.prerequisites = vec!["no-such-node".into()];
        assert!(!graph.is_unlocked(&orphan, &progress));
    }

    #[test]
    fn nodes_by_subject_sorted_by_level() {
        let (graph, _) = graph_and_progress();
        let by_subject = graph.nodes_by_subject();
        let physics = &by_subject["Physics"];
        let levels: Vec<u32> = physics.iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(by_subject.len(), 3);
    }

    #[test]
    fn default_catalog_has_no_unreachable_nodes() {
        let (graph, _) = graph_and_progress();
        assert!(graph.unreachable_nodes().is_empty());
    }

    #[test]
    fn cycle_shows_up_as_unreachable() {
        let mut graph = SkillGraph::default_catalog();
        // p1 <-> p2 cycle locks the whole Physics branch.
        graph.nodes[0].prerequisites = vec!["p2".into()];
        let ids: Vec<&str> = graph.unreachable_nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p4"]);
    }
}
