//! Normalizes a backend definition payload into the ordered node list and
//! edge list the canvas works from.

use std::collections::HashSet;

use crate::model::{DefinitionDetail, ProcessDefinition, StateNode, StateType, Transition};

/// Sort rank of a state role. Governs default grid placement only.
pub fn role_rank(state_type: StateType) -> u8 {
    match state_type {
        StateType::Start => 0,
        StateType::Normal => 1,
        StateType::End => 2,
        StateType::Unknown => 10,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowGraph {
    pub definition: Option<ProcessDefinition>,
    pub nodes: Vec<StateNode>,
    pub edges: Vec<Transition>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, state_key: &str) -> Option<&StateNode> {
        self.nodes.iter().find(|node| node.state_key == state_key)
    }

    pub fn contains(&self, state_key: &str) -> bool {
        self.node(state_key).is_some()
    }

    pub fn index_of(&self, state_key: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.state_key == state_key)
    }

    pub fn state_keys(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.state_key.as_str()).collect()
    }

    pub fn edge(&self, index: usize) -> Option<&Transition> {
        self.edges.get(index)
    }
}

/// Builds a fresh graph from a definition detail. The result always replaces
/// the previous graph wholesale.
///
/// States are ordered by role (START, NORMAL, END, then unknown roles) and
/// then by `stateKey`. A repeated `stateKey` keeps its first occurrence.
/// Transitions pass through in server order.
pub fn normalize(detail: DefinitionDetail) -> WorkflowGraph {
    let DefinitionDetail {
        definition,
        states,
        transitions,
    } = detail;

    let mut seen = HashSet::new();
    let mut nodes: Vec<StateNode> = Vec::with_capacity(states.len());
    for state in states {
        if seen.insert(state.state_key.clone()) {
            nodes.push(state);
        } else {
            tracing::warn!(state_key = %state.state_key, "duplicate state key in definition, ignoring");
        }
    }
    nodes.sort_by(|a, b| {
        role_rank(a.state_type)
            .cmp(&role_rank(b.state_type))
            .then_with(|| a.state_key.cmp(&b.state_key))
    });

    WorkflowGraph {
        definition,
        nodes,
        edges: transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(key: &str, state_type: StateType) -> StateNode {
        StateNode::new(key, key, state_type)
    }

    #[test]
    fn orders_by_role_then_key() {
        let detail = DefinitionDetail {
            definition: None,
            states: vec![
                state("Z", StateType::Normal),
                state("A", StateType::Start),
                state("B", StateType::End),
            ],
            transitions: Vec::new(),
        };
        let graph = normalize(detail);
        assert_eq!(graph.state_keys(), vec!["A", "Z", "B"]);
    }

    #[test]
    fn unknown_roles_sort_last() {
        let detail = DefinitionDetail {
            definition: None,
            states: vec![
                state("PARKED", StateType::Unknown),
                state("CLOSED", StateType::End),
                state("AAA", StateType::Normal),
                state("NEW", StateType::Start),
            ],
            transitions: Vec::new(),
        };
        let graph = normalize(detail);
        assert_eq!(graph.state_keys(), vec!["NEW", "AAA", "CLOSED", "PARKED"]);
    }

    #[test]
    fn empty_payload_yields_empty_graph() {
        let graph = normalize(DefinitionDetail::default());
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let mut first = state("NEW", StateType::Start);
        first.name = "First".to_string();
        let mut second = state("NEW", StateType::Normal);
        second.name = "Second".to_string();
        let graph = normalize(DefinitionDetail {
            definition: None,
            states: vec![first, second],
            transitions: Vec::new(),
        });
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.node("NEW").map(|n| n.name.as_str()), Some("First"));
    }
}
