use serde::Serialize;

use crate::config::DesignerConfig;
use crate::geometry::{CurvePath, NodeRect, Point, edge_path, label_anchor, preview_path};
use crate::graph::WorkflowGraph;
use crate::interaction::{InteractionState, Selection};
use crate::layout::{PositionMap, grid_position};
use crate::model::StateType;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub state_key: String,
    pub label: String,
    pub state_type: StateType,
    pub external_status: Option<String>,
    pub ui_color: Option<String>,
    pub rect: NodeRect,
    pub selected: bool,
    pub dragging: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    /// Index into the graph's edge list.
    pub index: usize,
    pub from_state_key: String,
    pub to_state_key: String,
    pub label: String,
    pub priority: u32,
    pub path: CurvePath,
    pub label_anchor: Point,
    pub selected: bool,
}

/// Everything a render surface needs for one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub preview: Option<CurvePath>,
}

impl Scene {
    pub fn build(
        graph: &WorkflowGraph,
        positions: Option<&PositionMap>,
        interaction: &InteractionState,
        selection: &Selection,
        config: &DesignerConfig,
    ) -> Self {
        let canvas = &config.canvas;
        let rect_of = |index: usize, state_key: &str| {
            let origin = positions
                .and_then(|map| map.get(state_key))
                .copied()
                .filter(|point| point.is_finite())
                .unwrap_or_else(|| grid_position(index, &config.grid));
            NodeRect::at(origin, canvas)
        };

        let dragging_key = match interaction {
            InteractionState::Dragging { state_key, .. } => Some(state_key.as_str()),
            _ => None,
        };

        let nodes: Vec<SceneNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| SceneNode {
                state_key: node.state_key.clone(),
                label: node.display_name().to_string(),
                state_type: node.state_type,
                external_status: node.external_status.clone(),
                ui_color: node.ui_color.clone(),
                rect: rect_of(index, &node.state_key),
                selected: selection.node() == Some(node.state_key.as_str()),
                dragging: dragging_key == Some(node.state_key.as_str()),
            })
            .collect();

        let find = |state_key: &str| nodes.iter().find(|node| node.state_key == state_key);

        let mut edges = Vec::with_capacity(graph.edges.len());
        for (index, edge) in graph.edges.iter().enumerate() {
            let (Some(from), Some(to)) = (find(&edge.from_state_key), find(&edge.to_state_key))
            else {
                tracing::warn!(
                    from = %edge.from_state_key,
                    to = %edge.to_state_key,
                    "transition references a missing state, not drawn"
                );
                continue;
            };
            let path = edge_path(&from.rect, &to.rect, &config.curve);
            edges.push(SceneEdge {
                index,
                from_state_key: edge.from_state_key.clone(),
                to_state_key: edge.to_state_key.clone(),
                label: edge.display_label().to_string(),
                priority: edge.priority,
                label_anchor: label_anchor(path.start, path.end, config.curve.label_clearance),
                path,
                selected: selection.edge() == Some(index),
            });
        }

        let preview = match interaction {
            InteractionState::Connecting {
                from_state_key,
                current_point,
            } => find(from_state_key).map(|from| preview_path(&from.rect, *current_point, &config.curve)),
            _ => None,
        };

        Scene {
            width: canvas.viewport_width,
            height: canvas.viewport_height,
            nodes,
            edges,
            preview,
        }
    }

    pub fn node(&self, state_key: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.state_key == state_key)
    }

    /// Topmost node whose body contains `point`. Nodes are painted in list
    /// order, so the last hit wins.
    pub fn node_at(&self, point: Point) -> Option<&SceneNode> {
        self.nodes.iter().rev().find(|node| node.rect.contains(point))
    }

    /// Topmost node whose output port contains `point`.
    pub fn port_at(&self, point: Point, port_width: f32) -> Option<&SceneNode> {
        self.nodes
            .iter()
            .rev()
            .find(|node| node.rect.port_contains(point, port_width))
    }
}
