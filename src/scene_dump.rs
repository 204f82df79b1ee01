use crate::scene::Scene;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub state_key: String,
    pub label: String,
    pub state_type: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub label: String,
    pub priority: u32,
    /// Start, both control points, end.
    pub points: Vec<[f32; 2]>,
    pub label_at: [f32; 2],
}

impl SceneDump {
    pub fn from_scene(scene: &Scene) -> Self {
        let nodes = scene
            .nodes
            .iter()
            .map(|node| NodeDump {
                state_key: node.state_key.clone(),
                label: node.label.clone(),
                state_type: format!("{:?}", node.state_type),
                x: node.rect.x,
                y: node.rect.y,
                width: node.rect.width,
                height: node.rect.height,
                selected: node.selected,
            })
            .collect();

        let edges = scene
            .edges
            .iter()
            .map(|edge| {
                let path = &edge.path;
                EdgeDump {
                    index: edge.index,
                    from: edge.from_state_key.clone(),
                    to: edge.to_state_key.clone(),
                    label: edge.label.clone(),
                    priority: edge.priority,
                    points: [path.start, path.control1, path.control2, path.end]
                        .iter()
                        .map(|p| [p.x, p.y])
                        .collect(),
                    label_at: [edge.label_anchor.x, edge.label_anchor.y],
                }
            })
            .collect();

        SceneDump {
            width: scene.width,
            height: scene.height,
            nodes,
            edges,
        }
    }
}

pub fn write_scene_dump(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = SceneDump::from_scene(scene);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesignerConfig;
    use crate::graph::WorkflowGraph;
    use crate::interaction::{InteractionState, Selection};
    use crate::model::{StateNode, StateType};

    #[test]
    fn dump_flattens_node_rects() {
        let graph = WorkflowGraph {
            definition: None,
            nodes: vec![StateNode::new("NEW", "New", StateType::Start)],
            edges: Vec::new(),
        };
        let config = DesignerConfig::default();
        let scene = Scene::build(&graph, None, &InteractionState::Idle, &Selection::None, &config);
        let dump = SceneDump::from_scene(&scene);
        assert_eq!(dump.nodes.len(), 1);
        assert_eq!(dump.nodes[0].x, 40.0);
        assert_eq!(dump.nodes[0].state_type, "Start");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        write_scene_dump(&path, &scene).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["nodes"][0]["state_key"], "NEW");
    }
}
