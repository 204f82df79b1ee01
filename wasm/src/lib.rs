use serde::Deserialize;
use wasm_bindgen::prelude::*;
use workflow_canvas::config::{CurveConfig, DesignerConfig};
use workflow_canvas::geometry;
use workflow_canvas::graph::normalize;
use workflow_canvas::interaction::{InteractionState, Selection};
use workflow_canvas::layout::decode_layout;
use workflow_canvas::model::DefinitionDetail;
use workflow_canvas::render::render_svg;
use workflow_canvas::scene::Scene;
use workflow_canvas::theme::Theme;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    selected_state: Option<String>,
}

fn build_config(options: &CanvasRenderOptions) -> DesignerConfig {
    let mut config = DesignerConfig::default();
    if options.theme.as_deref() == Some("classic") {
        config.theme = Theme::classic();
    }
    if let Some(font_family) = &options.font_family {
        config.theme.font_family = font_family.clone();
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(width) = options.width {
        config.canvas.viewport_width = width;
    }
    if let Some(height) = options.height {
        config.canvas.viewport_height = height;
    }
    config
}

fn render_detail(
    detail_json: &str,
    layout_json: Option<&str>,
    options: CanvasRenderOptions,
) -> Result<String, String> {
    let detail: DefinitionDetail =
        serde_json::from_str(detail_json).map_err(|error| error.to_string())?;
    let config = build_config(&options);
    let graph = normalize(detail);
    let positions = decode_layout(layout_json).into_positions();
    let selection = options
        .selected_state
        .filter(|key| graph.contains(key))
        .map_or(Selection::None, Selection::Node);
    let scene = Scene::build(
        &graph,
        Some(&positions),
        &InteractionState::Idle,
        &selection,
        &config,
    );
    Ok(render_svg(&scene, &config.theme))
}

/// Renders a definition detail (as returned by the backend) with an optional
/// cached layout blob. Positions missing from the layout fall on the grid.
#[wasm_bindgen]
pub fn render_workflow_svg(
    detail_json: &str,
    layout_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<CanvasRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        CanvasRenderOptions::default()
    };
    render_detail(detail_json, layout_json.as_deref(), options)
        .map_err(|error| JsValue::from_str(&error))
}

/// SVG path data for a transition curve between two anchors.
#[wasm_bindgen]
pub fn curve_path(x1: f32, y1: f32, x2: f32, y2: f32) -> String {
    geometry::curve_path(x1, y1, x2, y2, &CurveConfig::default()).to_svg_d()
}

#[cfg(test)]
mod tests {
    use crate::{CanvasRenderOptions, curve_path, render_detail};

    #[test]
    fn renders_detail_with_cached_layout() {
        let detail = r#"{
            "states": [
                {"stateKey": "DONE", "name": "Done", "stateType": "END"},
                {"stateKey": "NEW", "name": "New", "stateType": "START"}
            ],
            "transitions": [
                {"fromStateKey": "NEW", "toStateKey": "DONE", "eventKey": "finish", "name": "Finish"}
            ]
        }"#;
        let layout = r#"{"NEW": {"x": 300, "y": 200}}"#;
        let options = CanvasRenderOptions {
            selected_state: Some("NEW".to_string()),
            ..CanvasRenderOptions::default()
        };

        let svg = render_detail(detail, Some(layout), options).expect("detail should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Finish"));
        assert!(svg.contains("x=\"300.00\" y=\"200.00\""));
    }

    #[test]
    fn curve_path_bends_outward() {
        assert_eq!(curve_path(0.0, 0.0, 100.0, 0.0), "M 0.00 0.00 C 80.00 0.00, 20.00 0.00, 100.00 0.00");
    }
}
