use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Canvas viewport and node box dimensions, in logical units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub min_margin: f32,
    /// Width of the output port strip along a node's right edge.
    pub port_width: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1200.0,
            viewport_height: 800.0,
            node_width: 180.0,
            node_height: 64.0,
            min_margin: 24.0,
            port_width: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: usize,
    pub origin_x: f32,
    pub origin_y: f32,
    pub column_spacing: f32,
    pub row_spacing: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            origin_x: 40.0,
            origin_y: 40.0,
            column_spacing: 240.0,
            row_spacing: 140.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveConfig {
    pub min_control_offset: f32,
    pub control_ratio: f32,
    pub label_clearance: f32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            min_control_offset: 80.0,
            control_ratio: 0.35,
            label_clearance: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub layout_dir: PathBuf,
    pub key_namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            layout_dir: PathBuf::from(".workflow-layouts"),
            key_namespace: "workflow-designer:layout:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DesignerConfig {
    pub canvas: CanvasConfig,
    pub grid: GridConfig,
    pub curve: CurveConfig,
    pub theme: Theme,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    min_margin: Option<f32>,
    port_width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GridConfigFile {
    columns: Option<usize>,
    origin_x: Option<f32>,
    origin_y: Option<f32>,
    column_spacing: Option<f32>,
    row_spacing: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CurveConfigFile {
    min_control_offset: Option<f32>,
    control_ratio: Option<f32>,
    label_clearance: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    node_fill: Option<String>,
    node_text: Option<String>,
    node_border: Option<String>,
    start_fill: Option<String>,
    end_fill: Option<String>,
    selected_border: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    preview_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    canvas: Option<CanvasConfigFile>,
    grid: Option<GridConfigFile>,
    curve: Option<CurveConfigFile>,
    backend_url: Option<String>,
    backend_timeout_secs: Option<u64>,
    layout_dir: Option<PathBuf>,
    layout_key_namespace: Option<String>,
}

/// Loads a designer config. The file is JSON5 (comments and trailing commas
/// allowed); every field is optional and merged over the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DesignerConfig> {
    let Some(path) = path else {
        return Ok(DesignerConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<DesignerConfig> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = DesignerConfig::default();

    if let Some(name) = parsed.theme.as_deref() {
        match Theme::from_name(name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = name, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            theme.font_size = v;
        }
        if let Some(v) = vars.background {
            theme.background = v;
        }
        if let Some(v) = vars.node_fill {
            theme.node_fill = v;
        }
        if let Some(v) = vars.node_text {
            theme.node_text = v;
        }
        if let Some(v) = vars.node_border {
            theme.node_border = v;
        }
        if let Some(v) = vars.start_fill {
            theme.start_fill = v;
        }
        if let Some(v) = vars.end_fill {
            theme.end_fill = v;
        }
        if let Some(v) = vars.selected_border {
            theme.selected_line_color = v.clone();
            theme.selected_border = v;
        }
        if let Some(v) = vars.line_color {
            theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            theme.edge_label_background = v;
        }
        if let Some(v) = vars.preview_color {
            theme.preview_color = v;
        }
    }

    if let Some(canvas) = parsed.canvas {
        let target = &mut config.canvas;
        if let Some(v) = canvas.viewport_width {
            target.viewport_width = v;
        }
        if let Some(v) = canvas.viewport_height {
            target.viewport_height = v;
        }
        if let Some(v) = canvas.node_width {
            target.node_width = v;
        }
        if let Some(v) = canvas.node_height {
            target.node_height = v;
        }
        if let Some(v) = canvas.min_margin {
            target.min_margin = v;
        }
        if let Some(v) = canvas.port_width {
            target.port_width = v;
        }
    }

    if let Some(grid) = parsed.grid {
        let target = &mut config.grid;
        if let Some(v) = grid.columns {
            target.columns = v.max(1);
        }
        if let Some(v) = grid.origin_x {
            target.origin_x = v;
        }
        if let Some(v) = grid.origin_y {
            target.origin_y = v;
        }
        if let Some(v) = grid.column_spacing {
            target.column_spacing = v;
        }
        if let Some(v) = grid.row_spacing {
            target.row_spacing = v;
        }
    }

    if let Some(curve) = parsed.curve {
        let target = &mut config.curve;
        if let Some(v) = curve.min_control_offset {
            target.min_control_offset = v;
        }
        if let Some(v) = curve.control_ratio {
            target.control_ratio = v;
        }
        if let Some(v) = curve.label_clearance {
            target.label_clearance = v;
        }
    }

    if let Some(url) = parsed.backend_url {
        config.backend.base_url = url;
    }
    if let Some(secs) = parsed.backend_timeout_secs {
        config.backend.timeout_secs = secs;
    }
    if let Some(dir) = parsed.layout_dir {
        config.storage.layout_dir = dir;
    }
    if let Some(namespace) = parsed.layout_key_namespace {
        config.storage.key_namespace = namespace;
    }

    Ok(config)
}
