use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::StateType;

/// Colour hints accepted from the backend: hex, a named colour, or an
/// `rgb()`/`hsl()` functional form.
static COLOR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9A-Fa-f]{3,8}|[A-Za-z]{1,32}|(rgb|rgba|hsl|hsla)\([0-9.,%\s]+\))$").unwrap()
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub node_fill: String,
    pub node_text: String,
    pub node_border: String,
    pub start_fill: String,
    pub end_fill: String,
    pub selected_border: String,
    pub line_color: String,
    pub selected_line_color: String,
    pub edge_label_background: String,
    pub edge_label_text: String,
    pub preview_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            node_fill: "#ECECFF".to_string(),
            node_text: "#333333".to_string(),
            node_border: "#9370DB".to_string(),
            start_fill: "#DFF5E1".to_string(),
            end_fill: "#F6E0E0".to_string(),
            selected_border: "#FF8C00".to_string(),
            line_color: "#333333".to_string(),
            selected_line_color: "#FF8C00".to_string(),
            edge_label_background: "#E8E8E8".to_string(),
            edge_label_text: "#333333".to_string(),
            preview_color: "#9370DB".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            node_fill: "#F8FAFF".to_string(),
            node_text: "#1C2430".to_string(),
            node_border: "#C7D2E5".to_string(),
            start_fill: "#EAF7EE".to_string(),
            end_fill: "#FBEFEF".to_string(),
            selected_border: "#2F6FED".to_string(),
            line_color: "#7A8AA6".to_string(),
            selected_line_color: "#2F6FED".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            edge_label_text: "#1C2430".to_string(),
            preview_color: "#2F6FED".to_string(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "modern" => Some(Self::modern()),
            "classic" | "default" | "base" => Some(Self::classic()),
            _ => None,
        }
    }

    /// Fill for a node body. A well-formed colour hint from the backend wins;
    /// anything else falls back to the role fill.
    pub fn fill_for<'a>(&'a self, state_type: StateType, ui_color: Option<&'a str>) -> &'a str {
        if let Some(color) = ui_color.map(str::trim).filter(|c| COLOR_TOKEN.is_match(c)) {
            return color;
        }
        match state_type {
            StateType::Start => &self.start_fill,
            StateType::End => &self.end_fill,
            StateType::Normal | StateType::Unknown => &self.node_fill,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_color_hint_overrides_role_fill() {
        let theme = Theme::modern();
        assert_eq!(theme.fill_for(StateType::Start, None), theme.start_fill);
        assert_eq!(theme.fill_for(StateType::Start, Some("#123456")), "#123456");
        assert_eq!(theme.fill_for(StateType::End, Some("  ")), theme.end_fill);
        assert_eq!(theme.fill_for(StateType::Normal, Some("teal")), "teal");
        assert_eq!(
            theme.fill_for(StateType::Normal, Some("rgb(10, 20, 30)")),
            "rgb(10, 20, 30)"
        );
    }

    #[test]
    fn malformed_color_hint_falls_back_to_role_fill() {
        let theme = Theme::modern();
        assert_eq!(
            theme.fill_for(StateType::Normal, Some("red\" onload=\"alert(1)")),
            theme.node_fill
        );
        assert_eq!(
            theme.fill_for(StateType::End, Some("url(#x)")),
            theme.end_fill
        );
    }
}
