use crate::scene::{Scene, SceneEdge, SceneNode};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const NODE_CORNER_RADIUS: f32 = 10.0;
const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 4.0;
/// Rough average glyph width as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.56;

pub fn render_svg(scene: &Scene, theme: &Theme) -> String {
    let mut svg = String::new();
    let width = scene.width.max(200.0);
    let height = scene.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str(&format!(
        "<marker id=\"arrow-selected\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.selected_line_color
    ));
    svg.push_str("</defs>");

    for edge in &scene.edges {
        svg.push_str(&edge_svg(edge, theme));
    }

    if let Some(preview) = &scene.preview {
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" stroke-dasharray=\"6 4\"/>",
            preview.to_svg_d(),
            theme.preview_color
        ));
    }

    for node in &scene.nodes {
        svg.push_str(&node_svg(node, theme));
    }

    svg.push_str("</svg>");
    svg
}

fn edge_svg(edge: &SceneEdge, theme: &Theme) -> String {
    let (stroke, marker) = if edge.selected {
        (theme.selected_line_color.as_str(), "arrow-selected")
    } else {
        (theme.line_color.as_str(), "arrow")
    };
    let mut out = format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#{})\"/>",
        edge.path.to_svg_d(),
        stroke,
        marker
    );
    if edge.label.is_empty() {
        return out;
    }

    let (x, y) = (edge.label_anchor.x, edge.label_anchor.y);
    let text_width = estimate_text_width(&edge.label, theme.font_size);
    let rect_w = text_width + LABEL_PAD_X * 2.0;
    let rect_h = theme.font_size + LABEL_PAD_Y * 2.0;
    let rect_x = x - rect_w / 2.0;
    let rect_y = y - rect_h / 2.0;
    out.push_str(&format!(
        "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{rect_w:.2}\" height=\"{rect_h:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
        theme.edge_label_background,
        stroke
    ));
    out.push_str(&text_svg(x, y, &edge.label, theme, &theme.edge_label_text));
    out
}

fn node_svg(node: &SceneNode, theme: &Theme) -> String {
    let rect = node.rect;
    let fill = theme.fill_for(node.state_type, node.ui_color.as_deref());
    let (stroke, stroke_width) = if node.selected {
        (theme.selected_border.as_str(), 2.4)
    } else {
        (theme.node_border.as_str(), 1.4)
    };
    let mut out = format!(
        "<g data-state-key=\"{}\"{}>",
        escape_xml(&node.state_key),
        if node.dragging { " opacity=\"0.85\"" } else { "" }
    );
    out.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{NODE_CORNER_RADIUS}\" ry=\"{NODE_CORNER_RADIUS}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        escape_xml(fill),
        stroke,
        stroke_width
    ));

    let center_x = rect.x + rect.width / 2.0;
    let center_y = rect.y + rect.height / 2.0;
    match node.external_status.as_deref() {
        Some(status) if !status.trim().is_empty() => {
            out.push_str(&text_svg(
                center_x,
                center_y - theme.font_size * 0.45,
                &node.label,
                theme,
                &theme.node_text,
            ));
            out.push_str(&format!(
                "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{}\" opacity=\"0.7\">{}</text>",
                center_y + theme.font_size * 0.75,
                theme.font_family,
                theme.font_size * 0.8,
                theme.node_text,
                escape_xml(status)
            ));
        }
        _ => out.push_str(&text_svg(center_x, center_y, &node.label, theme, &theme.node_text)),
    }

    // Output port.
    let anchor = rect.source_anchor();
    out.push_str(&format!(
        "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        anchor.x, anchor.y, theme.background, stroke
    ));
    out.push_str("</g>");
    out
}

fn text_svg(x: f32, y: f32, text: &str, theme: &Theme, fill: &str) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        fill,
        escape_xml(text)
    )
}

fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, width: f32, height: f32) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.default_size = usvg::Size::from_wh(width, height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid output size {width}x{height}"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
