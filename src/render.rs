use crate::config::RenderConfig;
use crate::layout::geometry::Point;
use crate::theme::Theme;
use crate::tree::NodeId;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Static facts about a node handed to the binding when its circle is created.
#[derive(Debug, Clone, Copy)]
pub struct ShapeInfo<'a> {
    pub label: &'a str,
    pub full_name: &'a str,
    pub depth: usize,
    pub folded: bool,
}

/// Drawing primitives driven by the layout engine. Calls flow one way: the
/// engine never reads anything back from a binding.
pub trait RenderBinding {
    fn create_circle(&mut self, id: NodeId, info: &ShapeInfo<'_>, center: Point, r: f64);
    fn update_circle_position(&mut self, id: NodeId, center: Point, suppress_animation: bool);
    fn update_circle_radius(&mut self, id: NodeId, r: f64, folded: bool);
    /// Marks the circle of `id` as a drag source. Pointer moves on it are
    /// expected to come back through `Session::drag`.
    fn bind_drag_handler(&mut self, id: NodeId);
    fn create_text(&mut self, id: NodeId, label: &str);
    fn position_text(&mut self, id: NodeId, at: Point, suppress_animation: bool);
    fn set_visible(&mut self, id: NodeId, visible: bool);
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneShape {
    pub label: String,
    pub full_name: String,
    pub depth: usize,
    pub folded: bool,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub text_x: f64,
    pub text_y: f64,
    pub visible: bool,
    pub draggable: bool,
}

/// Binding that keeps the drawn state in memory, for SVG output and tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneBinding {
    pub shapes: BTreeMap<NodeId, SceneShape>,
    /// Position updates that asked for an animated transition.
    pub animated_moves: usize,
    pub immediate_moves: usize,
}

impl SceneBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self, id: NodeId) -> Option<&SceneShape> {
        self.shapes.get(&id)
    }

    fn record_move(&mut self, suppress_animation: bool) {
        if suppress_animation {
            self.immediate_moves += 1;
        } else {
            self.animated_moves += 1;
        }
    }
}

impl RenderBinding for SceneBinding {
    fn create_circle(&mut self, id: NodeId, info: &ShapeInfo<'_>, center: Point, r: f64) {
        let shape = self.shapes.entry(id).or_default();
        shape.label = info.label.to_string();
        shape.full_name = info.full_name.to_string();
        shape.depth = info.depth;
        shape.folded = info.folded;
        shape.x = center.x;
        shape.y = center.y;
        shape.r = r;
        shape.visible = true;
    }

    fn update_circle_position(&mut self, id: NodeId, center: Point, suppress_animation: bool) {
        self.record_move(suppress_animation);
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.x = center.x;
            shape.y = center.y;
        }
    }

    fn update_circle_radius(&mut self, id: NodeId, r: f64, folded: bool) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.r = r;
            shape.folded = folded;
        }
    }

    fn bind_drag_handler(&mut self, id: NodeId) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.draggable = true;
        }
    }

    fn create_text(&mut self, id: NodeId, label: &str) {
        self.shapes.entry(id).or_default().label = label.to_string();
    }

    fn position_text(&mut self, id: NodeId, at: Point, _suppress_animation: bool) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.text_x = at.x;
            shape.text_y = at.y;
        }
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(shape) = self.shapes.get_mut(&id) {
            shape.visible = visible;
        }
    }
}

pub fn render_svg(scene: &SceneBinding, theme: &Theme, config: &RenderConfig) -> String {
    let mut shapes: Vec<(&NodeId, &SceneShape)> =
        scene.shapes.iter().filter(|(_, s)| s.visible).collect();
    // Parents first so children are painted on top.
    shapes.sort_by_key(|(id, shape)| (shape.depth, **id));

    let margin = f64::from(config.margin.max(0.0));
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    if let Some((_, first)) = shapes.first() {
        min_x = first.x - first.r;
        min_y = first.y - first.r;
        max_x = first.x + first.r;
        max_y = first.y + first.r;
    }
    for (_, shape) in &shapes {
        min_x = min_x.min(shape.x - shape.r);
        min_y = min_y.min(shape.y - shape.r);
        max_x = max_x.max(shape.x + shape.r);
        max_y = max_y.max(shape.y + shape.r);
    }
    let view_x = min_x - margin;
    let view_y = min_y - margin;
    let view_w = (max_x - min_x + margin * 2.0).max(1.0);
    let view_h = (max_y - min_y + margin * 2.0).max(1.0);
    let width = f64::from(config.width).min(view_w.max(200.0));
    let height = width * view_h / view_w;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"{view_x:.2} {view_y:.2} {view_w:.2} {view_h:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{view_x:.2}\" y=\"{view_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));

    for (id, shape) in &shapes {
        let fill = if shape.folded {
            theme.folded_fill.as_str()
        } else {
            theme.fill_for_depth(shape.depth)
        };
        let drag = if shape.draggable {
            " data-draggable=\"true\""
        } else {
            ""
        };
        svg.push_str(&format!(
            "<circle data-node=\"{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"{drag}/>",
            id.index(),
            shape.x,
            shape.y,
            shape.r,
            fill,
            theme.stroke_color,
            theme.stroke_width
        ));
    }
    for (_, shape) in &shapes {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"><title>{}</title>{}</text>",
            shape.text_x,
            shape.text_y,
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.text_color,
            escape_xml(&shape.full_name),
            escape_xml(&shape.label)
        ));
    }

    svg.push_str("</svg>");
    svg
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
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Arial".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
