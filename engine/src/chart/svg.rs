//! Typed SVG primitives, accumulated per layer and serialized once.

use super::geometry::Point;
use shared::utils::format_trimmed;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub dash: Option<&'static str>,
    pub opacity: Option<f64>,
}

impl Stroke {
    pub fn solid(color: impl Into<String>, width: f64) -> Self {
        Self { color: color.into(), width, dash: None, opacity: None }
    }

    pub fn dashed(color: impl Into<String>, width: f64, dash: &'static str) -> Self {
        Self { color: color.into(), width, dash: Some(dash), opacity: None }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub color: String,
    pub opacity: Option<f64>,
}

impl Fill {
    pub fn solid(color: impl Into<String>) -> Self {
        Self { color: color.into(), opacity: None }
    }

    pub fn translucent(color: impl Into<String>, opacity: f64) -> Self {
        Self { color: color.into(), opacity: Some(opacity) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        class: Option<&'static str>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Fill,
        stroke: Option<Stroke>,
    },
    Line {
        class: Option<&'static str>,
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polyline {
        class: Option<&'static str>,
        points: Vec<Point>,
        stroke: Stroke,
    },
    Polygon {
        class: Option<&'static str>,
        points: Vec<Point>,
        fill: Fill,
    },
    Circle {
        class: Option<&'static str>,
        center: Point,
        radius: f64,
        fill: Fill,
    },
    Text {
        class: Option<&'static str>,
        at: Point,
        content: String,
        anchor: TextAnchor,
        size: f64,
        color: String,
    },
}

/// A named group of shapes. Data layers count toward the artifact's layer
/// count; chrome (grid, axes, legend) does not.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub is_data: bool,
    pub shapes: Vec<Shape>,
}

impl Layer {
    pub fn data(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_data: true, shapes: Vec::new() }
    }

    pub fn chrome(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_data: false, shapes: Vec::new() }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub precision: u8,
    layers: Vec<Layer>,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64, background: impl Into<String>, precision: u8) -> Self {
        Self {
            width,
            height,
            background: background.into(),
            precision: precision.min(3),
            layers: Vec::new(),
        }
    }

    /// Adds a layer; empty layers are dropped.
    pub fn add_layer(&mut self, layer: Layer) {
        if !layer.is_empty() {
            self.layers.push(layer);
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn data_layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.is_data).count()
    }

    pub fn to_markup(&self) -> String {
        let p = self.precision as usize;
        let mut out = String::with_capacity(4096);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(self.width, 0),
            h = num(self.height, 0)
        );
        let _ = writeln!(
            out,
            r#"  <rect class="background" x="0" y="0" width="100%" height="100%" fill="{}"/>"#,
            escape(&self.background)
        );
        for layer in &self.layers {
            let _ = writeln!(out, r#"  <g id="{}">"#, escape(&layer.name));
            for shape in &layer.shapes {
                out.push_str("    ");
                write_shape(&mut out, shape, p);
                out.push('\n');
            }
            out.push_str("  </g>\n");
        }
        out.push_str("</svg>\n");
        out
    }
}

fn num(value: f64, decimals: usize) -> String {
    format_trimmed(value, decimals)
}

fn class_attr(class: &Option<&'static str>) -> String {
    class.map(|c| format!(r#" class="{}""#, c)).unwrap_or_default()
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let mut attrs = format!(
        r#" stroke="{}" stroke-width="{}""#,
        escape(&stroke.color),
        num(stroke.width, 2)
    );
    if let Some(dash) = stroke.dash {
        let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash);
    }
    if let Some(opacity) = stroke.opacity {
        let _ = write!(attrs, r#" stroke-opacity="{}""#, num(opacity, 2));
    }
    attrs
}

fn fill_attrs(fill: &Fill) -> String {
    let mut attrs = format!(r#" fill="{}""#, escape(&fill.color));
    if let Some(opacity) = fill.opacity {
        let _ = write!(attrs, r#" fill-opacity="{}""#, num(opacity, 2));
    }
    attrs
}

fn points_attr(points: &[Point], p: usize) -> String {
    points
        .iter()
        .map(|pt| format!("{},{}", num(pt.x, p), num(pt.y, p)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_shape(out: &mut String, shape: &Shape, p: usize) {
    let _ = match shape {
        Shape::Rect { class, x, y, width, height, fill, stroke } => write!(
            out,
            r#"<rect{} x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
            class_attr(class),
            num(*x, p),
            num(*y, p),
            num(*width, p),
            num(*height, p),
            fill_attrs(fill),
            stroke.as_ref().map(stroke_attrs).unwrap_or_default()
        ),
        Shape::Line { class, from, to, stroke } => write!(
            out,
            r#"<line{} x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            class_attr(class),
            num(from.x, p),
            num(from.y, p),
            num(to.x, p),
            num(to.y, p),
            stroke_attrs(stroke)
        ),
        Shape::Polyline { class, points, stroke } => write!(
            out,
            r#"<polyline{} points="{}" fill="none"{}/>"#,
            class_attr(class),
            points_attr(points, p),
            stroke_attrs(stroke)
        ),
        Shape::Polygon { class, points, fill } => write!(
            out,
            r#"<polygon{} points="{}"{}/>"#,
            class_attr(class),
            points_attr(points, p),
            fill_attrs(fill)
        ),
        Shape::Circle { class, center, radius, fill } => write!(
            out,
            r#"<circle{} cx="{}" cy="{}" r="{}"{}/>"#,
            class_attr(class),
            num(center.x, p),
            num(center.y, p),
            num(*radius, 2),
            fill_attrs(fill)
        ),
        Shape::Text { class, at, content, anchor, size, color } => write!(
            out,
            r#"<text{} x="{}" y="{}" text-anchor="{}" font-size="{}" font-family="sans-serif" fill="{}">{}</text>"#,
            class_attr(class),
            num(at.x, p),
            num(at.y, p),
            anchor.as_str(),
            num(*size, 1),
            escape(color),
            escape(content)
        ),
    };
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Collapses whitespace: runs become a single space and whitespace between
/// tags disappears. Text content keeps single spaces.
pub fn minify(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut pending_space = false;
    for c in markup.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let after_tag = out.ends_with('>') || out.is_empty();
            if !after_tag && c != '<' {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }
    out
}
