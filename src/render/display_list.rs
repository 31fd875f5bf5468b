//! A surface that records draw commands instead of rasterising them.

use super::Surface;
use crate::map::Affine;
use eframe::egui::{Color32, Pos2, Rect, Stroke, Vec2};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    SetTransform(Affine),
    FillRect {
        rect: Rect,
        color: Color32,
    },
    Polygon {
        ring: Vec<Pos2>,
        fill: Color32,
        stroke: Stroke,
    },
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Pos2>,
        stroke: Stroke,
    },
    Text {
        center: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
}

/// Recording surface. `clear` drops everything recorded so far.
#[derive(Debug, Clone)]
pub struct DisplayList {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn polygons(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. }))
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    pub fn polylines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polyline { .. }))
    }

    /// Texts, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DisplayList {
    fn logical_size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn set_transform(&mut self, transform: Affine) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn polygon(&mut self, ring: &[Pos2], fill: Color32, stroke: Stroke) {
        self.commands.push(DrawCommand::Polygon {
            ring: ring.to_vec(),
            fill,
            stroke,
        });
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn polyline(&mut self, points: &[Pos2], stroke: Stroke) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke,
        });
    }

    fn text(&mut self, center: Pos2, text: &str, size: f32, color: Color32) {
        self.commands.push(DrawCommand::Text {
            center,
            text: text.to_string(),
            size,
            color,
        });
    }
}
