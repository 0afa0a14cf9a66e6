use crate::annotation::raster::SourceImage;
use crate::clinical::Rect;
use image::Rgba;

/// Drawing target for the annotation renderer.
pub trait OverlaySurface {
    fn size(&self) -> (u32, u32);
    /// Paints the source image scaled to cover the whole surface.
    fn draw_source(&mut self, source: &SourceImage);
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Source { width: u32, height: u32 },
    Fill { rect: Rect, color: Rgba<u8> },
    Stroke { rect: Rect, color: Rgba<u8>, width: f32 },
}

/// Surface that keeps the draw calls instead of pixels.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn fills(&self) -> impl Iterator<Item = &Rect> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Fill { rect, .. } => Some(rect),
            _ => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Rect> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Stroke { rect, .. } => Some(rect),
            _ => None,
        })
    }
}

impl OverlaySurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_source(&mut self, source: &SourceImage) {
        self.ops.push(DrawOp::Source {
            width: source.width(),
            height: source.height(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.ops.push(DrawOp::Fill { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32) {
        self.ops.push(DrawOp::Stroke { rect, color, width });
    }
}
