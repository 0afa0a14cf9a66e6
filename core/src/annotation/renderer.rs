use crate::annotation::raster::{RasterSurface, SourceImage};
use crate::annotation::surface::OverlaySurface;
use crate::clinical::{DetectionResult, Rect};
use crate::prelude::CanvasConfig;
use image::{Rgba, RgbaImage};

pub const WARNING_FILL: Rgba<u8> = Rgba([239, 68, 68, 51]);
pub const WARNING_STROKE: Rgba<u8> = Rgba([239, 68, 68, 255]);
pub const CLEAR_FILL: Rgba<u8> = Rgba([34, 197, 94, 26]);
pub const CLEAR_STROKE: Rgba<u8> = Rgba([34, 197, 94, 255]);
pub const STROKE_WIDTH: f32 = 2.0;

/// Which overlay ended up on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Findings(usize),
    Clear,
}

/// Rendered canvas plus a summary of what was drawn on it.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbaImage,
    pub overlay: OverlayKind,
}

impl Composite {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw RGBA8 rows, the layout GPU image handles expect.
    pub fn to_rgba(&self) -> (u32, u32, Vec<u8>) {
        let (width, height) = self.image.dimensions();
        (width, height, self.image.as_raw().clone())
    }
}

/// Maps a detection result onto a fixed-size canvas.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationRenderer {
    canvas: CanvasConfig,
}

impl AnnotationRenderer {
    pub fn new(canvas: CanvasConfig) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> CanvasConfig {
        self.canvas
    }

    /// Default "no finding" frame: a 50px inset on the 400px reference canvas.
    pub fn clear_region(&self) -> Rect {
        clear_frame(self.canvas.width, self.canvas.height)
    }

    /// Draws onto whatever size the surface reports; `composite` sizes it from the canvas.
    pub fn draw<S: OverlaySurface + ?Sized>(
        &self,
        source: &SourceImage,
        detection: &DetectionResult,
        surface: &mut S,
    ) -> OverlayKind {
        let (width, height) = surface.size();
        surface.draw_source(source);

        if !detection.has_condition || detection.affected_regions.is_empty() {
            let region = clear_frame(width, height);
            surface.fill_rect(region, CLEAR_FILL);
            surface.stroke_rect(region, CLEAR_STROKE, STROKE_WIDTH);
            return OverlayKind::Clear;
        }

        let sx = width as f32 / source.width().max(1) as f32;
        let sy = height as f32 / source.height().max(1) as f32;
        for region in &detection.affected_regions {
            let scaled = region.scaled(sx, sy);
            surface.fill_rect(scaled, WARNING_FILL);
            surface.stroke_rect(scaled, WARNING_STROKE, STROKE_WIDTH);
        }
        OverlayKind::Findings(detection.affected_regions.len())
    }

    pub fn composite(&self, source: &SourceImage, detection: &DetectionResult) -> Composite {
        let mut surface = RasterSurface::new(self.canvas.width, self.canvas.height);
        let overlay = self.draw(source, detection, &mut surface);
        Composite {
            image: surface.into_image(),
            overlay,
        }
    }
}

fn clear_frame(width: u32, height: u32) -> Rect {
    let w = width as f32;
    let h = height as f32;
    Rect::new(w * 0.125, h * 0.125, w * 0.75, h * 0.75)
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::surface::{DrawOp, RecordingSurface};
    use crate::clinical::{Detector, FixedDetector, ImageUpload, PatientRecord};

    fn record(detection: &DetectionResult, source: &SourceImage) -> RecordingSurface {
        let renderer = AnnotationRenderer::default();
        let mut surface = RecordingSurface::new(400, 400);
        renderer.draw(source, detection, &mut surface);
        surface
    }

    #[test]
    fn clear_result_ignores_regions() {
        let mut detection = DetectionResult::clear(0.9);
        detection.affected_regions = vec![Rect::new(1.0, 1.0, 5.0, 5.0); 3];
        let surface = record(&detection, &SourceImage::blank(400, 400));
        let expected = Rect::new(50.0, 50.0, 300.0, 300.0);
        assert_eq!(
            surface.ops()[1..],
            [
                DrawOp::Fill {
                    rect: expected,
                    color: CLEAR_FILL
                },
                DrawOp::Stroke {
                    rect: expected,
                    color: CLEAR_STROKE,
                    width: STROKE_WIDTH
                },
            ]
        );
    }

    #[test]
    fn findings_draw_one_fill_and_stroke_per_region_in_order() {
        let detection = DetectionResult::reference();
        let surface = record(&detection, &SourceImage::blank(400, 400));
        assert_eq!(surface.ops().len(), 1 + 2 * detection.affected_regions.len());
        let fills: Vec<_> = surface.fills().copied().collect();
        let strokes: Vec<_> = surface.strokes().copied().collect();
        assert_eq!(fills, detection.affected_regions);
        assert_eq!(strokes, detection.affected_regions);
        assert!(matches!(surface.ops()[0], DrawOp::Source { .. }));
    }

    #[test]
    fn positive_without_regions_falls_back_to_clear_overlay() {
        let mut detection = DetectionResult::reference();
        detection.affected_regions.clear();
        let renderer = AnnotationRenderer::default();
        let mut surface = RecordingSurface::new(400, 400);
        let kind = renderer.draw(&SourceImage::blank(400, 400), &detection, &mut surface);
        assert_eq!(kind, OverlayKind::Clear);
        assert_eq!(surface.fills().count(), 1);
    }

    #[test]
    fn regions_scale_from_source_space() {
        let detection = DetectionResult::reference();
        let surface = record(&detection, &SourceImage::blank(800, 200));
        let first = surface.fills().next().copied().unwrap();
        assert_eq!(first, Rect::new(60.0, 160.0, 30.0, 160.0));
    }

    #[test]
    fn fixed_findings_land_on_the_same_canvas_spot_at_any_resolution() {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::GrayImage::new(800, 600)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        let upload = ImageUpload::new("chest.png", bytes.into_inner());
        let patient = PatientRecord::new("John Q Smith", "45", "male");
        let detection = FixedDetector::default().analyze(&patient, &upload);

        let surface = record(&detection, &SourceImage::blank(800, 600));
        let fills: Vec<_> = surface.fills().copied().collect();
        let expected = DetectionResult::reference().affected_regions;
        assert_eq!(fills.len(), expected.len());
        for (drawn, want) in fills.iter().zip(&expected) {
            let gaps = [
                drawn.x - want.x,
                drawn.y - want.y,
                drawn.width - want.width,
                drawn.height - want.height,
            ];
            assert!(gaps.iter().all(|gap| gap.abs() < 1e-3), "{drawn:?} vs {want:?}");
        }
    }

    #[test]
    fn later_region_paints_over_earlier_one() {
        let mut detection = DetectionResult::reference();
        detection.affected_regions = vec![
            Rect::new(10.0, 10.0, 40.0, 40.0),
            Rect::new(30.0, 30.0, 40.0, 40.0),
        ];
        let renderer = AnnotationRenderer::default();
        let source = SourceImage::blank(400, 400);
        let composite = renderer.composite(&source, &detection);
        assert_eq!(composite.overlay, OverlayKind::Findings(2));
        // (40, 40) lies inside both fills; two warning layers over black.
        let twice = composite.image.get_pixel(40, 40)[0];
        let once = composite.image.get_pixel(20, 20)[0];
        assert!(twice > once);

        let mut surface = RecordingSurface::new(400, 400);
        renderer.draw(&source, &detection, &mut surface);
        let order: Vec<_> = surface.ops()[1..]
            .iter()
            .map(|op| match op {
                DrawOp::Fill { rect, .. } => ("fill", rect.x),
                DrawOp::Stroke { rect, .. } => ("stroke", rect.x),
                DrawOp::Source { .. } => ("source", 0.0),
            })
            .collect();
        assert_eq!(
            order,
            vec![("fill", 10.0), ("stroke", 10.0), ("fill", 30.0), ("stroke", 30.0)]
        );
    }

    #[test]
    fn clear_frame_follows_surface_size() {
        let renderer = AnnotationRenderer::default();
        let mut surface = RecordingSurface::new(800, 200);
        renderer.draw(&SourceImage::blank(10, 10), &DetectionResult::clear(0.9), &mut surface);
        let frame = surface.fills().next().copied().unwrap();
        assert_eq!(frame, Rect::new(100.0, 25.0, 600.0, 150.0));
        assert_eq!(renderer.clear_region(), Rect::new(50.0, 50.0, 300.0, 300.0));
    }

    #[test]
    fn composite_uses_configured_canvas() {
        let renderer = AnnotationRenderer::new(CanvasConfig {
            width: 200,
            height: 100,
        });
        let composite = renderer.composite(&SourceImage::blank(50, 50), &DetectionResult::clear(0.8));
        assert_eq!(composite.dimensions(), (200, 100));
        let (w, h, raw) = composite.to_rgba();
        assert_eq!(raw.len(), (w * h * 4) as usize);
    }
}
