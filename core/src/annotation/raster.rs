use crate::annotation::surface::OverlaySurface;
use crate::clinical::{ImageUpload, Rect};
use crate::prelude::{TriageError, TriageResult};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Decoded source image, shared cheaply between the view and the UI.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

pub fn decode_upload(upload: &ImageUpload) -> TriageResult<SourceImage> {
    let decoded = image::load_from_memory(upload.bytes())
        .map_err(|err| TriageError::ImageDecode(format!("{}: {}", upload.file_name, err)))?;
    Ok(SourceImage::new(decoded.to_rgba8()))
}

/// Decodes on the blocking pool so the caller's event loop keeps running.
pub async fn decode_in_background(upload: ImageUpload) -> TriageResult<SourceImage> {
    tokio::task::spawn_blocking(move || decode_upload(&upload))
        .await
        .map_err(|err| TriageError::ImageDecode(format!("decoder task aborted: {}", err)))?
}

/// Pixel surface with source-over blending.
pub struct RasterSurface {
    canvas: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    fn span(&self, start: f32, end: f32, limit: u32) -> (u32, u32) {
        let lo = start.round().max(0.0) as u32;
        let hi = end.round().max(0.0) as u32;
        (lo.min(limit), hi.min(limit))
    }

    fn blend_at(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        let dst = *self.canvas.get_pixel(x, y);
        self.canvas.put_pixel(x, y, blend_pixel(dst, color));
    }
}

impl OverlaySurface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_source(&mut self, source: &SourceImage) {
        let (width, height) = self.canvas.dimensions();
        if source.width() == 0 || source.height() == 0 {
            return;
        }
        let scaled = imageops::resize(source.pixels(), width, height, FilterType::Triangle);
        imageops::overlay(&mut self.canvas, &scaled, 0, 0);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (width, height) = self.canvas.dimensions();
        let (x0, x1) = self.span(rect.x, rect.x + rect.width, width);
        let (y0, y1) = self.span(rect.y, rect.y + rect.height, height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_at(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32) {
        // The line straddles the rectangle edge, half inside and half outside.
        let half = width / 2.0;
        let (canvas_w, canvas_h) = self.canvas.dimensions();
        let (ox0, ox1) = self.span(rect.x - half, rect.x + rect.width + half, canvas_w);
        let (oy0, oy1) = self.span(rect.y - half, rect.y + rect.height + half, canvas_h);
        let (ix0, ix1) = self.span(rect.x + half, rect.x + rect.width - half, canvas_w);
        let (iy0, iy1) = self.span(rect.y + half, rect.y + rect.height - half, canvas_h);
        for y in oy0..oy1 {
            for x in ox0..ox1 {
                let inside = x >= ix0 && x < ix1 && y >= iy0 && y < iy1;
                if !inside {
                    self.blend_at(x, y, color);
                }
            }
        }
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f32::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f32::from(d) * inv + f32::from(s) * a).round().clamp(0.0, 255.0) as u8;
    let out_a = (f32::from(dst[3]) * inv + f32::from(src[3]))
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_upload(width: u32, height: u32) -> ImageUpload {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 200, 200, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        ImageUpload::new("chest.png", bytes.into_inner())
    }

    #[test]
    fn decode_reads_png_dimensions() {
        let source = decode_upload(&png_upload(32, 16)).unwrap();
        assert_eq!((source.width(), source.height()), (32, 16));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_upload(&ImageUpload::new("junk.bin", vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, TriageError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn background_decode_matches_inline_decode() {
        let source = decode_in_background(png_upload(8, 8)).await.unwrap();
        assert_eq!(source.width(), 8);
    }

    #[test]
    fn fill_blends_only_inside_rect() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_rect(Rect::new(2.0, 2.0, 3.0, 3.0), Rgba([255, 0, 0, 255]));
        assert_eq!(*surface.image().get_pixel(2, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*surface.image().get_pixel(4, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(*surface.image().get_pixel(5, 5), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut surface = RasterSurface::new(20, 20);
        surface.stroke_rect(Rect::new(4.0, 4.0, 10.0, 10.0), Rgba([0, 255, 0, 255]), 2.0);
        assert_eq!(*surface.image().get_pixel(4, 8), Rgba([0, 255, 0, 255]));
        assert_eq!(*surface.image().get_pixel(3, 8), Rgba([0, 255, 0, 255]));
        assert_eq!(*surface.image().get_pixel(9, 9), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn translucent_fill_mixes_with_background() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba([255, 255, 255, 51]));
        assert_eq!(surface.image().get_pixel(1, 1)[0], 51);
    }
}
