use crate::annotation::blob::ImageHandle;
use crate::annotation::raster::SourceImage;
use crate::annotation::renderer::{AnnotationRenderer, Composite};
use crate::clinical::{DetectionResult, ImageUpload};
use crate::prelude::TriageResult;
use log::warn;
use std::sync::Arc;

enum ImageState {
    Loading,
    Ready(Composite),
    Failed(String),
}

#[derive(Debug)]
pub enum RenderOutcome<'a> {
    /// Source still decoding; the shell shows a loading indicator.
    Loading,
    Ready(&'a Composite),
    Failed(&'a str),
}

/// Overlay state for one analysis: owns the image handle and the cached composite.
pub struct AnnotationView {
    epoch: u64,
    handle: ImageHandle,
    detection: Arc<DetectionResult>,
    renderer: AnnotationRenderer,
    state: ImageState,
}

impl AnnotationView {
    pub fn new(
        epoch: u64,
        handle: ImageHandle,
        detection: Arc<DetectionResult>,
        renderer: AnnotationRenderer,
    ) -> Self {
        Self {
            epoch,
            handle,
            detection,
            renderer,
            state: ImageState::Loading,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn upload(&self) -> &ImageUpload {
        self.handle.upload()
    }

    pub fn detection(&self) -> &DetectionResult {
        &self.detection
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self.state, ImageState::Loading)
    }

    /// Accepts a finished decode. Results from an older epoch are dropped.
    pub fn attach(&mut self, epoch: u64, decoded: TriageResult<SourceImage>) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.state = match decoded {
            Ok(source) => ImageState::Ready(self.renderer.composite(&source, &self.detection)),
            Err(err) => {
                warn!(
                    "overlay for epoch {} (image #{}) unavailable: {}",
                    epoch,
                    self.handle.id(),
                    err
                );
                ImageState::Failed(err.to_string())
            }
        };
        true
    }

    pub fn render(&self) -> RenderOutcome<'_> {
        match &self.state {
            ImageState::Loading => RenderOutcome::Loading,
            ImageState::Ready(composite) => RenderOutcome::Ready(composite),
            ImageState::Failed(reason) => RenderOutcome::Failed(reason),
        }
    }
}
