pub mod blob;
pub mod raster;
pub mod renderer;
pub mod report;
pub mod surface;
pub mod view;

pub use blob::{BlobRegistry, ImageHandle};
pub use raster::{decode_in_background, decode_upload, RasterSurface, SourceImage};
pub use renderer::{AnnotationRenderer, Composite, OverlayKind};
pub use report::{generate_report, report_file_name, AnalysisReport};
pub use surface::{DrawOp, OverlaySurface, RecordingSurface};
pub use view::{AnnotationView, RenderOutcome};
