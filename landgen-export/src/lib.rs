pub mod model;
pub mod content;
pub mod testimonials;
pub mod transform;
pub mod exporter;
pub mod coordinates;

pub use coordinates::{validate_artifact, validate_file, CoordinateError, CoordinateIssue, CoordinateReport};
pub use exporter::{ExportError, ExportReport, Exporter};
pub use model::{BranchCoordinates, ContentData, EnhancedPage, ExportMetadata};
pub use transform::{PageRejection, PageTransformer};
