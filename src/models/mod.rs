pub mod analysis;
pub mod outcome;
pub mod upload;

pub use analysis::{AnalysisRecord, DetectedCondition, ProductRecommendation};
pub use outcome::{AggregateResponse, FileOutcome};
pub use upload::UploadedFile;
