//! Core domain types, text normalization, per-slide aggregation,
//! and the analysis prompt for presentation consistency auditing.

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod report;
pub mod types;

pub use aggregate::SlideAggregator;
pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use prompt::build_analysis_prompt;
pub use report::ReportFormatter;
pub use types::{
    EmbeddedImage, ExtractedSlide, Fragment, FragmentKind, Presentation, PresentationFormat,
};
