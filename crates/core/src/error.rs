//! Error types for the deck auditing pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting and analyzing a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// OCR engine failure (missing binary, subprocess error).
    #[error("OCR error: {0}")]
    OcrError(String),

    /// The analysis API key is missing from the environment.
    #[error("Missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// The remote analysis service failed.
    #[error("Analysis API error: {0}")]
    ApiError(String),

    /// The analysis service returned a response without usable text.
    #[error("Empty analysis response: {0}")]
    EmptyResponse(String),
}
