//! PPTX (Office Open XML) parser backend for deck auditing.
//!
//! Parses .pptx files which are ZIP archives containing XML documents,
//! yielding per-slide text fragments, table cells, and embedded image bytes.

pub mod parser;

pub use parser::PptxParser;
