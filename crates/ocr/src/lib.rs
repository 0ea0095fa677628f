//! OCR backend for embedded slide images.
//!
//! Drives the Tesseract CLI as a subprocess; images in formats Tesseract
//! cannot read directly are re-encoded to PNG first.

pub mod engine;

pub use engine::OcrEngine;
