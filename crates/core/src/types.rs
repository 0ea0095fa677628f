//! Domain types for representing extracted presentation content.
//!
//! Everything here is transient: the structures live only for the duration
//! of one audit run and are never persisted.

use serde::{Deserialize, Serialize};

/// Represents an entire presentation with its extracted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: PresentationFormat,

    /// Slides in presentation order.
    pub slides: Vec<ExtractedSlide>,
}

impl Presentation {
    /// Create a new presentation with the given filename and format.
    pub fn new(filename: impl Into<String>, format: PresentationFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }

    /// Total number of embedded images across all slides.
    pub fn image_count(&self) -> usize {
        self.slides.iter().map(|s| s.images.len()).sum()
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected but not supported.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8 && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single extracted slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text fragments extracted from this slide, in reading order.
    pub fragments: Vec<Fragment>,

    /// Embedded images awaiting OCR, in document order.
    pub images: Vec<EmbeddedImage>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            fragments: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Add a shape text fragment with position information.
    pub fn add_shape_text(&mut self, text: impl Into<String>, y: f64, x: f64) {
        self.fragments
            .push(Fragment::with_position(text, FragmentKind::Shape, y, x));
    }

    /// Add a table cell fragment (row-major order, no position info).
    pub fn add_table_cell(&mut self, text: impl Into<String>) {
        self.fragments.push(Fragment::new(text, FragmentKind::TableCell));
    }

    /// Add an OCR text fragment produced from an embedded image.
    pub fn add_ocr_text(&mut self, text: impl Into<String>) {
        self.fragments.push(Fragment::new(text, FragmentKind::Ocr));
    }

    /// Add an embedded image for later OCR.
    pub fn add_image(&mut self, image: EmbeddedImage) {
        self.images.push(image);
    }

    /// Sort shape fragments by position (top-to-bottom, then left-to-right).
    ///
    /// Fragments without position (table cells, OCR text) keep their
    /// relative order after positioned ones with equal coordinates.
    pub fn sort_by_position(&mut self) {
        self.fragments.sort_by(|a, b| {
            let y_cmp = a
                .y_position
                .partial_cmp(&b.y_position)
                .unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x_position
                    .partial_cmp(&b.x_position)
                    .unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });
    }

    /// Get non-empty fragment texts in order.
    pub fn non_empty_texts(&self) -> Vec<&Fragment> {
        self.fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .collect()
    }
}

/// What part of the slide a text fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    /// A text frame inside a shape.
    Shape,
    /// A table cell.
    TableCell,
    /// Text recognized from an embedded image.
    Ocr,
}

/// Text content from a shape, table cell, or OCR pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// The actual text content.
    pub text: String,

    /// Where the text came from.
    pub kind: FragmentKind,

    /// Y position for ordering (top-to-bottom). None if unknown.
    pub y_position: Option<f64>,

    /// X position for ordering (left-to-right). None if unknown.
    pub x_position: Option<f64>,
}

impl Fragment {
    /// Create a fragment without position info.
    pub fn new(text: impl Into<String>, kind: FragmentKind) -> Self {
        Self {
            text: text.into(),
            kind,
            y_position: None,
            x_position: None,
        }
    }

    /// Create a fragment with position info.
    pub fn with_position(text: impl Into<String>, kind: FragmentKind, y: f64, x: f64) -> Self {
        Self {
            text: text.into(),
            kind,
            y_position: Some(y),
            x_position: Some(x),
        }
    }
}

/// Raw bytes of an image embedded in a slide, destined for OCR.
///
/// The byte blob is skipped during serialization; only the part name
/// survives a serde round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedImage {
    /// Path of the image part inside the archive (e.g. `ppt/media/image1.png`).
    pub part_name: String,

    /// Raw image bytes as stored in the archive.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl EmbeddedImage {
    /// Create an embedded image from its archive part name and raw bytes.
    pub fn new(part_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            part_name: part_name.into(),
            bytes,
        }
    }
}
