//! Per-slide aggregation into a single analysis document.
//!
//! Produces one text block per slide tagged with `--- Slide N ---`, joined
//! by blank lines. The marker sequence mirrors slide order exactly, and
//! every non-empty fragment lands in its slide's block.

use crate::normalize::TextNormalizer;
use crate::types::{ExtractedSlide, FragmentKind, Presentation};

/// Prefix attached to OCR text blocks so the analysis model can tell image
/// text apart from native slide text.
const OCR_BLOCK_PREFIX: &str = "[OCR Text from Image]:";

/// Aggregates extracted slides into a slide-tagged analysis document.
#[derive(Debug, Clone, Default)]
pub struct SlideAggregator {
    normalizer: TextNormalizer,
}

impl SlideAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
        }
    }

    /// Build the aggregated document for an entire presentation.
    ///
    /// Every slide contributes a block, even when it has no text; the model
    /// still needs to see the slide exists to report correct slide numbers.
    pub fn aggregate(&self, presentation: &Presentation) -> String {
        presentation
            .slides
            .iter()
            .map(|slide| self.slide_block(slide))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the tagged text block for one slide.
    fn slide_block(&self, slide: &ExtractedSlide) -> String {
        let body = self.slide_body(slide);
        if body.is_empty() {
            format!("--- Slide {} ---", slide.number)
        } else {
            format!("--- Slide {} ---\n{}", slide.number, body)
        }
    }

    /// Join a slide's non-empty fragments, normalized, with newlines.
    fn slide_body(&self, slide: &ExtractedSlide) -> String {
        slide
            .non_empty_texts()
            .iter()
            .filter_map(|fragment| {
                let normalized = self.normalizer.normalize_block(&fragment.text);
                if normalized.is_empty() {
                    return None;
                }
                match fragment.kind {
                    FragmentKind::Ocr => Some(format!("{}\n{}", OCR_BLOCK_PREFIX, normalized)),
                    _ => Some(normalized),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
