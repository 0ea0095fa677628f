//! PPTX file parser implementation.
//!
//! Reads slide order from the presentation relationships, then pull-parses
//! each slide's XML for shape text, table cell text, and embedded picture
//! references. Picture references are resolved through the slide's own
//! relationships part to raw media bytes for the OCR stage.

use deckscan_core::{EmbeddedImage, Error, ExtractedSlide, Presentation, PresentationFormat, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut presentation = Presentation::new(filename, PresentationFormat::Pptx);

        // Get the slide order from presentation.xml.rels
        let slide_order = self.get_slide_order(&mut archive)?;

        // Parse each slide in order
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = "ppt/_rels/presentation.xml.rels";

        let rels_content = self.read_text_from_archive(archive, rels_path)?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        for rel in parse_relationships(&rels_content)? {
            // Only slide relationships; layouts and masters also match "/slide"
            if rel.rel_type.contains("/slide")
                && !rel.rel_type.contains("slideLayout")
                && !rel.rel_type.contains("slideMaster")
            {
                let order_num =
                    extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                let full_path = if rel.target.starts_with('/') {
                    rel.target[1..].to_string()
                } else {
                    format!("ppt/{}", rel.target)
                };
                slides.push((full_path, order_num));
            }
        }

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ExtractedSlide> {
        let content = self.read_text_from_archive(archive, slide_path)?;
        let mut slide = ExtractedSlide::new(slide_number);

        let elements = extract_elements_from_xml(&content)?;

        // Shapes first, in reading order; positions are EMU offsets
        for shape in elements.shapes {
            if !shape.text.trim().is_empty() {
                slide.add_shape_text(&shape.text, shape.y, shape.x);
            }
        }
        slide.sort_by_position();

        // Table cells in row-major document order
        for cell in elements.table_cells {
            if !cell.trim().is_empty() {
                slide.add_table_cell(&cell);
            }
        }

        // Resolve picture relationship ids to media bytes
        if !elements.image_rel_ids.is_empty() {
            let rels = self.load_slide_relationships(archive, slide_path);
            for rel_id in &elements.image_rel_ids {
                match rels.get(rel_id) {
                    Some(part_name) => {
                        match self.read_bytes_from_archive(archive, part_name) {
                            Ok(bytes) => slide.add_image(EmbeddedImage::new(part_name, bytes)),
                            Err(e) => log::warn!(
                                "Slide {}: could not read image part '{}': {}",
                                slide_number,
                                part_name,
                                e
                            ),
                        }
                    }
                    None => log::warn!(
                        "Slide {}: unresolved image relationship '{}'",
                        slide_number,
                        rel_id
                    ),
                }
            }
        }

        Ok(slide)
    }

    /// Load the slide's own relationships, mapping rIds to archive part names.
    ///
    /// A slide without a rels part simply has no resolvable images.
    fn load_slide_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> HashMap<String, String> {
        let rels_path = slide_rels_path(slide_path);
        let base_dir = slide_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        let content = match self.read_text_from_archive(archive, &rels_path) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("No relationships for '{}': {}", slide_path, e);
                return HashMap::new();
            }
        };

        let rels = match parse_relationships(&content) {
            Ok(rels) => rels,
            Err(e) => {
                log::warn!("Malformed relationships for '{}': {}", slide_path, e);
                return HashMap::new();
            }
        };

        rels.into_iter()
            .filter(|rel| rel.rel_type.contains("/image"))
            .map(|rel| {
                let part = resolve_target(base_dir, &rel.target);
                (rel.id, part)
            })
            .collect()
    }

    /// Read a text file from the ZIP archive.
    fn read_text_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a binary file from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(bytes)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A single Relationship entry from a .rels part.
#[derive(Debug)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Parse all Relationship elements from a .rels document.
fn parse_relationships(xml_content: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                rels.push(Relationship { id, rel_type, target });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Everything we pull out of one slide's XML.
#[derive(Debug, Default)]
struct SlideElements {
    shapes: Vec<ShapeInfo>,
    table_cells: Vec<String>,
    image_rel_ids: Vec<String>,
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
}

/// Extract shapes, table cells, and picture relationship ids from slide XML.
fn extract_elements_from_xml(xml_content: &str) -> Result<SlideElements> {
    let mut elements = SlideElements::default();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut shape_text = String::new();
    let mut current_cell: Option<String> = None;
    let mut in_pic = false;
    let mut in_text_body = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"sp" => {
                        current_shape = Some(ShapeInfo::default());
                        shape_text.clear();
                    }
                    b"pic" => {
                        in_pic = true;
                    }
                    b"tc" => {
                        current_cell = Some(String::new());
                    }
                    b"off" => {
                        if current_cell.is_none() {
                            apply_offset(e, &mut current_shape);
                        }
                    }
                    b"blip" if in_pic => {
                        if let Some(rel_id) = embed_rel_id(e) {
                            elements.image_rel_ids.push(rel_id);
                        }
                    }
                    b"txBody" => {
                        in_text_body = true;
                    }
                    b"p" if in_text_body => {
                        in_paragraph = true;
                        match current_cell.as_mut() {
                            Some(cell) if !cell.is_empty() => cell.push('\n'),
                            Some(_) => {}
                            None if !shape_text.is_empty() => shape_text.push('\n'),
                            None => {}
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => {
                    if current_cell.is_none() {
                        apply_offset(e, &mut current_shape);
                    }
                }
                b"blip" if in_pic => {
                    if let Some(rel_id) = embed_rel_id(e) {
                        elements.image_rel_ids.push(rel_id);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    match current_cell.as_mut() {
                        Some(cell) => cell.push_str(&text),
                        None => shape_text.push_str(&text),
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if let Some(mut shape) = current_shape.take() {
                        shape.text = shape_text.trim().to_string();
                        if !shape.text.is_empty() {
                            elements.shapes.push(shape);
                        }
                    }
                    shape_text.clear();
                    in_text_body = false;
                    in_paragraph = false;
                }
                b"pic" => {
                    in_pic = false;
                }
                b"tc" => {
                    if let Some(cell) = current_cell.take() {
                        let cell = cell.trim().to_string();
                        if !cell.is_empty() {
                            elements.table_cells.push(cell);
                        }
                    }
                }
                b"txBody" => {
                    in_text_body = false;
                }
                b"p" => {
                    in_paragraph = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
                // Continue parsing despite errors
            }
            _ => {}
        }
    }

    Ok(elements)
}

/// Apply the x/y attributes of an `off` element to the current shape.
fn apply_offset(e: &quick_xml::events::BytesStart, current_shape: &mut Option<ShapeInfo>) {
    if let Some(shape) = current_shape.as_mut() {
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"x" => {
                    if let Ok(x) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        shape.x = x;
                    }
                }
                b"y" => {
                    if let Ok(y) = String::from_utf8_lossy(&attr.value).parse::<f64>() {
                        shape.y = y;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Read the `r:embed` relationship id from a `blip` element.
fn embed_rel_id(e: &quick_xml::events::BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"embed" {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

/// Compute the rels part path for a slide (`ppt/slides/_rels/slideN.xml.rels`).
fn slide_rels_path(slide_path: &str) -> String {
    match slide_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", slide_path),
    }
}

/// Resolve a relationship target relative to the slide's directory.
///
/// Targets use forward slashes and may climb with `..` (`../media/image1.png`
/// from `ppt/slides` resolves to `ppt/media/image1.png`).
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        return stripped.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckscan_core::FragmentKind;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const PRESENTATION_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#;

    const SLIDE1_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp>
      <p:spPr><a:xfrm><a:off x="500" y="900"/></a:xfrm></p:spPr>
      <p:txBody><a:p><a:r><a:t>Lower shape</a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:sp>
      <p:spPr><a:xfrm><a:off x="500" y="100"/></a:xfrm></p:spPr>
      <p:txBody><a:p><a:r><a:t>Deck Title</a:t></a:r></a:p><a:p><a:r><a:t>Subtitle</a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:graphicFrame>
      <a:graphic><a:graphicData><a:tbl><a:tr>
        <a:tc><a:txBody><a:p><a:r><a:t>Revenue</a:t></a:r></a:p></a:txBody></a:tc>
        <a:tc><a:txBody><a:p><a:r><a:t>$15M</a:t></a:r></a:p></a:txBody></a:tc>
      </a:tr></a:tbl></a:graphicData></a:graphic>
    </p:graphicFrame>
    <p:pic>
      <p:blipFill><a:blip r:embed="rId7"/></p:blipFill>
    </p:pic>
  </p:spTree></p:cSld>
</p:sld>"#;

    const SLIDE1_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

    const SLIDE2_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp>
      <p:spPr><a:xfrm><a:off x="0" y="0"/></a:xfrm></p:spPr>
      <p:txBody><a:p><a:r><a:t>Revenue is $12M</a:t></a:r></a:p></p:txBody>
    </p:sp>
  </p:spTree></p:cSld>
</p:sld>"#;

    const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    fn build_fixture_pptx() -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions = FileOptions::default();

        writer
            .start_file("ppt/_rels/presentation.xml.rels", options)
            .unwrap();
        writer.write_all(PRESENTATION_RELS.as_bytes()).unwrap();

        writer.start_file("ppt/slides/slide1.xml", options).unwrap();
        writer.write_all(SLIDE1_XML.as_bytes()).unwrap();

        writer
            .start_file("ppt/slides/_rels/slide1.xml.rels", options)
            .unwrap();
        writer.write_all(SLIDE1_RELS.as_bytes()).unwrap();

        writer.start_file("ppt/slides/slide2.xml", options).unwrap();
        writer.write_all(SLIDE2_XML.as_bytes()).unwrap();

        writer.start_file("ppt/media/image1.png", options).unwrap();
        writer.write_all(FAKE_PNG).unwrap();

        writer.finish().unwrap()
    }

    #[test]
    fn test_parse_fixture_slide_order() {
        let parser = PptxParser::new();
        let prs = parser.parse(build_fixture_pptx(), "fixture.pptx").unwrap();

        assert_eq!(prs.slides.len(), 2);
        assert_eq!(prs.slides[0].number, 1);
        assert_eq!(prs.slides[1].number, 2);
        assert!(prs.slides[1].fragments[0].text.contains("$12M"));
    }

    #[test]
    fn test_parse_fixture_shapes_in_reading_order() {
        let parser = PptxParser::new();
        let prs = parser.parse(build_fixture_pptx(), "fixture.pptx").unwrap();

        let shapes: Vec<&str> = prs.slides[0]
            .fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::Shape)
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(shapes, vec!["Deck Title\nSubtitle", "Lower shape"]);
    }

    #[test]
    fn test_parse_fixture_table_cells() {
        let parser = PptxParser::new();
        let prs = parser.parse(build_fixture_pptx(), "fixture.pptx").unwrap();

        let cells: Vec<&str> = prs.slides[0]
            .fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::TableCell)
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(cells, vec!["Revenue", "$15M"]);
    }

    #[test]
    fn test_parse_fixture_embedded_image() {
        let parser = PptxParser::new();
        let prs = parser.parse(build_fixture_pptx(), "fixture.pptx").unwrap();

        assert_eq!(prs.slides[0].images.len(), 1);
        assert_eq!(prs.slides[0].images[0].part_name, "ppt/media/image1.png");
        assert_eq!(prs.slides[0].images[0].bytes, FAKE_PNG);
        assert!(prs.slides[1].images.is_empty());
    }

    #[test]
    fn test_missing_image_rel_is_skipped() {
        // Slide references rId9 but the rels part only maps rId7
        let slide = SLIDE1_XML.replace("rId7", "rId9");
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions = FileOptions::default();
        writer
            .start_file("ppt/_rels/presentation.xml.rels", options)
            .unwrap();
        writer
            .write_all(
                PRESENTATION_RELS
                    .replace("slides/slide2.xml", "slides/slide1.xml")
                    .as_bytes(),
            )
            .unwrap();
        writer.start_file("ppt/slides/slide1.xml", options).unwrap();
        writer.write_all(slide.as_bytes()).unwrap();
        writer
            .start_file("ppt/slides/_rels/slide1.xml.rels", options)
            .unwrap();
        writer.write_all(SLIDE1_RELS.as_bytes()).unwrap();
        let cursor = writer.finish().unwrap();

        let prs = PptxParser::new().parse(cursor, "fixture.pptx").unwrap();
        assert!(prs.slides[0].images.is_empty());
        // Text extraction is unaffected by the bad image reference
        assert!(!prs.slides[0].fragments.is_empty());
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("ppt/slides", "image2.jpeg"),
            "ppt/slides/image2.jpeg"
        );
        assert_eq!(
            resolve_target("ppt/slides", "/ppt/media/image3.gif"),
            "ppt/media/image3.gif"
        );
    }

    #[test]
    fn test_slide_rels_path() {
        assert_eq!(
            slide_rels_path("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
    }
}
