use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ExtractError;
use crate::extract::{AttachmentExtractor, FormatTag};

pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentExtractor for DocxExtractor {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("extract.docx").entered();

        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| ExtractError::DocxExtraction(format!("Failed to open DOCX: {}", e)))?;

        let xml_content = {
            let mut document_xml = archive.by_name("word/document.xml").map_err(|e| {
                ExtractError::DocxExtraction(format!("Failed to find document.xml: {}", e))
            })?;

            let mut content = String::new();
            document_xml.read_to_string(&mut content).map_err(|e| {
                ExtractError::DocxExtraction(format!("Failed to read document.xml: {}", e))
            })?;
            content
        };

        let text = parse_docx_xml(&xml_content)?;

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        Ok(text)
    }

    fn supports(&self, format: FormatTag) -> bool {
        matches!(format, FormatTag::Docx)
    }
}

/// Pulls the text runs out of document.xml, one line per paragraph.
fn parse_docx_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_text_element = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"t" => in_text_element = true,
                    b"p" => in_paragraph = true,
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"t" => in_text_element = false,
                    b"p" => {
                        if in_paragraph {
                            text.push('\n');
                            in_paragraph = false;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let decoded = e.xml_content().unwrap_or_default();
                    text.push_str(&decoded);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::DocxExtraction(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}
