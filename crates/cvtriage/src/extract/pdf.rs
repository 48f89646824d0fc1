use crate::error::ExtractError;
use crate::extract::{AttachmentExtractor, FormatTag};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentExtractor for PdfExtractor {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("extract.pdf").entered();

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| ExtractError::PdfExtraction(format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        for (page_num, _) in doc.get_pages() {
            if let Ok(page_text) = doc.extract_text(&[page_num]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        // A valid PDF with no extractable text yields an empty string; the
        // classifier scores it zero rather than treating it as a failure.
        Ok(text)
    }

    fn supports(&self, format: FormatTag) -> bool {
        matches!(format, FormatTag::Pdf)
    }
}
