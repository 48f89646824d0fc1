use crate::error::ExtractError;
use crate::extract::{AttachmentExtractor, FormatTag};

pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentExtractor for TextExtractor {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError> {
        let text = match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            // Latin-1 fallback for résumés saved by older Windows tooling.
            Err(_) => data.iter().map(|&b| b as char).collect(),
        };

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        Ok(text)
    }

    fn supports(&self, format: FormatTag) -> bool {
        matches!(format, FormatTag::Text)
    }
}
