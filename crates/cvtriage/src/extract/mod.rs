//! Attachment text extraction.
//!
//! Attachments arrive as in-memory byte buffers from the mailbox layer,
//! so extractors operate on bytes rather than files on disk.

pub mod docx;
pub mod pdf;
pub mod text;

use crate::error::ExtractError;

/// Document format resolved from a file name or MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    Pdf,
    Docx,
    /// Legacy Word binary format. Recognized but never extractable.
    Doc,
    Text,
}

impl FormatTag {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(FormatTag::Pdf),
            "docx" => Some(FormatTag::Docx),
            "doc" => Some(FormatTag::Doc),
            "txt" => Some(FormatTag::Text),
            _ => None,
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext)?;
        Self::from_extension(extension)
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "application/pdf" => Some(FormatTag::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FormatTag::Docx)
            }
            "application/msword" => Some(FormatTag::Doc),
            "text/plain" => Some(FormatTag::Text),
            _ => None,
        }
    }
}

pub trait AttachmentExtractor: Send + Sync {
    fn extract(&self, data: &[u8]) -> Result<String, ExtractError>;
    fn supports(&self, format: FormatTag) -> bool;
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn AttachmentExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        let extractors: Vec<Box<dyn AttachmentExtractor>> = vec![
            Box::new(text::TextExtractor::new()),
            Box::new(pdf::PdfExtractor::new()),
            Box::new(docx::DocxExtractor::new()),
        ];
        Self { extractors }
    }

    /// Extracts text from an attachment, routing on the file extension.
    pub fn extract(&self, file_name: &str, data: &[u8]) -> Result<String, ExtractError> {
        let format = FormatTag::from_file_name(file_name).ok_or_else(|| {
            ExtractError::UnsupportedFormat(
                file_name
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_string())
                    .unwrap_or_default(),
            )
        })?;

        if format == FormatTag::Doc {
            return Err(ExtractError::LegacyDocFormat);
        }

        for extractor in &self.extractors {
            if extractor.supports(format) {
                return extractor.extract(data);
            }
        }

        Err(ExtractError::UnsupportedFormat(file_name.to_string()))
    }

    /// True when the file name carries an extension the pipeline accepts.
    /// Legacy .doc passes here so its failure gets recorded per attachment.
    pub fn accepts(file_name: &str) -> bool {
        FormatTag::from_file_name(file_name).is_some()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
