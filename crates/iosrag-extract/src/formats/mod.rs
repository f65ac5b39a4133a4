//! Per-format extraction, all synchronous over in-memory bytes.

mod delimited;
mod image;
mod ooxml;
mod pdf;

use std::fmt;

/// File formats the extractor understands, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Csv,
    Tsv,
    Text,
    Image,
}

const TEXT_EXTENSIONS: [&str; 12] = [
    "txt", "md", "markdown", "log", "cfg", "conf", "config", "ini", "json", "yaml", "yml", "xml",
];

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

impl Format {
    /// Format for `extension` (any case, no dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "pptx" => Some(Self::Pptx),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            e if TEXT_EXTENSIONS.contains(&e) => Some(Self::Text),
            e if IMAGE_EXTENSIONS.contains(&e) => Some(Self::Image),
            _ => None,
        }
    }

    /// Extract text from the raw file bytes.
    ///
    /// Errors are plain strings; the caller attaches the path.
    pub fn extract(self, bytes: &[u8], name: &str) -> Result<String, String> {
        match self {
            Self::Pdf => pdf::extract(bytes),
            Self::Docx => ooxml::extract_docx(bytes),
            Self::Xlsx => ooxml::extract_xlsx(bytes),
            Self::Pptx => ooxml::extract_pptx(bytes),
            Self::Csv => Ok(delimited::extract(bytes, ',')),
            Self::Tsv => Ok(delimited::extract(bytes, '\t')),
            Self::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Self::Image => Ok(image::describe(bytes, name)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Text => "text",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}
