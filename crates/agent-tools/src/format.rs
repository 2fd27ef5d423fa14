//! File formats understood by the conversion collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A file format, identified by its canonical extension.
///
/// Unknown extensions are kept verbatim in [`FileFormat::Other`] so a
/// directive naming an exotic target still reaches the converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileFormat {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Txt,
    Html,
    Png,
    Jpg,
    Webp,
    Gif,
    Other(String),
}

impl FileFormat {
    /// Parse a format name or extension (case-insensitive, leading dot and
    /// common synonyms accepted).
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" => Self::Pdf,
            "doc" => Self::Doc,
            "docx" | "word" => Self::Docx,
            "xls" => Self::Xls,
            "xlsx" | "excel" => Self::Xlsx,
            "ppt" => Self::Ppt,
            "pptx" | "powerpoint" => Self::Pptx,
            "txt" | "text" => Self::Txt,
            "html" | "htm" => Self::Html,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpg,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            _ => Self::Other(normalized),
        }
    }

    /// Infer the format of a file from its name's extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(Self::parse(ext))
    }

    /// Canonical extension without the dot.
    pub fn extension(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Ppt => "ppt",
            Self::Pptx => "pptx",
            Self::Txt => "txt",
            Self::Html => "html",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Other(ext) => ext,
        }
    }

    /// Media type for payloads in this format.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Ppt => "application/vnd.ms-powerpoint",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Txt => "text/plain",
            Self::Html => "text/html",
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Other(_) => "application/octet-stream",
        }
    }

    /// Whether this is a raster image format.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Webp | Self::Gif)
    }

    /// Default conversion target when nothing else names one.
    ///
    /// PDFs become Word documents; Word documents, spreadsheets and images
    /// become PDFs. Anything else has no default.
    pub fn default_target(&self) -> Option<Self> {
        match self {
            Self::Pdf => Some(Self::Docx),
            Self::Doc | Self::Docx | Self::Xls | Self::Xlsx => Some(Self::Pdf),
            format if format.is_image() => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl From<String> for FileFormat {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<FileFormat> for String {
    fn from(format: FileFormat) -> Self {
        format.extension().to_string()
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Replace the extension of `file_name` with the target format's.
///
/// A name without an extension gets one appended; an empty name becomes
/// `converted.<ext>`.
pub fn converted_file_name(file_name: &str, target: &FileFormat) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let stem = if stem.trim().is_empty() { "converted" } else { stem };
    format!("{}.{}", stem, target.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synonyms() {
        assert_eq!(FileFormat::parse("PDF"), FileFormat::Pdf);
        assert_eq!(FileFormat::parse(".jpeg"), FileFormat::Jpg);
        assert_eq!(FileFormat::parse("word"), FileFormat::Docx);
        assert_eq!(FileFormat::parse("odt"), FileFormat::Other("odt".to_string()));
    }

    #[test]
    fn test_default_targets() {
        assert_eq!(FileFormat::Pdf.default_target(), Some(FileFormat::Docx));
        assert_eq!(FileFormat::Doc.default_target(), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::Docx.default_target(), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::Xlsx.default_target(), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::Png.default_target(), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::Txt.default_target(), None);
    }

    #[test]
    fn test_from_file_name() {
        assert_eq!(FileFormat::from_file_name("report.PDF"), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::from_file_name("README"), None);
        assert_eq!(FileFormat::from_file_name(".bashrc"), None);
    }

    #[test]
    fn test_serde_as_extension_string() {
        let json = serde_json::to_string(&FileFormat::Docx).unwrap();
        assert_eq!(json, "\"docx\"");
        let parsed: FileFormat = serde_json::from_str("\"Excel\"").unwrap();
        assert_eq!(parsed, FileFormat::Xlsx);
    }

    #[test]
    fn test_converted_file_name() {
        assert_eq!(converted_file_name("notes.docx", &FileFormat::Pdf), "notes.pdf");
        assert_eq!(converted_file_name("a.b.pdf", &FileFormat::Docx), "a.b.docx");
        assert_eq!(converted_file_name("README", &FileFormat::Pdf), "README.pdf");
        assert_eq!(converted_file_name("", &FileFormat::Pdf), "converted.pdf");
    }
}
