//! Text extraction from source files
//!
//! PDFs go through `pdf-extract`; `.txt` and `.md` files are read as UTF-8.
//! Page breaks (form feeds) in PDF output become blank lines so the
//! paragraph chunker treats each page edge as a boundary.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::{Error, Result};

/// Text pulled out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// File name including extension
    pub name: String,
    pub text: String,
}

/// Extract the text of the file at `path`.
pub fn extract_text(path: &Path) -> Result<String> {
    let name = file_name(path)?;
    let bytes = fs::read(path)
        .map_err(|e| Error::Extraction(format!("cannot read {}: {e}", path.display())))?;
    extract_bytes(&bytes, &name)
}

/// Extract text from file contents, choosing the format from `filename`.
pub fn extract_bytes(bytes: &[u8], filename: &str) -> Result<String> {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => extract_pdf(bytes, filename),
        Some("txt" | "md" | "markdown") | None => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Extraction(format!("{filename} is not valid UTF-8: {e}"))),
        Some(other) => Err(Error::Extraction(format!(
            "unsupported file type '.{other}' for {filename}"
        ))),
    }
}

fn extract_pdf(bytes: &[u8], filename: &str) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extraction(format!("{filename}: {e}")))?;

    if text.trim().is_empty() {
        warn!(file = filename, "PDF has no extractable text (scanned or image-only?)");
    }
    debug!(file = filename, chars = text.len(), "extracted PDF text");

    Ok(text.replace('\x0C', "\n\n"))
}

/// Extract every PDF directly inside `dir`, sorted by file name.
pub fn extract_directory(dir: &Path) -> Result<Vec<ExtractedFile>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::Extraction(format!("cannot read directory {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::Extraction(format!("cannot list {}: {e}", dir.display())))?
            .path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| {
            Ok(ExtractedFile {
                name: file_name(path)?,
                text: extract_text(path)?,
            })
        })
        .collect()
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Extraction(format!("{} has no file name", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_bytes(b"First.\n\nSecond.", "notes.txt").unwrap();
        assert_eq!(text, "First.\n\nSecond.");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert!(extract_bytes(b"# Title", "README.MD").is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract_bytes(b"PK", "slides.pptx").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains(".pptx"));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(extract_bytes(&[0xff, 0xfe, 0x00], "broken.txt").is_err());
    }

    #[test]
    fn test_garbage_pdf() {
        let err = extract_bytes(b"definitely not a pdf", "fake.pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_extract_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        fs::write(&path, "Meeting moved to Thursday.").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Meeting moved to Thursday.");
    }

    #[test]
    fn test_missing_file() {
        let err = extract_text(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_directory_only_picks_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let files = extract_directory(dir.path()).unwrap();
        assert!(files.is_empty());
    }
}
