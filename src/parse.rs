//! Text extraction for uploaded reference files.
//!
//! Dispatch is by file extension: plain-text formats are read as UTF-8,
//! PDFs go through `pdf-extract`, and OOXML containers (docx, xlsx) are
//! unpacked with `zip` and walked with `quick-xml`. The result is plain
//! text ready for the chunker, plus a [`DocumentKind`] classification.
//!
//! Extraction never panics: malformed input surfaces as a [`ParseError`]
//! and the ingestion pipeline skips the file.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;

use crate::models::DocumentKind;

/// Plain-text extensions ingested verbatim.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];
/// Source-code extensions ingested verbatim but tagged as code.
const CODE_EXTENSIONS: &[&str] = &["js", "ts", "json", "rs", "py", "toml", "yaml", "yml"];

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum worksheets processed per xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells read per worksheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;

#[derive(Debug)]
pub enum ParseError {
    UnsupportedExtension(String),
    Io(String),
    Pdf(String),
    Ooxml(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnsupportedExtension(ext) => write!(f, "unsupported file type: {}", ext),
            ParseError::Io(e) => write!(f, "read failed: {}", e),
            ParseError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ParseError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Extracted text plus its classification.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub content: String,
    pub kind: DocumentKind,
}

/// Parse a reference file into plain text, dispatching on extension.
pub fn parse_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        let kind = if ext == "txt" {
            DocumentKind::Text
        } else {
            DocumentKind::Markdown
        };
        return read_utf8(path).map(|content| ParsedFile { content, kind });
    }
    if CODE_EXTENSIONS.contains(&ext.as_str()) {
        return read_utf8(path).map(|content| ParsedFile {
            content,
            kind: DocumentKind::Code,
        });
    }

    match ext.as_str() {
        "pdf" => {
            let bytes = read_bytes(path)?;
            let content =
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ParseError::Pdf(e.to_string()))?;
            Ok(ParsedFile {
                content,
                kind: DocumentKind::Text,
            })
        }
        "docx" => {
            let bytes = read_bytes(path)?;
            Ok(ParsedFile {
                content: extract_docx(&bytes)?,
                kind: DocumentKind::Text,
            })
        }
        "xlsx" | "xls" => {
            let bytes = read_bytes(path)?;
            Ok(ParsedFile {
                content: extract_xlsx(&bytes)?,
                kind: DocumentKind::Text,
            })
        }
        other => Err(ParseError::UnsupportedExtension(other.to_string())),
    }
}

fn read_utf8(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|e| ParseError::Io(e.to_string()))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ParseError> {
    std::fs::read(path).map_err(|e| ParseError::Io(e.to_string()))
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ParseError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ParseError::Ooxml(e.to_string()))
}

fn read_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, ParseError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ParseError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ParseError::Io(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ParseError::Ooxml(format!(
            "ZIP entry {} exceeds size limit",
            name
        )));
    }
    Ok(out)
}

/// Word document: paragraphs live in `word/document.xml` as `<w:t>` runs,
/// with `<w:p>` paragraph boundaries mapped to blank-line separators so
/// the chunker sees the original paragraph structure.
fn extract_docx(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_entry(&mut archive, "word/document.xml")?;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    // No trim_text here: `<w:t>` runs carry significant spaces.
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Text(t)) if in_text_run => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if !out.ends_with("\n\n") && !out.is_empty() {
                        out.push_str("\n\n");
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

/// Spreadsheet: shared strings resolved per cell, one line per sheet.
fn extract_xlsx(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = open_archive(bytes)?;
    let shared = read_shared_strings(&mut archive)?;

    let mut sheets: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    sheets.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut lines = Vec::new();
    for name in sheets.into_iter().take(XLSX_MAX_SHEETS) {
        let xml = read_entry(&mut archive, &name)?;
        let cells = extract_sheet_cells(&xml, &shared)?;
        if !cells.is_empty() {
            lines.push(cells);
        }
    }
    Ok(lines.join("\n\n"))
}

fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ParseError> {
    // Absent when the workbook has no string cells.
    if !archive.file_names().any(|n| n == "xl/sharedStrings.xml") {
        return Ok(Vec::new());
    }
    let xml = read_entry(archive, "xl/sharedStrings.xml")?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_item = false;
    let mut in_text = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"t" if in_item => in_text = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                current.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn extract_sheet_cells(xml: &[u8], shared: &[String]) -> Result<String, ParseError> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut shared_cell = false;
    let mut in_value = false;
    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => {
                    shared_cell = e.attributes().any(|a| {
                        a.map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                }
                b"v" => in_value = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                let v = t.unescape().unwrap_or_default();
                let v = v.trim();
                if shared_cell {
                    if let Some(s) = v.parse::<usize>().ok().and_then(|i| shared.get(i)) {
                        cells.push(s.clone());
                    }
                } else if !v.is_empty() {
                    cells.push(v.to_string());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"c" => shared_cell = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = parse_file(Path::new("notes.bin")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedExtension(_)));
    }

    #[test]
    fn missing_text_file_is_an_io_error() {
        let err = parse_file(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn extension_maps_to_document_kind() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("a.txt", DocumentKind::Text),
            ("b.md", DocumentKind::Markdown),
            ("c.rs", DocumentKind::Code),
            ("d.json", DocumentKind::Code),
        ];
        for (name, kind) in cases {
            let p = dir.path().join(name);
            std::fs::write(&p, "content").unwrap();
            let parsed = parse_file(&p).unwrap();
            assert_eq!(parsed.kind, kind, "{}", name);
            assert_eq!(parsed.content, "content");
        }
    }

    #[test]
    fn invalid_pdf_is_a_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.pdf");
        std::fs::write(&p, b"not a pdf").unwrap();
        let err = parse_file(&p).unwrap_err();
        assert!(matches!(err, ParseError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_is_an_ooxml_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.docx");
        std::fs::write(&p, b"not a zip").unwrap();
        let err = parse_file(&p).unwrap_err();
        assert!(matches!(err, ParseError::Ooxml(_)));
    }

    #[test]
    fn docx_paragraphs_become_blank_line_separated() {
        let xml = br#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;
        let mut zip_bytes = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_bytes));
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            std::io::Write::write_all(&mut writer, xml).unwrap();
            writer.finish().unwrap();
        }
        let text = extract_docx(&zip_bytes).unwrap();
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }
}
