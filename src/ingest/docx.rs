// src/ingest/docx.rs

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use zip::ZipArchive;

use super::{DocumentExtractor, IngestionError};

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p\b[^>]*?(?:/>|>(.*?)</w:p>)").expect("valid regex"));

static RUN_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)\b[^>]*/>")
        .expect("valid regex")
});

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex"));

/// Raw-text extraction from Office Open XML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

#[async_trait]
impl DocumentExtractor for DocxExtractor {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, IngestionError> {
        let result = tokio::task::spawn_blocking(move || extract_raw_text(&bytes))
            .await
            .map_err(IngestionError::document)?;

        if let Err(e) = &result {
            tracing::error!("Failed to read .docx: {}", e.reason());
        }
        result
    }
}

/// Reads `word/document.xml` out of the archive and flattens it to text.
pub fn extract_raw_text(bytes: &[u8]) -> Result<String, IngestionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IngestionError::document(format!("not a docx archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| IngestionError::document(format!("missing document part: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| IngestionError::document(format!("unreadable document part: {}", e)))?;

    Ok(document_xml_to_text(&xml))
}

/// One line per paragraph, paragraphs separated by a blank line.
pub fn document_xml_to_text(xml: &str) -> String {
    let paragraphs: Vec<String> = PARAGRAPH
        .captures_iter(xml)
        .map(|caps| caps.get(1).map(|body| paragraph_text(body.as_str())).unwrap_or_default())
        .collect();

    paragraphs.join("\n\n").trim_end().to_string()
}

fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for caps in RUN_CONTENT.captures_iter(body) {
        match caps.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn decode_entities(raw: &str) -> String {
    ENTITY
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::*;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p w:rsidR="00A1"><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
<w:r><w:t>Quang hợp</w:t></w:r><w:r><w:t xml:space="preserve"> là gì?</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>6CO&lt;sub&gt;2&lt;/sub&gt;</w:t><w:tab/><w:t>&amp; H&#8322;O</w:t><w:br/><w:t>next line</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
</w:body>
</w:document>"#;

    #[test]
    fn flattens_paragraphs_runs_and_entities() {
        let text = document_xml_to_text(BODY);

        assert_eq!(
            text,
            "Quang hợp là gì?\n\n\n\n6CO<sub>2</sub>\t& H₂O\nnext line\n\ncell"
        );
    }

    #[test]
    fn reads_document_part_from_archive() {
        let bytes = docx_with(BODY);
        let text = extract_raw_text(&bytes).unwrap();

        assert!(text.starts_with("Quang hợp là gì?"));
        assert!(text.ends_with("cell"));
    }

    #[test]
    fn non_archive_input_fails() {
        let err = extract_raw_text(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, IngestionError::Document { .. }));
    }

    #[test]
    fn archive_without_document_part_fails() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_raw_text(&bytes).unwrap_err();
        assert!(err.reason().starts_with("missing document part"));
    }
}
