// src/utils/data_url.rs

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,
    #[error("data URL has no payload separator")]
    MissingPayload,
    #[error("only base64 data URLs are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(String),
}

/// An in-memory `data:<mime>;base64,<payload>` blob, the format images travel
/// in between the browser, the cropper and the OCR engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
        let mime = header.strip_suffix(";base64").ok_or(DataUrlError::NotBase64)?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| DataUrlError::Decode(e.to_string()))?;

        let mime = if mime.is_empty() {
            "application/octet-stream"
        } else {
            mime
        };

        Ok(Self::new(mime, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// File extension matching the MIME type, for tools that sniff by name.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/tiff" => "tif",
            _ => "bin",
        }
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders() {
        let url = DataUrl::parse("data:image/png;base64,aGVsbG8=").unwrap();

        assert_eq!(url.mime, "image/png");
        assert_eq!(url.bytes, b"hello");
        assert_eq!(url.extension(), "png");
        assert_eq!(url.to_string(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn rejects_non_base64_urls() {
        assert_eq!(DataUrl::parse("image/png;base64,aGVsbG8="), Err(DataUrlError::MissingScheme));
        assert_eq!(DataUrl::parse("data:text/plain,hello"), Err(DataUrlError::NotBase64));
        assert_eq!(DataUrl::parse("data:image/png;base64"), Err(DataUrlError::MissingPayload));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64,@@@"),
            Err(DataUrlError::Decode(_))
        ));
    }
}
