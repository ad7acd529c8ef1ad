//! Input representations accepted by the limit checks
//!
//! An [`Input`] is whatever the caller received from its client: raw text, a
//! list of text segments, a file path, a byte blob or a base64 payload. Media
//! modalities (audio, PDF, video) resolve it into a [`MediaSource`] before
//! handing it to a backend.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::outcome::Modality;

/// Caller-supplied input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A single string: text content, or a path/base64 payload for media
    Text(String),
    /// A sequence of strings: text segments, or image/DICOM references
    TextList(Vec<String>),
    /// A local file path
    Path(PathBuf),
    /// Raw binary content
    Bytes(Vec<u8>),
    /// Base64-encoded binary content
    Base64(String),
}

impl Input {
    /// Variant name, used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Input::Text(_) => "text",
            Input::TextList(_) => "text_list",
            Input::Path(_) => "path",
            Input::Bytes(_) => "bytes",
            Input::Base64(_) => "base64",
        }
    }

    /// Resolve a media input into something a backend can read.
    ///
    /// `Text` is a file path unless `hint` is [`FormatHint::Base64`]. `Bytes`
    /// ignores the hint.
    pub fn media_source(&self, modality: Modality, hint: FormatHint) -> Result<MediaSource<'_>> {
        match self {
            Input::Path(path) => MediaSource::file(path),
            Input::Bytes(bytes) => Ok(MediaSource::Memory(Cow::Borrowed(bytes))),
            Input::Base64(payload) => decode_base64(payload).map(MediaSource::from),
            Input::Text(text) => match hint {
                FormatHint::Base64 => decode_base64(text).map(MediaSource::from),
                FormatHint::Auto => MediaSource::file(Path::new(text)),
            },
            Input::TextList(_) => Err(Error::unexpected(
                modality,
                "file path, binary data or base64 string",
            )),
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<Vec<String>> for Input {
    fn from(items: Vec<String>) -> Self {
        Input::TextList(items)
    }
}

impl From<&[&str]> for Input {
    fn from(items: &[&str]) -> Self {
        Input::TextList(items.iter().map(|s| s.to_string()).collect())
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

/// How an ambiguous string input should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatHint {
    /// Strings are file paths
    #[default]
    Auto,
    /// Strings are base64 payloads
    Base64,
}

impl FromStr for FormatHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(FormatHint::Auto),
            "base64" => Ok(FormatHint::Base64),
            _ => Err(Error::InvalidFormatHint(s.to_string())),
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Auto => f.write_str("auto"),
            FormatHint::Base64 => f.write_str("base64"),
        }
    }
}

/// Media content as handed to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource<'a> {
    /// Existing file on disk
    File(&'a Path),
    /// In-memory content
    Memory(Cow<'a, [u8]>),
}

impl<'a> MediaSource<'a> {
    fn file(path: &'a Path) -> Result<Self> {
        if path.is_file() {
            Ok(MediaSource::File(path))
        } else {
            Err(Error::FileNotFound(path.to_path_buf()))
        }
    }

    /// File extension, if the source is a file
    pub fn extension(&self) -> Option<&str> {
        match self {
            MediaSource::File(path) => path.extension().and_then(|e| e.to_str()),
            MediaSource::Memory(_) => None,
        }
    }

    /// Short description for log messages
    pub fn describe(&self) -> String {
        match self {
            MediaSource::File(path) => path.display().to_string(),
            MediaSource::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<Vec<u8>> for MediaSource<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        MediaSource::Memory(Cow::Owned(bytes))
    }
}

/// Decode a base64 payload, tolerating a `data:<mime>;base64,` prefix and
/// surrounding whitespace.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    let payload = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => payload,
    };
    Ok(BASE64.decode(payload)?)
}
