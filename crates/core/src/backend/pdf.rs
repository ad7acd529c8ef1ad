//! lopdf-backed page counter

use lopdf::Document;

use super::{PdfBackend, ProbeError, Result};
use crate::input::MediaSource;

/// PDF backend walking the document's page tree
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self, source: &MediaSource<'_>) -> Result<usize> {
        let document = match source {
            MediaSource::File(path) => Document::load(path),
            MediaSource::Memory(bytes) => Document::load_mem(bytes),
        }
        .map_err(|e| ProbeError::Open(e.to_string()))?;

        let pages = document.get_pages().len();
        tracing::debug!(pages, "counted PDF pages");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_pdf() {
        let backend = LopdfBackend::new();
        let result = backend.page_count(&MediaSource::from(b"hello world".to_vec()));
        assert!(matches!(result, Err(ProbeError::Open(_))));
    }
}
