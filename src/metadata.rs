//! The metadata-extractor collaborator.
//!
//! Title/author/page-count extraction is opaque to the OCR pipeline: the
//! desktop app already has parsers for each document family, so the core
//! just asks for a [`DocumentMetadata`] and renders whatever comes back.
//! The default extractor returns nothing, which the assembler handles by
//! omitting the metadata table.

use crate::output::DocumentMetadata;

/// Given the raw document bytes, return whatever metadata can be read.
///
/// Implementations must not fail: return a default-constructed
/// [`DocumentMetadata`] when nothing can be extracted.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> DocumentMetadata;
}

/// Extractor that reports no metadata.
pub struct NoMetadata;

impl MetadataExtractor for NoMetadata {
    fn extract(&self, _bytes: &[u8]) -> DocumentMetadata {
        DocumentMetadata::default()
    }
}
