//! Source resolution for PDF data

use crate::error::{Error, Result};
use crate::source::DocumentStore;
use base64::Engine;
use std::path::Path;

/// Resolved PDF data
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub source_name: String,
}

fn has_pdf_header(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}

/// Resolve a file path to PDF data
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(Error::Io)?;

    if !has_pdf_header(&data) {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ResolvedPdf { data, source_name })
}

/// Resolve base64 encoded data to PDF data. Surrounding whitespace and a
/// `data:application/pdf;base64,` prefix are tolerated.
pub fn resolve_base64(base64_data: &str) -> Result<ResolvedPdf> {
    let trimmed = base64_data.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((scheme, rest)) if scheme.starts_with("data:") => rest,
        _ => trimmed,
    };
    let data = base64::engine::general_purpose::STANDARD.decode(payload)?;

    if !has_pdf_header(&data) {
        return Err(Error::InvalidPdf {
            reason: "Decoded data is not a valid PDF file".to_string(),
        });
    }

    Ok(ResolvedPdf {
        data,
        source_name: "<base64>".to_string(),
    })
}

/// Resolve a stored document id to PDF data
pub fn resolve_stored(id: &str, store: &dyn DocumentStore) -> Result<ResolvedPdf> {
    let data = store.get(id).ok_or_else(|| Error::DocumentNotFound { id: id.to_string() })?;

    Ok(ResolvedPdf {
        data,
        source_name: format!("<document:{}>", id),
    })
}
