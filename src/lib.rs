//! PDF Form MCP Server Library
//!
//! This crate provides MCP tools for editing PDF forms:
//! - `upload_pdf`: Store a PDF and list its pages and form fields
//! - `process_pdf`: Apply field edits and overlays, then flatten
//! - `get_document`: Fetch a stored PDF as base64
//! - `cleanup_document`: Drop a stored PDF
//!
//! The form logic in [`form`] is independent of the PDF library; [`pdf`]
//! implements its [`form::DocumentModel`] on top of lopdf.

pub mod error;
pub mod form;
pub mod pdf;
pub mod server;
pub mod source;

pub use error::{Error, Result};
pub use form::{apply_edits, extract_fields, ApplyReport, ClientField, ExtractedForm, FieldType};
pub use pdf::LopdfDocument;
pub use server::{
    run_server, run_server_with_config, run_server_with_dirs, PdfFormServer, PdfSource,
    ProcessPdfParams, ProcessPdfResult, ServerConfig, UploadPdfParams, UploadPdfResult,
};
pub use source::{DocumentStore, LruDocumentStore};
