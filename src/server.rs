//! MCP Server implementation using rmcp

use crate::error::Error;
use crate::form::{
    apply_edits, extract_fields, ClientField, DocumentModel, ImageOverlayElement, PageDimension,
    SkipReason, TextOverlayElement,
};
use crate::pdf::LopdfDocument;
use crate::source::{
    resolve_base64, resolve_path, resolve_stored, DocumentStore, LruDocumentStore, ResolvedPdf,
};
use anyhow::Result;
use base64::Engine;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Upload source
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
}

impl<'de> serde::Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let Some(obj) = value.as_object() else {
            return Err(serde::de::Error::custom(format!(
                "Invalid source: expected an object with \"path\" or \"base64\", but got {}",
                match &value {
                    serde_json::Value::Array(_) => "an array",
                    serde_json::Value::String(_) => "a string",
                    serde_json::Value::Number(_) => "a number",
                    serde_json::Value::Bool(_) => "a boolean",
                    serde_json::Value::Null => "null",
                    _ => "unknown type",
                }
            )));
        };

        for key in ["path", "base64"] {
            let Some(v) = obj.get(key) else {
                continue;
            };
            let Some(s) = v.as_str() else {
                return Err(serde::de::Error::custom(format!(
                    "\"{}\" must be a string",
                    key
                )));
            };
            return Ok(match key {
                "path" => PdfSource::Path {
                    path: s.to_string(),
                },
                _ => PdfSource::Base64 {
                    base64: s.to_string(),
                },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(serde::de::Error::custom(format!(
            "Invalid source: expected an object with \"path\" or \"base64\", but got keys: {:?}",
            keys
        )))
    }
}

/// Security and resource configuration for the PDF Form MCP Server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories `path` sources and output paths must stay within.
    /// Empty allows any path.
    pub resource_dirs: Vec<String>,
    /// Maximum total bytes of stored documents (default: 512MB)
    pub cache_max_bytes: usize,
    /// Maximum number of stored documents (default: 100)
    pub cache_max_entries: usize,
    /// Maximum accepted PDF size in bytes (default: 50MB)
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            cache_max_bytes: 512 * 1024 * 1024, // 512MB
            cache_max_entries: 100,
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// PDF Form MCP Server
#[derive(Clone)]
pub struct PdfFormServer {
    store: Arc<dyn DocumentStore>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for upload_pdf
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPdfParams {
    /// PDF to upload
    pub source: PdfSource,
    /// Original file name; must end in `.pdf`
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPdfResult {
    /// Document id for process_pdf, get_document and cleanup_document
    pub id: String,
    pub file_name: String,
    pub page_count: u32,
    pub form_fields: Vec<ClientField>,
    pub page_dimensions: Vec<PageDimension>,
    /// Native fields that could not be listed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for process_pdf
// ============================================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPdfParams {
    /// Id returned by upload_pdf (or a previous process_pdf)
    #[serde(default)]
    pub document_id: Option<String>,
    /// Inline PDF; takes precedence over documentId
    #[serde(default)]
    pub original_pdf_base64: Option<String>,
    /// Field edits; only name, type and value are read
    #[serde(default)]
    pub form_fields: Vec<ClientField>,
    #[serde(default)]
    pub text_elements: Vec<TextOverlayElement>,
    #[serde(default)]
    pub image_elements: Vec<ImageOverlayElement>,
    /// Optional path to save the output PDF
    #[serde(default)]
    pub output_path: Option<String>,
    /// Include the output PDF as base64 in the response
    #[serde(default)]
    pub return_base64: bool,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPdfResult {
    /// Suggested download name, `edited-document-YYYYMMDD-HHMMSS.pdf`
    pub file_name: String,
    /// Id of the stored output document
    pub output_document_id: String,
    pub page_count: u32,
    pub groups_applied: u32,
    pub groups_ignored: u32,
    pub overlays_placed: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for get_document / cleanup_document
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdParams {
    pub document_id: String,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentResult {
    pub document_id: String,
    pub size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupDocumentResult {
    pub document_id: String,
    /// Whether a stored document was removed
    pub removed: bool,
}

fn results_json<T: Serialize>(result: T) -> String {
    let response = serde_json::json!({ "results": [result] });
    serde_json::to_string_pretty(&response).unwrap_or_default()
}

#[tool_router]
impl PdfFormServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfFormServer with specified resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
            ..ServerConfig::default()
        })
    }

    /// Create a new PdfFormServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let store = LruDocumentStore::new(config.cache_max_entries, config.cache_max_bytes);
        Self::with_store(config, Arc::new(store))
    }

    /// Create a new PdfFormServer backed by a custom document store
    pub fn with_store(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Upload a PDF and list its editable structure
    #[tool(
        description = "Upload a PDF and get its editable structure: page count, page dimensions and form fields with their positions and current values.

A checkbox field with several widgets is listed once per widget as \"name#1\", \"name#2\", ... so each box can be set independently. Checkbox values are \"true\" or \"false\".

The PDF is stored under the returned id for use with process_pdf.

Source format: must be one of {\"path\": \"/absolute/path.pdf\"} or {\"base64\": \"...\"}"
    )]
    async fn upload_pdf(&self, Parameters(params): Parameters<UploadPdfParams>) -> String {
        let result = self.process_upload_pdf(&params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "upload_pdf failed");
            UploadPdfResult {
                error: Some(e.client_message()),
                ..UploadPdfResult::default()
            }
        });
        results_json(result)
    }

    /// Apply edits and overlays, then flatten
    #[tool(
        description = "Apply form field edits, add text and images, and produce a flattened (non-editable) PDF.

- formFields: entries from upload_pdf with changed values (name, type, value). Unknown names are ignored.
- textElements: {id, text, pageNumber, bounds {x, y, width, height}, fontFamily, fontSize, bold, italic, underline, strike, color \"#RRGGBB\"}. (x, y) is the bottom-left corner in PDF points; text wraps at width (200 when 0).
- imageElements: {id, imageData (base64 PNG/JPEG), pageNumber, bounds}. Scaled to fit when width and height are set.

Source: documentId from upload_pdf, or originalPdfBase64 (takes precedence). The output is always stored (outputDocumentId) for chaining."
    )]
    async fn process_pdf(&self, Parameters(params): Parameters<ProcessPdfParams>) -> String {
        let result = self.process_process_pdf(&params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "process_pdf failed");
            ProcessPdfResult {
                error: Some(e.client_message()),
                ..ProcessPdfResult::default()
            }
        });
        results_json(result)
    }

    /// Fetch a stored document
    #[tool(description = "Get a stored PDF (uploaded or produced by process_pdf) as base64.")]
    async fn get_document(&self, Parameters(params): Parameters<DocumentIdParams>) -> String {
        let result = self.process_get_document(&params).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "get_document failed");
            GetDocumentResult {
                document_id: params.document_id.clone(),
                error: Some(e.client_message()),
                ..GetDocumentResult::default()
            }
        });
        results_json(result)
    }

    /// Drop a stored document
    #[tool(description = "Remove a stored PDF. Removing an unknown id is not an error.")]
    async fn cleanup_document(&self, Parameters(params): Parameters<DocumentIdParams>) -> String {
        results_json(self.process_cleanup_document(&params))
    }
}

impl PdfFormServer {
    fn resolve_source(&self, source: &PdfSource) -> crate::error::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                self.validate_path_access(path)?;
                resolve_path(path)
            }
            PdfSource::Base64 { base64 } => {
                if base64.trim().is_empty() {
                    return Err(Error::UploadRejected {
                        reason: "No file uploaded".to_string(),
                    });
                }
                resolve_base64(base64)
            }
        }
    }

    fn check_size(&self, data: &[u8]) -> crate::error::Result<()> {
        if data.len() > self.config.max_upload_bytes {
            return Err(Error::UploadRejected {
                reason: format!(
                    "File too large ({} bytes, maximum {})",
                    data.len(),
                    self.config.max_upload_bytes
                ),
            });
        }
        Ok(())
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<std::path::PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(std::path::PathBuf::from(path));
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| Error::PathAccessDenied {
            path: path.to_string(),
        })?;

        self.within_resource_dirs(canonical, path)
    }

    /// Validate an output path. The parent directory is canonicalized since
    /// the file itself may not exist yet.
    fn validate_output_path_access(&self, path: &str) -> crate::error::Result<std::path::PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(std::path::PathBuf::from(path));
        }

        let target = Path::new(path);
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let canonical_parent = std::fs::canonicalize(parent).map_err(|_| Error::PathAccessDenied {
            path: path.to_string(),
        })?;
        let file_name = target.file_name().ok_or_else(|| Error::PathAccessDenied {
            path: path.to_string(),
        })?;

        self.within_resource_dirs(canonical_parent.join(file_name), path)
    }

    fn within_resource_dirs(
        &self,
        canonical: std::path::PathBuf,
        requested: &str,
    ) -> crate::error::Result<std::path::PathBuf> {
        let allowed = self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|dir| canonical.starts_with(dir))
                .unwrap_or(false)
        });
        if allowed {
            Ok(canonical)
        } else {
            Err(Error::PathAccessDenied {
                path: requested.to_string(),
            })
        }
    }

    /// Write output data to a file path, with sandbox validation.
    fn write_output(
        &self,
        output_path: &Option<String>,
        data: &[u8],
    ) -> crate::error::Result<Option<String>> {
        let Some(path_str) = output_path else {
            return Ok(None);
        };
        let path = self.validate_output_path_access(path_str)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&path, data)?;
        Ok(Some(path_str.clone()))
    }

    pub async fn process_upload_pdf(
        &self,
        params: &UploadPdfParams,
    ) -> crate::error::Result<UploadPdfResult> {
        if let Some(name) = &params.file_name {
            if !name.to_lowercase().ends_with(".pdf") {
                return Err(Error::UploadRejected {
                    reason: "Only PDF files are allowed".to_string(),
                });
            }
        }

        let resolved = self.resolve_source(&params.source)?;
        self.check_size(&resolved.data)?;

        let file_name = params.file_name.clone().unwrap_or_else(|| {
            if resolved.source_name.starts_with('<') {
                "document.pdf".to_string()
            } else {
                resolved.source_name.clone()
            }
        });

        // Parsing and field extraction are CPU-bound
        let data = resolved.data;
        let (form, data) = tokio::task::spawn_blocking(move || {
            let doc = LopdfDocument::load(&data)?;
            let form = extract_fields(&doc);
            Ok::<_, Error>((form, data))
        })
        .await
        .map_err(|e| Error::TaskJoin {
            reason: e.to_string(),
        })??;

        let id = self.store.put(data)?;
        tracing::info!(
            id = %id,
            pages = form.page_count,
            fields = form.fields.len(),
            skipped = form.skipped.len(),
            "Uploaded PDF"
        );

        Ok(UploadPdfResult {
            id,
            file_name,
            page_count: form.page_count,
            form_fields: form.fields,
            page_dimensions: form.page_dimensions,
            skipped: form.skipped,
            error: None,
        })
    }

    pub async fn process_process_pdf(
        &self,
        params: &ProcessPdfParams,
    ) -> crate::error::Result<ProcessPdfResult> {
        let inline = params
            .original_pdf_base64
            .as_deref()
            .filter(|b64| !b64.trim().is_empty());
        let resolved = match (inline, params.document_id.as_deref()) {
            (Some(b64), _) => resolve_base64(b64)?,
            (None, Some(id)) => resolve_stored(id, self.store.as_ref())?,
            (None, None) => return Err(Error::MissingSource),
        };
        self.check_size(&resolved.data)?;
        tracing::debug!(source = %resolved.source_name, "Processing PDF");

        let data = resolved.data;
        let edits = params.form_fields.clone();
        let texts = params.text_elements.clone();
        let images = params.image_elements.clone();

        let (output, report, page_count) = tokio::task::spawn_blocking(move || {
            let mut doc = LopdfDocument::load(&data)?;
            let report = apply_edits(&mut doc, &edits, &texts, &images)?;
            let page_count = doc.page_count();
            let output = doc.save()?;
            Ok::<_, Error>((output, report, page_count))
        })
        .await
        .map_err(|e| Error::TaskJoin {
            reason: e.to_string(),
        })??;

        let output_path = self.write_output(&params.output_path, &output)?;
        let pdf_base64 = params
            .return_base64
            .then(|| base64::engine::general_purpose::STANDARD.encode(&output));

        // Always store the output for chaining operations
        let output_document_id = self.store.put(output)?;

        tracing::info!(
            output = %output_document_id,
            applied = report.groups_applied,
            ignored = report.groups_ignored,
            overlays = report.overlays_placed,
            skipped = report.skipped.len(),
            "Processed PDF"
        );

        Ok(ProcessPdfResult {
            file_name: output_file_name(chrono::Local::now()),
            output_document_id,
            page_count,
            groups_applied: report.groups_applied,
            groups_ignored: report.groups_ignored,
            overlays_placed: report.overlays_placed,
            skipped: report.skipped,
            output_path,
            pdf_base64,
            error: None,
        })
    }

    pub fn process_get_document(
        &self,
        params: &DocumentIdParams,
    ) -> crate::error::Result<GetDocumentResult> {
        let resolved = resolve_stored(&params.document_id, self.store.as_ref())?;
        Ok(GetDocumentResult {
            document_id: params.document_id.clone(),
            size_bytes: resolved.data.len(),
            pdf_base64: Some(base64::engine::general_purpose::STANDARD.encode(&resolved.data)),
            error: None,
        })
    }

    pub fn process_cleanup_document(&self, params: &DocumentIdParams) -> CleanupDocumentResult {
        let removed = self.store.remove(&params.document_id);
        tracing::debug!(id = %params.document_id, removed, "Cleanup document");
        CleanupDocumentResult {
            document_id: params.document_id.clone(),
            removed,
        }
    }
}

/// Download name for a processed document
fn output_file_name<Tz: chrono::TimeZone>(now: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("edited-document-{}.pdf", now.format("%Y%m%d-%H%M%S"))
}

impl Default for PdfFormServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfFormServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Form MCP Server lets you upload a PDF, inspect its form fields, \
                 fill them, add text and images, and download a flattened result. \
                 Call upload_pdf first, then process_pdf with the returned id."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server without resource directories
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with specified resource directories
pub async fn run_server_with_dirs(resource_dirs: Vec<String>) -> Result<()> {
    run_server_with_config(ServerConfig {
        resource_dirs,
        ..ServerConfig::default()
    })
    .await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfFormServer::with_config(config);

    tracing::info!("PDF Form MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
