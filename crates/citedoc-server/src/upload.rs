//! Multipart upload handling with transient on-disk storage.
//!
//! The uploaded PDF is streamed into the upload directory under a random
//! name and owned by a [`TransientFile`] guard, which deletes it when dropped.
//! Handlers read the bytes with [`UploadedFile::take_bytes`], which removes
//! the file before the provider is called.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use citedoc_core::{Config, Error, Result};
use citedoc_provider::PDF_MEDIA_TYPE;

/// Multipart field that carries the document.
pub const FILE_FIELD: &str = "pdf";

const TRANSIENT_PREFIX: &str = "upload-";

/// What an upload must look like to be accepted.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub dir: PathBuf,
    pub field_name: &'static str,
    pub mime_type: &'static str,
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dir: config.upload_dir.clone(),
            field_name: FILE_FIELD,
            mime_type: PDF_MEDIA_TYPE,
            max_bytes: config.max_upload_bytes,
        }
    }

    fn accepts_mime(&self, content_type: Option<&str>) -> bool {
        content_type
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().eq_ignore_ascii_case(self.mime_type))
            .unwrap_or(false)
    }
}

/// A file in transient storage, deleted on drop.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    removed: bool,
}

impl TransientFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Repeated calls and already-missing files are ignored.
    pub fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.log_removal(std::fs::remove_file(&self.path));
    }

    /// Same as [`cleanup`](Self::cleanup) without blocking the runtime.
    pub async fn remove(&mut self) {
        if self.removed {
            return;
        }
        let result = tokio::fs::remove_file(&self.path).await;
        self.removed = true;
        self.log_removal(result);
    }

    fn log_removal(&self, result: std::io::Result<()>) {
        match result {
            Ok(()) => debug!("Removed transient upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// An accepted upload sitting in transient storage.
#[derive(Debug)]
pub struct UploadedFile {
    file: TransientFile,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadedFile {
    pub fn temporary_path(&self) -> &Path {
        self.file.path()
    }

    /// Read the stored bytes and delete the file, whether or not the read worked.
    pub async fn take_bytes(mut self) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(self.file.path()).await;
        self.file.remove().await;
        Ok(bytes?)
    }
}

/// Everything a multipart request carried.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// A text field, treating empty values as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Read a multipart request, storing at most one PDF under `policy`.
///
/// A request that is not multipart at all yields an empty form, so routes
/// report the missing file or field themselves.
pub async fn accept(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    policy: &UploadPolicy,
) -> Result<UploadForm> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Request is not multipart: {}", rejection.body_text());
            return Ok(UploadForm::default());
        }
    };

    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if field.file_name().is_none() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
            continue;
        }

        if name != policy.field_name {
            return Err(Error::Validation(format!("Unexpected file field: {}", name)));
        }
        if form.file.is_some() {
            return Err(Error::Validation("Only one PDF file may be uploaded".into()));
        }
        if !policy.accepts_mime(field.content_type()) {
            return Err(Error::Validation("Only PDF files are allowed".into()));
        }

        form.file = Some(store_field(field, policy).await?);
    }

    Ok(form)
}

async fn store_field(mut field: Field<'_>, policy: &UploadPolicy) -> Result<UploadedFile> {
    let original_name = field.file_name().unwrap_or("upload.pdf").to_string();
    let mime_type = field.content_type().unwrap_or(policy.mime_type).to_string();

    let path = policy
        .dir
        .join(format!("{}{}", TRANSIENT_PREFIX, uuid::Uuid::new_v4()));
    let file = TransientFile::new(path);
    let mut out = tokio::fs::File::create(file.path()).await?;

    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len();
        if size > policy.max_bytes {
            return Err(Error::Validation(format!(
                "File too large (max {} MB)",
                policy.max_bytes / (1024 * 1024)
            )));
        }
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    drop(out);

    debug!(
        "Stored upload {} ({} bytes) at {}",
        original_name,
        size,
        file.path().display()
    );

    Ok(UploadedFile {
        file,
        original_name,
        mime_type,
        size_bytes: size as u64,
    })
}

fn multipart_error(e: MultipartError) -> Error {
    Error::Validation(e.body_text())
}

/// Remove transient uploads left behind by a previous process.
pub fn sweep_stale(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let is_transient = entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with(TRANSIENT_PREFIX))
            .unwrap_or(false);
        if is_transient && entry.path().is_file() && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    removed
}
