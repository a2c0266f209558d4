//! Content-type resolution for uploads.
//!
//! Resolution order: static extension table, then (only when the name has no
//! extension at all) magic-byte sniffing of the first [`SNIFF_LEN`] bytes, then
//! `application/octet-stream`. The result is never empty.

mod sniff;

use std::borrow::Cow;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::debug;

pub use sniff::{sniff, SNIFF_LEN};

/// A MIME type attached to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType(Cow<'static, str>);

impl ContentType {
    pub const OCTET_STREAM: ContentType = ContentType(Cow::Borrowed("application/octet-stream"));

    /// Caller-supplied content type; blank values are rejected
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(Cow::Owned(value.trim().to_string())))
        }
    }

    const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.0.into_owned()
    }
}

/// Outcome of looking a name up in the extension table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionLookup {
    /// Extension present and mapped
    Known(ContentType),
    /// Extension present but not in the table
    Unknown,
    /// The final path segment has no `.` at all
    Missing,
}

/// Extension of the final path segment: everything after its last `.`.
///
/// `"archive."` yields `Some("")` and `".env"` yields `Some("env")`.
pub fn extension(name: &str) -> Option<&str> {
    let segment = name.rsplit(['/', '\\']).next().unwrap_or(name);
    segment.rfind('.').map(|idx| &segment[idx + 1..])
}

fn table_lookup(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        // images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        // video
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        // audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        // documents
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        // archives
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        // web assets
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        _ => return None,
    };
    Some(mime)
}

/// Table lookup only; never touches the content.
pub fn lookup(name: &str) -> ExtensionLookup {
    match extension(name) {
        None => ExtensionLookup::Missing,
        Some(ext) => match table_lookup(ext) {
            Some(mime) => ExtensionLookup::Known(ContentType::from_static(mime)),
            None => ExtensionLookup::Unknown,
        },
    }
}

/// Resolve the content type of an in-memory upload named `name`.
pub fn resolve_bytes(name: &str, data: &[u8]) -> ContentType {
    match lookup(name) {
        ExtensionLookup::Known(content_type) => content_type,
        ExtensionLookup::Unknown => ContentType::OCTET_STREAM,
        ExtensionLookup::Missing => sniff(data)
            .map(ContentType::from_static)
            .unwrap_or(ContentType::OCTET_STREAM),
    }
}

/// Resolve the content type of a file, reading its head only when the name
/// carries no extension.
pub async fn resolve_file(path: &Path) -> ContentType {
    let name = path.to_string_lossy();
    match lookup(&name) {
        ExtensionLookup::Known(content_type) => content_type,
        ExtensionLookup::Unknown => ContentType::OCTET_STREAM,
        ExtensionLookup::Missing => match read_head(path).await {
            Ok(head) => sniff(&head)
                .map(ContentType::from_static)
                .unwrap_or(ContentType::OCTET_STREAM),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "cannot read file for content sniffing");
                ContentType::OCTET_STREAM
            }
        },
    }
}

async fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    Ok(head)
}
