//! Multipart upload handling
//!
//! Uploads are read fully into memory, then written to a per-request
//! temporary directory when a collaborator needs a path on disk. The
//! directory is removed when the [`ScopedUpload`] guard drops.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use mm_common::Error;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// One uploaded file with its sanitized name
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Files plus plain text fields of a multipart form
///
/// File parts whose name is empty or unusable land in `rejected` with the
/// name as sent. Single-file routes refuse them; batch routes skip them.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub rejected: Vec<String>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of the form
    ///
    /// Parts named `file`, `files` or `files[]` are uploads; everything else
    /// is a text field.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "files" | "files[]" => {
                    let original = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    match sanitize_filename(&original) {
                        Some(filename) => {
                            debug!(file = %filename, bytes = bytes.len(), "Received upload");
                            form.files.push(UploadedFile { filename, bytes });
                        }
                        None => {
                            debug!(file = %original, bytes = bytes.len(), "Upload has no usable filename");
                            form.rejected.push(original);
                        }
                    }
                }
                _ => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// The first uploaded file
    pub fn single_file(&self) -> ApiResult<&UploadedFile> {
        if let Some(original) = self.rejected.first() {
            return Err(invalid_filename(original));
        }
        self.files
            .first()
            .ok_or_else(|| Error::Validation("no file uploaded".to_string()).into())
    }

    /// Usable files of a batch
    ///
    /// Errors only when the form carried no file part at all; rejected parts
    /// count as per-file failures.
    pub fn require_files(&self) -> ApiResult<&[UploadedFile]> {
        if self.files.is_empty() && self.rejected.is_empty() {
            return Err(Error::Validation("no files uploaded".to_string()).into());
        }
        Ok(&self.files)
    }

    /// Boolean text field, `default` when absent
    pub fn bool_field(&self, name: &str, default: bool) -> ApiResult<bool> {
        match self.fields.get(name) {
            None => Ok(default),
            Some(value) => parse_bool(value).ok_or_else(|| {
                ApiError::BadRequest(format!("field '{}' must be a boolean, got '{}'", name, value))
            }),
        }
    }
}

fn invalid_filename(original: &str) -> ApiError {
    Error::Validation(format!("invalid or empty filename '{}'", original)).into()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Final path component of a client filename, without control characters
///
/// Returns `None` for names that are empty or only `.`/`..`.
pub fn sanitize_filename(original: &str) -> Option<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return None;
    }
    Some(cleaned.to_string())
}

/// Case-insensitive extension check
pub fn has_extension(filename: &str, extension: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

pub fn require_extension(file: &UploadedFile, extension: &str) -> ApiResult<()> {
    if has_extension(&file.filename, extension) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "'{}' is not a .{} file",
            file.filename, extension
        ))
        .into())
    }
}

/// Upload written to its own temporary directory
///
/// [`ScopedUpload::close`] removes the directory on the blocking pool.
/// Dropping the guard without closing removes it in place.
#[derive(Debug)]
pub struct ScopedUpload {
    path: PathBuf,
    dir: TempDir,
}

impl ScopedUpload {
    pub async fn write(file: &UploadedFile) -> ApiResult<Self> {
        let dir = tokio::task::spawn_blocking(|| {
            tempfile::Builder::new().prefix("mm-upload-").tempdir()
        })
        .await??;
        let path = dir.path().join(&file.filename);
        tokio::fs::write(&path, &file.bytes).await?;
        debug!(path = %path.display(), "Upload stored");
        Ok(Self { path, dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory; failures are logged, not returned
    pub async fn close(self) {
        let dir = self.dir;
        let removed = tokio::task::spawn_blocking(move || dir.close()).await;
        match removed {
            Ok(Ok(())) => debug!(path = %self.path.display(), "Upload removed"),
            Ok(Err(e)) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Upload cleanup task failed"),
        }
    }
}

/// CSV download response
pub fn csv_attachment(filename: &str, content: String) -> Response {
    let safe: String = filename
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("clip.mxf").as_deref(), Some("clip.mxf"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\media\\day1.ale").as_deref(), Some("day1.ale"));
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("dir/.."), None);
        assert_eq!(sanitize_filename("a\u{0}b.edl").as_deref(), Some("ab.edl"));
    }

    #[test]
    fn test_rejected_part_refused_for_single_file() {
        let form = UploadForm {
            files: vec![UploadedFile {
                filename: "day1.ale".to_string(),
                bytes: Bytes::from_static(b"Heading"),
            }],
            rejected: vec![String::new()],
            ..Default::default()
        };
        assert!(form.single_file().is_err());
        assert_eq!(form.require_files().unwrap().len(), 1);
    }

    #[test]
    fn test_only_rejected_parts_is_not_missing() {
        let form = UploadForm {
            rejected: vec!["..".to_string()],
            ..Default::default()
        };
        assert!(form.require_files().unwrap().is_empty());
        assert!(UploadForm::default().require_files().is_err());
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("day1.ALE", "ale"));
        assert!(!has_extension("day1.ale.txt", "ale"));
        assert!(!has_extension("ale", "ale"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool(" True "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[tokio::test]
    async fn test_scoped_upload_removed_on_close() {
        let file = UploadedFile {
            filename: "clip.mxf".to_string(),
            bytes: Bytes::from_static(b"data"),
        };
        let upload = ScopedUpload::write(&file).await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.ends_with("clip.mxf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        upload.close().await;
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_scoped_upload_removed_on_drop() {
        let file = UploadedFile {
            filename: "bin.avb".to_string(),
            bytes: Bytes::from_static(b"data"),
        };
        let upload = ScopedUpload::write(&file).await.unwrap();
        let dir = upload.path().parent().unwrap().to_path_buf();

        drop(upload);
        assert!(!dir.exists());
    }

    #[test]
    fn test_csv_attachment_headers() {
        let response = csv_attachment("day1.csv", "A\r\n".to_string());
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"day1.csv\""
        );
    }
}
