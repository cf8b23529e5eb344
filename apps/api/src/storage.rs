//! Object storage helpers (S3 / MinIO) and multipart upload reading.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// A single file read from a multipart request.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Reads the multipart field named `field`, enforcing `max_bytes`.
/// Other fields are ignored.
pub async fn read_upload(
    mut multipart: Multipart,
    field: &str,
    max_bytes: usize,
) -> Result<Upload, AppError> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part
            .file_name()
            .map(sanitize_file_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = part.content_type().map(str::to_string);
        let data = part
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} KiB limit",
                max_bytes / 1024
            )));
        }
        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }
    Err(AppError::Validation(format!("Missing multipart field '{field}'")))
}

/// Keeps only the final path component and a conservative character set.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(120)
        .collect()
}

pub async fn upload_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    data: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(data))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload of {key} failed: {e}")))?;
    info!("Uploaded s3://{bucket}/{key}");
    Ok(())
}

pub async fn delete_object(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Delete of {key} failed: {e}")))?;
    Ok(())
}

/// Time-limited GET URL so clients download straight from the bucket.
pub async fn presigned_url(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    let config = PresigningConfig::expires_in(ttl)
        .map_err(|e| AppError::S3(format!("Invalid presign TTL: {e}")))?;
    let request = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(config)
        .await
        .map_err(|e| AppError::S3(format!("Presign of {key} failed: {e}")))?;
    Ok(request.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_paths_and_symbols() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\My CV (1).pdf"), "My_CV__1_.pdf");
    }

    #[test]
    fn test_extension_lowercased() {
        let upload = Upload {
            file_name: "Placements.XLSX".to_string(),
            content_type: None,
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(upload.extension().as_deref(), Some("xlsx"));
    }

    #[test]
    fn test_extension_missing() {
        let upload = Upload {
            file_name: "README".to_string(),
            content_type: None,
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(upload.extension(), None);
    }
}
