use thiserror::Error;

use crate::models::image::InlineImage;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),
    #[error("Image '{file_name}' is {size} bytes, the limit is {limit}")]
    TooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },
    #[error("Form field '{field}' exceeds {limit} bytes")]
    FieldTooLarge { field: String, limit: usize },
    #[error("Failed to read upload: {0}")]
    Upload(String),
}

/// Resolves the MIME type of an upload from its content type, falling back to
/// the file extension when the browser sent a generic or missing type.
pub fn resolve_mime_type(content_type: Option<&str>, file_name: Option<&str>) -> Result<&'static str, ImageError> {
    if let Some(mime) = content_type.and_then(mime_for_content_type) {
        return Ok(mime);
    }

    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        _ => Err(ImageError::InvalidImageFormat(format!(
            "Unsupported file type: {}",
            content_type.unwrap_or("unknown")
        ))),
    }
}

fn mime_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

/// Converts one uploaded file to an inline image. Empty files yield `None`.
pub fn to_inline_image(
    bytes: &[u8],
    content_type: Option<&str>,
    file_name: Option<&str>,
    max_bytes: usize,
) -> Result<Option<InlineImage>, ImageError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            file_name: file_name.unwrap_or("upload").to_string(),
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let mime_type = resolve_mime_type(content_type, file_name)?;
    Ok(Some(InlineImage::from_bytes(bytes, mime_type)))
}
