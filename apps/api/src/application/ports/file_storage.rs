use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    validators::{is_document_content_type, is_image_content_type},
};

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Receipts and store documents: images or PDF.
    pub fn ensure_document(&self, field: &str) -> AppResult<()> {
        self.ensure_non_empty(field)?;
        if !is_document_content_type(&self.content_type) {
            return Err(AppError::field(
                field,
                format!("The {field} must be a file of type: png, jpg, webp, pdf"),
            ));
        }
        Ok(())
    }

    pub fn ensure_image(&self, field: &str) -> AppResult<()> {
        self.ensure_non_empty(field)?;
        if !is_image_content_type(&self.content_type) {
            return Err(AppError::field(
                field,
                format!("The {field} must be an image (png, jpg, webp)"),
            ));
        }
        Ok(())
    }

    fn ensure_non_empty(&self, field: &str) -> AppResult<()> {
        if self.bytes.is_empty() {
            return Err(AppError::field(field, format!("The {field} is empty")));
        }
        Ok(())
    }

    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }
}

/// Public disk used for logos, receipts and documents.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores the upload under `dir` and returns its path relative to the disk root.
    async fn put(&self, dir: &str, upload: &Upload) -> AppResult<String>;
    async fn delete(&self, path: &str) -> AppResult<()>;
    fn public_url(&self, path: &str) -> String;
}
