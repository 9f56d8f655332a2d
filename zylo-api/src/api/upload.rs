//! Multipart form reading and file type checks

use axum::extract::Multipart;
use std::collections::HashMap;
use zylo_common::config::parse_flag;

use crate::media::{MediaUpload, ResourceType};
use crate::{ApiError, ApiResult};

/// A file part from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Lowercase extension after the last dot, or empty
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    fn mime(&self) -> String {
        self.content_type.as_deref().unwrap_or_default().to_lowercase()
    }

    pub fn into_media(self, folder: &str, resource_type: ResourceType) -> MediaUpload {
        MediaUpload {
            data: self.data,
            filename: self.filename,
            folder: folder.to_string(),
            resource_type,
            content_type: self.content_type,
        }
    }
}

/// mp3 or wav, by extension or MIME type
pub fn audio_allowed(file: &UploadedFile) -> bool {
    matches!(file.extension().as_str(), "mp3" | "wav")
        || matches!(
            file.mime().as_str(),
            "audio/mpeg" | "audio/mp3" | "audio/wav" | "audio/x-wav"
        )
}

/// jpg, png or webp, by extension or MIME type
pub fn cover_allowed(file: &UploadedFile) -> bool {
    matches!(file.extension().as_str(), "jpg" | "jpeg" | "png" | "webp")
        || matches!(file.mime().as_str(), "image/jpeg" | "image/png" | "image/webp")
}

/// Text fields and files of a multipart body
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drain the multipart stream
    ///
    /// Parts carrying a filename are files; an empty file part (no file
    /// chosen) is ignored.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?.to_vec();
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text field, `None` if absent or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Boolean field (`1/true/yes/y/on`, `0/false/no/n/off`)
    pub fn flag(&self, name: &str) -> ApiResult<Option<bool>> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => parse_flag(raw)
                .map(Some)
                .ok_or_else(|| ApiError::BadRequest(format!("{} must be a boolean", name))),
        }
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
