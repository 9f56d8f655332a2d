//! Media host uploads
//!
//! Mix audio/covers and assistant tracks are stored on Cloudinary. Handlers
//! only see the [`MediaStore`] trait so tests can swap in a fake.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use zylo_common::config::CloudinaryConfig;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT_SECS: u64 = 120;

/// Media upload errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error(
        "Cloudinary not configured. Set CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, \
         CLOUDINARY_API_SECRET (not placeholder values)."
    )]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Cloudinary resource class; audio is stored as `video`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

/// A file to upload
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Vec<u8>,
    pub filename: String,
    pub folder: String,
    pub resource_type: ResourceType,
    pub content_type: Option<String>,
}

/// Stored asset as reported by the host
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedMedia {
    pub secure_url: String,
    pub public_id: String,
    pub resource_type: String,
    #[serde(default)]
    pub bytes: u64,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError>;
}

/// Store used when credentials are missing; every upload fails
#[derive(Debug, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl MediaStore for UnconfiguredStore {
    async fn upload(&self, _upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        Err(MediaError::NotConfigured)
    }
}

/// Pick the store for `config`
///
/// Missing credentials are not a startup error; uploads fail when attempted.
pub fn store_from_config(config: &CloudinaryConfig) -> Result<Arc<dyn MediaStore>, MediaError> {
    if !config.is_configured() {
        warn!("Cloudinary credentials not configured, media uploads disabled");
        return Ok(Arc::new(UnconfiguredStore));
    }

    info!("Cloudinary uploads enabled for cloud '{}'", config.cloud_name);
    Ok(Arc::new(CloudinaryStore::new(config)?))
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Signed uploads to the Cloudinary REST API
pub struct CloudinaryStore {
    http_client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    upload_preset: Option<String>,
}

impl CloudinaryStore {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, MediaError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| MediaError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: CLOUDINARY_API_BASE.to_string(),
            cloud_name: config.cloud_name.trim().to_string(),
            api_key: config.api_key.trim().to_string(),
            api_secret: config.api_secret.trim().to_string(),
            upload_preset: config.preset().map(str::to_string),
        })
    }

    async fn upload_once(
        &self,
        upload: &MediaUpload,
        use_preset: bool,
    ) -> Result<UploadedMedia, MediaError> {
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("folder", upload.folder.clone());
        params.insert("filename_override", upload.filename.clone());
        params.insert("use_filename", "true".to_string());
        params.insert("unique_filename", "true".to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        if use_preset {
            if let Some(preset) = &self.upload_preset {
                params.insert("upload_preset", preset.clone());
            }
        }
        let signature = sign_params(&params, &self.api_secret);

        let mut part = reqwest::multipart::Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone());
        if let Some(ct) = &upload.content_type {
            part = part
                .mime_str(ct)
                .map_err(|e| MediaError::Rejected(format!("Invalid content type '{}': {}", ct, e)))?;
        }

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key.to_string(), value);
        }

        let url = format!(
            "{}/{}/{}/upload",
            self.api_base,
            self.cloud_name,
            upload.resource_type.as_str()
        );
        debug!(folder = %upload.folder, filename = %upload.filename, "Uploading to Cloudinary");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Cloudinary upload failed ({})", status));
            return Err(MediaError::Rejected(message));
        }

        serde_json::from_str(&body).map_err(|e| MediaError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        let has_preset = self.upload_preset.is_some();

        match self.upload_once(&upload, has_preset).await {
            Err(MediaError::Rejected(msg)) if has_preset && is_preset_not_found(&msg) => {
                warn!("Upload preset rejected by Cloudinary, retrying as signed upload: {}", msg);
                self.upload_once(&upload, false).await
            }
            other => other,
        }
    }
}

/// Cloudinary request signature
///
/// Parameters are joined as `k=v` pairs in key order with `&`, the API
/// secret is appended, and the result is SHA-256 hashed (lowercase hex).
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_preset_not_found(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("upload preset") && m.contains("not found")
}
