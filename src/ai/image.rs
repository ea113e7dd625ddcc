//! Yandex ART image generation client
//!
//! Generation is asynchronous on Yandex's side: the request returns an
//! operation id which is polled until the image is ready.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::core::ImageGenerator;
use crate::core::models::GeneratedImage;
use crate::errors::PostError;
use crate::prompt::sanitize_image_prompt;

const GENERATION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/imageGenerationAsync";
const OPERATIONS_URL: &str = "https://llm.api.cloud.yandex.net/operations";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_RETRIES: usize = 3;

#[derive(Debug, Deserialize)]
struct OperationError {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

impl Operation {
    /// Returns the decoded image once the operation has finished, `None`
    /// while it is still running.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation failed or finished without an image.
    pub fn image_bytes(&self) -> Result<Option<Vec<u8>>, PostError> {
        if let Some(err) = &self.error {
            return Err(PostError::ImageGenerationError(format!(
                "operation {} failed (code {}): {}",
                self.id,
                err.code.unwrap_or_default(),
                err.message.as_deref().unwrap_or("unknown error")
            )));
        }
        if !self.done {
            return Ok(None);
        }

        let encoded = self
            .response
            .as_ref()
            .and_then(|r| r.image.as_deref())
            .ok_or_else(|| {
                PostError::ImageGenerationError(format!(
                    "operation {} finished without an image",
                    self.id
                ))
            })?;

        STANDARD.decode(encoded).map(Some).map_err(|e| {
            PostError::ImageGenerationError(format!("image is not valid base64: {}", e))
        })
    }
}

/// Builds a unique file name for a generated image.
#[must_use]
pub fn image_file_name() -> String {
    format!(
        "img_{}_{}.jpg",
        chrono::Utc::now().timestamp(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Writes image bytes under `dir`, creating the directory on first use.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or the file
/// cannot be written.
pub async fn write_image(dir: &Path, bytes: &[u8]) -> Result<GeneratedImage, PostError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(image_file_name());
    tokio::fs::write(&path, bytes).await?;
    debug!("Wrote {} image bytes to {}", bytes.len(), path.display());
    Ok(GeneratedImage::new(path))
}

pub struct ArtClient {
    http: Client,
    folder_id: String,
    api_key: String,
    output_dir: PathBuf,
}

impl ArtClient {
    #[must_use]
    pub fn new(folder_id: String, api_key: String, output_dir: PathBuf) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build image HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            http,
            folder_id,
            api_key,
            output_dir,
        }
    }

    #[must_use]
    pub fn request_body(&self, description: &str) -> Value {
        json!({
            "modelUri": format!("art://{}/yandex-art/latest", self.folder_id),
            "generationOptions": {
                "seed": rand_seed(),
                "aspectRatio": {
                    "widthRatio": "1",
                    "heightRatio": "1"
                }
            },
            "messages": [
                {
                    "weight": "1",
                    "text": description
                }
            ]
        })
    }

    async fn start(&self, description: &str) -> Result<Operation, PostError> {
        let response = self
            .http
            .post(GENERATION_URL)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&self.request_body(description))
            .send()
            .await?;
        Self::parse_operation(response).await
    }

    // Polling is a read, so transport failures are retried with backoff.
    // Error statuses and malformed bodies are returned as-is.
    async fn poll(&self, operation_id: &str) -> Result<Operation, PostError> {
        let strategy = poll_backoff().map(jitter).take(POLL_RETRIES);
        RetryIf::spawn(
            strategy,
            || async {
                let response = self
                    .http
                    .get(format!("{}/{}", OPERATIONS_URL, operation_id))
                    .header("Authorization", format!("Api-Key {}", self.api_key))
                    .send()
                    .await
                    .map_err(|e| {
                        warn!("Polling image operation {} failed: {}", operation_id, e);
                        PostError::from(e)
                    })?;
                Self::parse_operation(response).await
            },
            is_transient,
        )
        .await
    }

    async fn parse_operation(response: reqwest::Response) -> Result<Operation, PostError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(PostError::ImageGenerationError(format!(
                "status {}: {}",
                status, body
            )));
        }
        response.json::<Operation>().await.map_err(|e| {
            PostError::ImageGenerationError(format!("Failed to parse operation: {}", e))
        })
    }
}

/// Delays between poll retries: 200ms, 400ms, 800ms, capped at 2s.
fn poll_backoff() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(2))
}

fn is_transient(error: &PostError) -> bool {
    matches!(error, PostError::HttpError(_))
}

// Seeds only need to vary between requests, so the clock is good enough.
fn rand_seed() -> String {
    (chrono::Utc::now().timestamp_subsec_nanos() % 1_000_000).to_string()
}

#[async_trait]
impl ImageGenerator for ArtClient {
    async fn generate(&self, description: &str) -> Result<GeneratedImage, PostError> {
        let prompt = sanitize_image_prompt(description);
        if prompt.is_empty() {
            return Err(PostError::ImageGenerationError(
                "empty image description".to_string(),
            ));
        }

        let mut operation = self.start(&prompt).await?;
        info!("Started image generation operation {}", operation.id);

        let bytes = loop {
            if let Some(bytes) = operation.image_bytes()? {
                break bytes;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            operation = self.poll(&operation.id).await?;
        };

        info!(
            "Image operation {} finished with {} bytes",
            operation.id,
            bytes.len()
        );
        write_image(&self.output_dir, &bytes).await
    }
}
