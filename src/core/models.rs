use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// The image description pulled out of a generated document, together with
/// the byte span of the whole `[ФОТО: ...]` directive in that document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDirective {
    pub description: String,
    pub span: Range<usize>,
}

/// Result of scanning a document for a photo directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub directive: Option<PhotoDirective>,
    /// Document with the first directive removed, trimmed.
    pub cleaned: String,
}

impl Extraction {
    /// The description to request an image for, if the document carried a
    /// directive with something inside it.
    #[must_use]
    pub fn image_description(&self) -> Option<&str> {
        self.directive
            .as_ref()
            .map(|d| d.description.as_str())
            .filter(|d| !d.is_empty())
    }
}

/// Formatting mode passed along with every outgoing Telegram message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
}

impl ParseMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
        }
    }
}

/// An image file written by the image generator and owned by exactly one
/// publish attempt.
///
/// Call [`GeneratedImage::discard`] when the attempt is finished with it. If
/// the handle is dropped without that, the file is removed synchronously in
/// `Drop` so no path out of an attempt leaves it behind.
#[derive(Debug)]
pub struct GeneratedImage {
    path: PathBuf,
    removed: bool,
}

impl GeneratedImage {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg")
            .to_string()
    }

    /// Reads the image bytes for upload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Deletes the file if it is still present. Failures are logged only.
    pub async fn discard(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed generated image {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove generated image {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for GeneratedImage {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Failed to remove generated image {} on drop: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Why an attempt that did publish fell back to a plain text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOnlyReason {
    NoDirective,
    ImageFailed,
}

/// The stage an attempt was in when it gave up without publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortStage {
    GenerateText,
    PublishTextOnly,
    PublishWithImage,
    Panicked,
}

impl fmt::Display for AbortStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AbortStage::GenerateText => "generate_text",
            AbortStage::PublishTextOnly => "publish_text_only",
            AbortStage::PublishWithImage => "publish_with_image",
            AbortStage::Panicked => "panicked",
        };
        f.write_str(name)
    }
}

/// Terminal state of a single publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    WithImage,
    TextOnly(TextOnlyReason),
    Aborted { stage: AbortStage, error: String },
}

impl PublishOutcome {
    #[must_use]
    pub fn is_published(&self) -> bool {
        !matches!(self, PublishOutcome::Aborted { .. })
    }
}
