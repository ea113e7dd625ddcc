use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use zenpost::ai::image::write_image;
use zenpost::content::ELLIPSIS;
use zenpost::core::models::{
    AbortStage, GeneratedImage, ParseMode, PublishOutcome, TextOnlyReason,
};
use zenpost::core::{ImageGenerator, TextGenerator, Transport};
use zenpost::errors::PostError;
use zenpost::worker::{PublishSettings, Publisher, compose_caption};

const CHAT: &str = "@test_channel";

enum TextBehavior {
    Reply(String),
    Fail,
    Hang,
}

struct FakeText {
    behavior: TextBehavior,
    prompts: Mutex<Vec<String>>,
}

impl FakeText {
    fn new(behavior: TextBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn replying(text: &str) -> Arc<Self> {
        Self::new(TextBehavior::Reply(text.to_string()))
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, prompt: &str) -> Result<String, PostError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            TextBehavior::Reply(text) => Ok(text.clone()),
            TextBehavior::Fail => Err(PostError::TextGenerationError(
                "upstream unavailable".to_string(),
            )),
            TextBehavior::Hang => std::future::pending().await,
        }
    }
}

struct FakeImage {
    dir: PathBuf,
    fail: bool,
    hang: bool,
    descriptions: Mutex<Vec<String>>,
    written: Mutex<Vec<PathBuf>>,
}

impl FakeImage {
    fn new(dir: &Path, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            dir: dir.to_path_buf(),
            fail,
            hang: false,
            descriptions: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
        })
    }

    fn hanging(dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            dir: dir.to_path_buf(),
            fail: false,
            hang: true,
            descriptions: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn generate(&self, description: &str) -> Result<GeneratedImage, PostError> {
        self.descriptions
            .lock()
            .unwrap()
            .push(description.to_string());
        if self.fail {
            return Err(PostError::ImageGenerationError("model refused".to_string()));
        }
        if self.hang {
            return std::future::pending().await;
        }
        let image = write_image(&self.dir, b"\xFF\xD8\xFFfake-jpeg").await?;
        self.written.lock().unwrap().push(image.path().to_path_buf());
        Ok(image)
    }
}

#[derive(Debug, Clone)]
struct SentPhoto {
    chat_id: String,
    caption: String,
    bytes: usize,
    file_name: String,
}

#[derive(Default)]
struct FakeTransport {
    fail_messages: bool,
    fail_photos: bool,
    messages: Mutex<Vec<(String, String, ParseMode)>>,
    photos: Mutex<Vec<SentPhoto>>,
}

impl FakeTransport {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn messages(&self) -> Vec<(String, String, ParseMode)> {
        self.messages.lock().unwrap().clone()
    }

    fn photos(&self) -> Vec<SentPhoto> {
        self.photos.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        if self.fail_messages {
            return Err(PostError::TelegramError("Forbidden".to_string()));
        }
        self.messages
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string(), parse_mode));
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        photo: Vec<u8>,
        file_name: &str,
        caption: &str,
        _parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        if self.fail_photos {
            return Err(PostError::TelegramError("Request Entity Too Large".to_string()));
        }
        self.photos.lock().unwrap().push(SentPhoto {
            chat_id: chat_id.to_string(),
            caption: caption.to_string(),
            bytes: photo.len(),
            file_name: file_name.to_string(),
        });
        Ok(())
    }
}

fn settings() -> PublishSettings {
    PublishSettings {
        chat_id: CHAT.to_string(),
        prompt: "write a post".to_string(),
        text_timeout: Duration::from_secs(5),
        image_timeout: Duration::from_secs(5),
    }
}

fn publisher(
    text: Arc<FakeText>,
    image: Arc<FakeImage>,
    transport: Arc<FakeTransport>,
) -> Publisher {
    Publisher::new(text, image, transport, settings())
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_photo_post_with_caption_and_cleanup() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("generated_images");
    let text = FakeText::replying("<h1>Title</h1>\n[ФОТО: a red fox]\nBody text");
    let image = FakeImage::new(&images, false);
    let transport = FakeTransport::ok();

    let outcome = publisher(text.clone(), image.clone(), transport.clone())
        .run_attempt()
        .await;

    assert_eq!(outcome, PublishOutcome::WithImage);
    assert_eq!(*text.prompts.lock().unwrap(), vec!["write a post".to_string()]);
    assert_eq!(*image.descriptions.lock().unwrap(), vec!["a red fox".to_string()]);
    assert!(transport.messages().is_empty());

    let photos = transport.photos();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].chat_id, CHAT);
    assert_eq!(photos[0].caption, "<b>Title</b>");
    assert_eq!(photos[0].bytes, 12);
    assert!(photos[0].file_name.starts_with("img_"));

    let written = image.written.lock().unwrap().clone();
    assert_eq!(written.len(), 1);
    assert!(!written[0].exists(), "image file should be removed after posting");
    assert_eq!(files_in(&images), 0);
}

#[tokio::test]
async fn test_no_directive_posts_text_only() {
    let tmp = TempDir::new().unwrap();
    let text = FakeText::replying("  <h2>News</h2><p>Just words</p><br>Bye  ");
    let image = FakeImage::new(tmp.path(), false);
    let transport = FakeTransport::ok();

    let outcome = publisher(text, image.clone(), transport.clone())
        .run_attempt()
        .await;

    assert_eq!(outcome, PublishOutcome::TextOnly(TextOnlyReason::NoDirective));
    assert!(image.descriptions.lock().unwrap().is_empty());
    assert!(transport.photos().is_empty());
    assert_eq!(
        transport.messages(),
        vec![(
            CHAT.to_string(),
            "<b>News</b>Just words\nBye".to_string(),
            ParseMode::Html
        )]
    );
}

#[tokio::test]
async fn test_image_failure_falls_back_to_cleaned_text() {
    let tmp = TempDir::new().unwrap();
    let text = FakeText::replying("<h1>Title</h1>\n[ФОТО: a red fox]\nBody text");
    let image = FakeImage::new(tmp.path(), true);
    let transport = FakeTransport::ok();

    let outcome = publisher(text, image.clone(), transport.clone())
        .run_attempt()
        .await;

    assert_eq!(outcome, PublishOutcome::TextOnly(TextOnlyReason::ImageFailed));
    assert_eq!(image.descriptions.lock().unwrap().len(), 1);
    assert!(transport.photos().is_empty(), "sendPhoto must never be called");

    let messages = transport.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1, "<b>Title</b>\n\nBody text");
    assert!(!messages[0].1.contains("ФОТО"));
}

#[tokio::test]
async fn test_empty_description_skips_image_generation() {
    let tmp = TempDir::new().unwrap();
    let text = FakeText::replying("Body\n[ФОТО: ]");
    let image = FakeImage::new(tmp.path(), false);
    let transport = FakeTransport::ok();

    let outcome = publisher(text, image.clone(), transport.clone())
        .run_attempt()
        .await;

    assert_eq!(outcome, PublishOutcome::TextOnly(TextOnlyReason::NoDirective));
    assert!(image.descriptions.lock().unwrap().is_empty());
    assert_eq!(transport.messages()[0].1, "Body");
}

#[tokio::test]
async fn test_long_text_only_post_is_truncated() {
    let tmp = TempDir::new().unwrap();
    let document = format!("<b>Start</b>\n{}", "а".repeat(3000));
    let text = FakeText::replying(&document);
    let transport = FakeTransport::ok();

    publisher(text, FakeImage::new(tmp.path(), false), transport.clone())
        .run_attempt()
        .await;

    let message = &transport.messages()[0].1;
    assert_eq!(message.chars().count(), 1024);
    assert!(message.ends_with(ELLIPSIS));
    assert!(message.starts_with("<b>Start</b>"));
}

#[tokio::test]
async fn test_long_caption_is_truncated() {
    let tmp = TempDir::new().unwrap();
    let document = format!("{}\n[ФОТО: sea]\nsecond line", "б".repeat(2000));
    let text = FakeText::replying(&document);
    let transport = FakeTransport::ok();

    let outcome = publisher(text, FakeImage::new(tmp.path(), false), transport.clone())
        .run_attempt()
        .await;

    assert_eq!(outcome, PublishOutcome::WithImage);
    let caption = &transport.photos()[0].caption;
    assert_eq!(caption.chars().count(), 1024);
    assert!(caption.ends_with(ELLIPSIS));
}

#[tokio::test]
async fn test_text_failure_publishes_nothing() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("generated_images");
    let image = FakeImage::new(&images, false);
    let transport = FakeTransport::ok();

    let outcome = publisher(FakeText::new(TextBehavior::Fail), image.clone(), transport.clone())
        .run_attempt()
        .await;

    match outcome {
        PublishOutcome::Aborted { stage, error } => {
            assert_eq!(stage, AbortStage::GenerateText);
            assert!(error.contains("upstream unavailable"));
        }
        other => panic!("Unexpected outcome: {other:?}"),
    }
    assert!(transport.messages().is_empty());
    assert!(transport.photos().is_empty());
    assert!(image.descriptions.lock().unwrap().is_empty());
    assert!(!images.exists(), "no image files should be created");
}

#[tokio::test]
async fn test_blank_document_publishes_nothing() {
    let tmp = TempDir::new().unwrap();
    let transport = FakeTransport::ok();

    let outcome = publisher(
        FakeText::replying("   \n "),
        FakeImage::new(tmp.path(), false),
        transport.clone(),
    )
    .run_attempt()
    .await;

    assert!(!outcome.is_published());
    assert!(transport.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_text_generation_times_out() {
    let tmp = TempDir::new().unwrap();
    let transport = FakeTransport::ok();

    let outcome = publisher(
        FakeText::new(TextBehavior::Hang),
        FakeImage::new(tmp.path(), false),
        transport.clone(),
    )
    .run_attempt()
    .await;

    match outcome {
        PublishOutcome::Aborted { stage, error } => {
            assert_eq!(stage, AbortStage::GenerateText);
            assert!(error.contains("Timed out"), "unexpected error: {error}");
        }
        other => panic!("Unexpected outcome: {other:?}"),
    }
    assert!(transport.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_image_generation_falls_back_to_text() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("generated_images");
    let image = FakeImage::hanging(&images);
    let transport = FakeTransport::ok();

    let outcome = publisher(
        FakeText::replying("<h1>Title</h1>\n[ФОТО: a red fox]\nBody text"),
        image.clone(),
        transport.clone(),
    )
    .run_attempt()
    .await;

    assert_eq!(outcome, PublishOutcome::TextOnly(TextOnlyReason::ImageFailed));
    assert_eq!(*image.descriptions.lock().unwrap(), vec!["a red fox".to_string()]);
    assert!(transport.photos().is_empty(), "sendPhoto must never be called");
    assert_eq!(
        transport.messages(),
        vec![(
            CHAT.to_string(),
            "<b>Title</b>\n\nBody text".to_string(),
            ParseMode::Html
        )]
    );
    assert_eq!(files_in(&images), 0);
}

#[tokio::test]
async fn test_failed_photo_send_still_removes_image() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("generated_images");
    let image = FakeImage::new(&images, false);
    let transport = Arc::new(FakeTransport {
        fail_photos: true,
        ..FakeTransport::default()
    });

    let outcome = publisher(
        FakeText::replying("Title\n[ФОТО: a lighthouse]\nBody"),
        image.clone(),
        transport.clone(),
    )
    .run_attempt()
    .await;

    assert!(matches!(
        outcome,
        PublishOutcome::Aborted {
            stage: AbortStage::PublishWithImage,
            ..
        }
    ));
    assert!(transport.messages().is_empty(), "no text fallback after a send failure");
    let written = image.written.lock().unwrap().clone();
    assert_eq!(written.len(), 1);
    assert!(!written[0].exists());
    assert_eq!(files_in(&images), 0);
}

#[tokio::test]
async fn test_failed_text_send_is_contained() {
    let tmp = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport {
        fail_messages: true,
        ..FakeTransport::default()
    });

    let outcome = publisher(
        FakeText::replying("No picture today"),
        FakeImage::new(tmp.path(), false),
        transport,
    )
    .run_attempt()
    .await;

    assert!(matches!(
        outcome,
        PublishOutcome::Aborted {
            stage: AbortStage::PublishTextOnly,
            ..
        }
    ));
}

#[test]
fn test_caption_uses_first_two_lines() {
    assert_eq!(compose_caption("One\nTwo\nThree"), "One\nTwo");
    assert_eq!(compose_caption("Only line"), "Only line");
    assert_eq!(compose_caption("<h1>T</h1>\n<p>Lead</p>\nRest"), "<b>T</b>\nLead");
    assert_eq!(compose_caption(""), "");
}

#[test]
fn test_dropped_image_handle_removes_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("img_orphan.jpg");
    std::fs::write(&path, b"bytes").unwrap();

    drop(GeneratedImage::new(path.clone()));
    assert!(!path.exists());
}
