use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TEXT_MODEL: &str = "deepseek/deepseek-r1-0528:free";
pub const DEFAULT_TEXT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_IMAGE_DIR: &str = "generated_images";
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub text_api_key: String,
    pub text_api_base: String,
    pub text_model: String,
    pub yandex_folder_id: String,
    pub yandex_api_key: String,
    pub image_dir: PathBuf,
    pub publish_interval: Duration,
    pub text_timeout: Duration,
    pub image_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so callers other than
    /// `from_env` (tests, mostly) can supply values without touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{}: environment variable not found", key))
        };
        let seconds = |key: &str, default: Duration| -> Result<Duration, String> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(0) => Err(format!("{}: must be greater than zero", key)),
                    Ok(secs) => Ok(Duration::from_secs(secs)),
                    Err(e) => Err(format!("{}: {}", key, e)),
                },
            }
        };

        Ok(Self {
            telegram_token: required("TG_TOKEN")?,
            telegram_chat_id: required("TG_CHAT_ID")?,
            text_api_key: required("DEEPSEEK_API_KEY")?,
            text_api_base: lookup("TEXT_API_BASE")
                .unwrap_or_else(|| DEFAULT_TEXT_API_BASE.to_string()),
            text_model: lookup("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            yandex_folder_id: required("YANDEX_FOLDER_ID")?,
            yandex_api_key: required("YANDEX_API_KEY")?,
            image_dir: lookup("IMAGE_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR), PathBuf::from),
            publish_interval: seconds("PUBLISH_INTERVAL_SECS", DEFAULT_PUBLISH_INTERVAL)?,
            text_timeout: seconds("TEXT_TIMEOUT_SECS", DEFAULT_TEXT_TIMEOUT)?,
            image_timeout: seconds("IMAGE_TIMEOUT_SECS", DEFAULT_IMAGE_TIMEOUT)?,
        })
    }
}
