//! Store configuration: the persisted fields, their validation, and
//! format-agnostic loading and saving.

use crate::mount::ShareBinding;
use crate::retry::RetryPolicy;
use crate::{Error, NormalizedPath, Result, io};
use regex::Regex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

static DRIVE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z]:$").expect("drive letter pattern is valid"));

/// Host suffix of Azure Files endpoints.
pub const DEFAULT_SHARE_HOST: &str = "file.core.windows.net";

/// Feed identifier used in indexing reports when none is configured.
pub const DEFAULT_FEED_ID: &str = "default";

/// Persisted store configuration as supplied by the host.
///
/// Every field may be absent on disk; [`StoreConfig::validate`] decides
/// which are required.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Drive designator to map the share to, e.g. `P:`.
    pub drive_letter: Option<String>,
    /// Root of the package tree; must be on `drive_letter`, e.g. `P:\ProGetPackages`.
    pub root_path: Option<String>,
    /// Share name on the storage account.
    pub file_share_name: Option<String>,
    /// Storage account name.
    pub user_name: Option<String>,
    /// Storage account access key.
    pub access_key: Option<String>,
    /// Log file; when unset, logs go to the console only.
    pub log_file_name: Option<PathBuf>,
    pub feed_id: Option<String>,
    pub share_host: Option<String>,
    pub retry: RetrySettings,
}

/// Retry settings for opening artifacts during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: policy.delay.as_millis() as u64,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        RetryPolicy::new(settings.max_attempts, Duration::from_millis(settings.delay_ms))
    }
}

/// A validated configuration, ready to build a store from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub root: NormalizedPath,
    pub binding: ShareBinding,
    pub retry: RetryPolicy,
    pub feed_id: String,
}

impl StoreConfig {
    /// Check the configuration before any I/O happens.
    ///
    /// # Errors
    ///
    /// [`Error::MissingValue`] for an absent or blank required field and
    /// [`Error::MalformedValue`] for a drive letter that is not `^[A-Za-z]:$`
    /// or a root path that is not on that drive.
    pub fn validate(&self) -> Result<StoreSettings> {
        let drive = required(&self.drive_letter, "drive_letter")?;
        if !DRIVE_LETTER.is_match(drive) {
            return Err(Error::malformed(
                "drive_letter",
                "must be a single drive letter (A-Z) followed by a colon",
            ));
        }

        let root = required(&self.root_path, "root_path")?;
        let root = NormalizedPath::new(root);
        if !root.starts_with_ignore_case(drive) {
            return Err(Error::malformed(
                "root_path",
                format!("must be on the drive {drive} (start with '{drive}\\')"),
            ));
        }

        let user_name = required(&self.user_name, "user_name")?;
        let access_key = required(&self.access_key, "access_key")?;
        let share_name = required(&self.file_share_name, "file_share_name")?;

        let host = self
            .share_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_SHARE_HOST);
        let remote = format!(r"\\{user_name}.{host}\{share_name}");

        let feed_id = self
            .feed_id
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FEED_ID)
            .to_string();

        Ok(StoreSettings {
            root,
            binding: ShareBinding::new(drive, remote, user_name, access_key),
            retry: self.retry.into(),
            feed_id,
        })
    }

    /// A fully populated example, used for `init`.
    pub fn template() -> Self {
        Self {
            drive_letter: Some("P:".to_string()),
            root_path: Some(r"P:\ProGetPackages".to_string()),
            file_share_name: Some("packages".to_string()),
            user_name: Some("storageaccount".to_string()),
            access_key: Some("<access key>".to_string()),
            log_file_name: None,
            feed_id: Some(DEFAULT_FEED_ID.to_string()),
            share_host: Some(DEFAULT_SHARE_HOST.to_string()),
            retry: RetrySettings::default(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("drive_letter", &self.drive_letter)
            .field("root_path", &self.root_path)
            .field("file_share_name", &self.file_share_name)
            .field("user_name", &self.user_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("log_file_name", &self.log_file_name)
            .field("feed_id", &self.feed_id)
            .field("share_host", &self.share_host)
            .field("retry", &self.retry)
            .finish()
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(Error::MissingValue { field })
}

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = ConfigFormat::of(path)?;
        let content = io::read_text(path)?;
        format.parse(&content).map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })
    }

    /// Save configuration to a file atomically.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = ConfigFormat::of(path)?;
        let content = format.render(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })?;
        io::write_atomic(path, content.as_bytes())
    }
}

/// Serialization format, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    fn of(path: &NormalizedPath) -> Result<Self> {
        let extension = path
            .file_name()
            .and_then(|name| name.rfind('.').filter(|idx| *idx > 0).map(|idx| &name[idx + 1..]))
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn render<T: Serialize>(self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}
