//! Configuration management for pagesum using the prefer crate.
//!
//! Settings are layered: built-in defaults, then a config file (discovered
//! by prefer or given with `--config`), then environment variables, then
//! command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::{LlmClient, LlmConfig, StubSummarizer, Summarizer};
use crate::ocr::{OcrError, OcrSpaceClient, OcrSpaceConfig, TextExtractor};
use crate::repository::{DbError, DieselDbContext, PageStore};
use crate::services::EnrichmentService;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "pagesum.db";

/// Default server bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default maximum accepted upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default images subdirectory name.
const IMAGES_SUBDIR: &str = "images";

/// Which summarizer the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    /// Deterministic, offline.
    #[default]
    Stub,
    /// OpenAI-compatible chat completions.
    Llm,
}

impl SummarizerBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stub" => Some(Self::Stub),
            "llm" | "openai" => Some(Self::Llm),
            _ => None,
        }
    }
}

/// Summarizer selection and stub behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub backend: SummarizerBackend,
    /// Characters kept by the stub summarizer.
    #[serde(default = "default_stub_chars")]
    pub stub_chars: usize,
    /// Fixed stub summary; overrides `stub_chars` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub_text: Option<String>,
}

fn default_stub_chars() -> usize {
    StubSummarizer::DEFAULT_PREFIX_CHARS
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::default(),
            stub_chars: default_stub_chars(),
            stub_text: None,
        }
    }
}

impl SummarizerConfig {
    fn stub(&self) -> StubSummarizer {
        match self.stub_text {
            Some(ref text) => StubSummarizer::fixed(text.clone()),
            None => StubSummarizer::prefix(self.stub_chars),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Supports sqlite: URLs. Set via DATABASE_URL env var.
    pub database_url: Option<String>,
    /// Directory for storing uploaded images.
    pub images_dir: PathBuf,
    /// Server bind address.
    pub bind: String,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
    pub ocr: OcrSpaceConfig,
    pub summarizer: SummarizerConfig,
    pub llm: LlmConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Platform data dir, falling back to home then the current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagesum");

        Self {
            images_dir: data_dir.join(IMAGES_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr: OcrSpaceConfig::default(),
            summarizer: SummarizerConfig::default(),
            llm: LlmConfig::base_default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            images_dir: data_dir.join(IMAGES_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Point the data directory (and the images directory under it) elsewhere.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.images_dir = data_dir.join(IMAGES_SUBDIR);
        self.data_dir = data_dir;
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [("data", &self.data_dir), ("images", &self.images_dir)] {
            tracing::debug!("Ensuring {} directory {}", label, dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> Result<DieselDbContext, DbError> {
        DieselDbContext::from_url(&self.database_url(), &self.images_dir)
    }

    /// Build the configured text extractor.
    pub fn create_extractor(&self) -> Result<Arc<dyn TextExtractor>, OcrError> {
        let extractor: Arc<dyn TextExtractor> = Arc::new(OcrSpaceClient::new(self.ocr.clone())?);
        Ok(extractor)
    }

    /// Build the configured summarizer.
    pub fn create_summarizer(&self) -> anyhow::Result<Arc<dyn Summarizer>> {
        let summarizer: Arc<dyn Summarizer> = match self.summarizer.backend {
            SummarizerBackend::Stub => Arc::new(self.summarizer.stub()),
            SummarizerBackend::Llm => {
                if self.llm.api_key.is_none() {
                    tracing::warn!(
                        "LLM summarizer selected without an API key; requests to {} are unauthenticated",
                        self.llm.endpoint
                    );
                }
                Arc::new(LlmClient::new(self.llm.clone())?)
            }
        };
        Ok(summarizer)
    }

    /// Probe the summarization provider when the LLM backend is selected.
    ///
    /// `None` for the stub backend, which makes no network calls.
    pub async fn check_summarizer(&self) -> anyhow::Result<Option<bool>> {
        match self.summarizer.backend {
            SummarizerBackend::Stub => Ok(None),
            SummarizerBackend::Llm => {
                let client = LlmClient::new(self.llm.clone())?;
                Ok(Some(client.is_available().await))
            }
        }
    }

    /// Wire the enrichment service over `store`.
    pub fn create_enrichment_service(
        &self,
        store: Arc<dyn PageStore>,
    ) -> anyhow::Result<EnrichmentService> {
        Ok(EnrichmentService::new(
            store,
            self.create_extractor()?,
            self.create_summarizer()?,
        ))
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DATABASE_URL`: database URL (sqlite only)
    /// - `PAGESUM_DATA_DIR`: data directory
    /// - `PAGESUM_BIND`: server bind address
    /// - `PAGESUM_MAX_UPLOAD_BYTES`: upload size limit
    /// - `SUMMARIZER`: "stub" or "llm"
    /// - `OCR_*` and `LLM_*`: see [`OcrSpaceConfig`] and [`LlmConfig`]
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

        if let Some(url) = var("DATABASE_URL") {
            tracing::debug!("Using DATABASE_URL from environment: {}", url);
            self.database_url = Some(url);
        }
        if let Some(dir) = var("PAGESUM_DATA_DIR") {
            self.set_data_dir(PathBuf::from(shellexpand::tilde(&dir).as_ref()));
        }
        if let Some(bind) = var("PAGESUM_BIND") {
            self.bind = bind;
        }
        if let Some(n) = var("PAGESUM_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            self.max_upload_bytes = n;
        }
        if let Some(backend) = var("SUMMARIZER") {
            match SummarizerBackend::from_str(&backend) {
                Some(b) => self.summarizer.backend = b,
                None => tracing::warn!("Ignoring unknown SUMMARIZER '{}'", backend),
            }
        }
        self.ocr = self.ocr.clone().with_env_lookup(&var);
        self.llm = self.llm.clone().with_env_lookup(&var);
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Server bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
    /// OCR provider settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrSpaceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarizer: Option<SummarizerConfig>,
    /// LLM configuration for the `llm` summarizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers pagesum config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("pagesum").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.set_data_dir(self.resolve_path(data_dir, base_dir));
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(ref ocr) = self.ocr {
            settings.ocr = ocr.clone();
        }
        if let Some(ref summarizer) = self.summarizer {
            settings.summarizer = summarizer.clone();
        }
        if let Some(ref llm) = self.llm {
            settings.llm = llm.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions) -> anyhow::Result<Config> {
    // Priority 1: Explicit --config flag, which must parse
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", config_path.display(), e));
    }

    // Priority 2: Auto-discover via prefer
    Ok(Config::load().await)
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<(Settings, Config)> {
    let config = load_file_config(&options).await?;

    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    settings.apply_env(|name| std::env::var(name).ok());

    // --data-dir takes precedence over everything else
    if let Some(data_dir) = options.data_dir {
        settings.set_data_dir(data_dir);
    }

    Ok((settings, config))
}
