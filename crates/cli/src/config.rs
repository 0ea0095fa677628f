//! TOML configuration for the deckscan CLI.
//!
//! Every section has serde defaults so a partial (or absent) config file
//! still yields a working setup. The API key itself never lives in the
//! file; `api_key_env` names the environment variable holding it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deckscan.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub ocr: Ocr,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Resolve and load the config: an explicit path must exist; otherwise
    /// `./deckscan.toml` is used when present, falling back to defaults.
    pub fn resolve(user: Option<&Path>) -> Result<Self> {
        if let Some(path) = user {
            return Self::load(path);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default.exists() {
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Gemini model name.
    pub model: String,
    /// API endpoint base URL.
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            model: deckscan_gemini::DEFAULT_MODEL.into(),
            endpoint: deckscan_gemini::DEFAULT_ENDPOINT.into(),
            api_key_env: "GEMINI_API_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    /// Whether to OCR embedded images at all.
    pub enabled: bool,
    /// Tesseract executable path or name.
    pub tesseract_exe: String,
    /// Tesseract language code.
    pub language: String,
    /// Per-image timeout in seconds (0 disables the timeout).
    pub timeout_seconds: u64,
}

impl Default for Ocr {
    fn default() -> Self {
        Self {
            enabled: true,
            tesseract_exe: "tesseract".into(),
            language: "eng".into(),
            timeout_seconds: 30,
        }
    }
}
