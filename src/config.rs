use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `vertex.region`
pub const VERTEX_REGION: &str = "VERTEX_REGION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub live: LiveConfig,
    pub vertex: VertexConfig,
    pub multimodal: MultimodalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    /// `{model}` comes from this section, `{api_key}` from the credentials
    pub url: String,
    pub prompt: String,
    pub temperature: f32,
    pub top_k: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-exp".to_string(),
            url: "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={api_key}"
                .to_string(),
            prompt: "Hello! This is a final integration test for Mode 3.".to_string(),
            temperature: 0.7,
            top_k: 40.0,
            top_p: 0.95,
            max_output_tokens: 1024,
            timeout_ms: 15000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub url: String,
    pub model: String,
    pub response_modalities: Vec<String>,
    pub voice: String,
    pub timeout_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url: "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent?key={api_key}"
                .to_string(),
            model: "models/gemini-2.0-flash-exp".to_string(),
            response_modalities: vec!["AUDIO".to_string()],
            voice: "Aoede".to_string(),
            timeout_ms: 10000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexConfig {
    pub region: String,
    pub model: String,
    /// `{region}` and `{model}` come from this section, `{project_id}` from the credentials
    pub url: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub disable_prompt_logging: bool,
    pub disable_data_retention: bool,
    pub timeout_ms: u64,
    /// Record the probe as failed instead of calling it when the token looks malformed
    pub skip_on_invalid_token: bool,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            region: "us-east1".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            url: "https://{region}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{region}/publishers/google/models/{model}:generateContent"
                .to_string(),
            prompt: "Test Vertex AI integration".to_string(),
            temperature: 0.7,
            max_output_tokens: 50,
            disable_prompt_logging: true,
            disable_data_retention: true,
            timeout_ms: 10000,
            skip_on_invalid_token: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultimodalConfig {
    pub prompt: String,
    /// Any of these (case-insensitive) in the reply counts as recognized
    pub markers: Vec<String>,
    /// Use this PNG instead of the generated test image
    pub image_path: Option<PathBuf>,
    pub timeout_ms: u64,
}

impl Default for MultimodalConfig {
    fn default() -> Self {
        Self {
            prompt: "What text do you see in this image?".to_string(),
            markers: vec!["FINAL TEST".to_string(), "INTEGRATION".to_string()],
            image_path: None,
            timeout_ms: 20000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            live: LiveConfig::default(),
            vertex: VertexConfig::default(),
            multimodal: MultimodalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Environment values win over the file
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup(VERTEX_REGION).filter(|r| !r.trim().is_empty()) {
            log::debug!("Vertex region overridden from {}", VERTEX_REGION);
            self.vertex.region = region.trim().to_string();
        }
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
