//! Application settings storage
//!
//! Stores configuration like the API key in a JSON file in the app data
//! directory. Environment variables take precedence over stored values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Path to config file (set during init)
static CONFIG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Cumulative model usage, persisted across runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsageStats {
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub synthesis_runs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub custom_db_path: Option<String>,
    /// Model used for synthesis and the learner agent
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default)]
    pub usage_stats: UsageStats,
}

fn default_ai_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            custom_db_path: None,
            ai_model: default_ai_model(),
            usage_stats: UsageStats::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk or create default
    fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    fn save(&self, path: &PathBuf) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

/// Initialize settings with the app data directory
pub fn init(app_data_dir: PathBuf) {
    let config_path = app_data_dir.join("settings.json");
    let settings = Settings::load(&config_path);

    if let Ok(mut guard) = CONFIG_PATH.write() {
        *guard = Some(config_path);
    }
    if let Ok(mut guard) = SETTINGS.write() {
        *guard = Some(settings);
    }
}

fn save_current() -> Result<(), String> {
    let config_path = CONFIG_PATH
        .read()
        .map_err(|_| "Failed to acquire config path lock")?
        .clone()
        .ok_or("Settings not initialized")?;

    let guard = SETTINGS
        .read()
        .map_err(|_| "Failed to acquire settings lock")?;
    let settings = guard.as_ref().ok_or("Settings not initialized")?;

    settings.save(&config_path)
}

/// Get the current API key (checks env var first, then stored setting)
pub fn get_api_key() -> Option<String> {
    // Environment variable takes precedence
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }

    // Fall back to stored setting
    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.anthropic_api_key.clone()
}

/// Check if API key is available
pub fn has_api_key() -> bool {
    get_api_key().map(|k| !k.is_empty()).unwrap_or(false)
}

/// Set and save the API key
pub fn set_api_key(key: String) -> Result<(), String> {
    {
        let mut settings_guard = SETTINGS
            .write()
            .map_err(|_| "Failed to acquire settings lock")?;
        let settings = settings_guard.get_or_insert_with(Settings::default);
        settings.anthropic_api_key = if key.is_empty() { None } else { Some(key) };
    }

    save_current()?;

    println!("API key saved to settings");
    Ok(())
}

/// Get masked API key for display (shows first/last 4 chars)
pub fn get_masked_api_key() -> Option<String> {
    get_api_key().map(|key| {
        if key.len() > 12 {
            format!("{}...{}", &key[..8], &key[key.len() - 4..])
        } else {
            "*".repeat(key.len())
        }
    })
}

/// Get the model name used for synthesis and learner replies
pub fn get_ai_model() -> String {
    let guard = SETTINGS.read().ok();
    guard
        .as_ref()
        .and_then(|g| g.as_ref())
        .map(|s| s.ai_model.clone())
        .unwrap_or_else(default_ai_model)
}

/// Set and save the model name; an empty value restores the default
pub fn set_ai_model(model: String) -> Result<(), String> {
    {
        let mut settings_guard = SETTINGS
            .write()
            .map_err(|_| "Failed to acquire settings lock")?;
        let settings = settings_guard.get_or_insert_with(Settings::default);
        settings.ai_model = if model.is_empty() { default_ai_model() } else { model };
    }

    save_current()
}

// ==================== Usage Stats ====================

/// Get cumulative model usage
pub fn get_usage_stats() -> UsageStats {
    let guard = SETTINGS.read().ok();
    guard
        .as_ref()
        .and_then(|g| g.as_ref())
        .map(|s| s.usage_stats.clone())
        .unwrap_or_default()
}

/// Add model token usage
pub fn add_token_usage(input_tokens: u64, output_tokens: u64) -> Result<(), String> {
    {
        let mut settings_guard = SETTINGS
            .write()
            .map_err(|_| "Failed to acquire settings lock")?;
        let settings = settings_guard.get_or_insert_with(Settings::default);
        settings.usage_stats.total_input_tokens += input_tokens;
        settings.usage_stats.total_output_tokens += output_tokens;
        settings.usage_stats.synthesis_runs += 1;
    }

    save_current()
}

// ==================== Custom Database Path ====================

/// Get custom database path (if set)
pub fn get_custom_db_path() -> Option<String> {
    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.custom_db_path.clone()
}

/// Set custom database path
pub fn set_custom_db_path(path: Option<String>) -> Result<(), String> {
    {
        let mut settings_guard = SETTINGS
            .write()
            .map_err(|_| "Failed to acquire settings lock")?;
        let settings = settings_guard.get_or_insert_with(Settings::default);
        settings.custom_db_path = path.clone();
    }

    save_current()?;

    println!("Custom DB path saved: {:?}", path);
    Ok(())
}
