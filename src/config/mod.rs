#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::parser::DEFAULT_SIMULATED_DELAY;
use crate::core::prompts::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::translator::{SUMMARIZE_TEMPERATURE, TRANSLATE_TEMPERATURE};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_dir, validate_http_url, validate_non_empty, validate_range, Validate,
};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_DATA_DIR: &str = "./.jgtml";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// 命令列指定的值，優先於設定檔
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub data_dir: Option<String>,
}

/// 合併命令列、TOML 與環境變數後的設定
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub data_dir: String,
    pub timeout_seconds: u64,
    pub translate_temperature: f32,
    pub summarize_temperature: f32,
    pub simulated_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            translate_temperature: TRANSLATE_TEMPERATURE,
            summarize_temperature: SUMMARIZE_TEMPERATURE,
            simulated_delay_ms: DEFAULT_SIMULATED_DELAY.as_millis() as u64,
        }
    }
}

impl Settings {
    /// 優先順序：命令列 > TOML > 環境變數 (API_KEY, GEMINI_API_KEY) > 預設值
    pub fn resolve<F>(overrides: &SettingsOverrides, file: Option<&TomlConfig>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let file_llm = file.map(|f| &f.llm);

        let api_key = non_blank(overrides.api_key.clone())
            .or_else(|| file.and_then(|f| f.api_key()).map(str::to_string))
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|name| non_blank(env(name)))
            });

        Self {
            api_key,
            model: non_blank(overrides.model.clone())
                .or_else(|| file_llm.and_then(|l| l.model.clone()))
                .unwrap_or(defaults.model),
            base_url: file_llm
                .and_then(|l| l.base_url.clone())
                .unwrap_or(defaults.base_url),
            data_dir: non_blank(overrides.data_dir.clone())
                .or_else(|| file.and_then(|f| f.storage.data_dir.clone()))
                .unwrap_or(defaults.data_dir),
            timeout_seconds: file_llm
                .and_then(|l| l.timeout_seconds)
                .unwrap_or(defaults.timeout_seconds),
            translate_temperature: file_llm
                .and_then(|l| l.translate_temperature)
                .unwrap_or(defaults.translate_temperature),
            summarize_temperature: file_llm
                .and_then(|l| l.summarize_temperature)
                .unwrap_or(defaults.summarize_temperature),
            simulated_delay_ms: file
                .and_then(|f| f.parser.simulated_delay_ms)
                .unwrap_or(defaults.simulated_delay_ms),
        }
    }

    pub fn from_process_env(overrides: &SettingsOverrides, file: Option<&TomlConfig>) -> Self {
        Self::resolve(overrides, file, |name| std::env::var(name).ok())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ConfigProvider for Settings {
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn translate_temperature(&self) -> f32 {
        self.translate_temperature
    }

    fn summarize_temperature(&self) -> f32 {
        self.summarize_temperature
    }

    fn simulated_parse_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_non_empty("llm.model", &self.model)?;
        validate_http_url("llm.base_url", &self.base_url)?;
        validate_dir("storage.data_dir", &self.data_dir)?;
        validate_range("llm.timeout_seconds", self.timeout_seconds, 1, 3600)?;
        validate_range(
            "llm.translate_temperature",
            self.translate_temperature,
            0.0,
            2.0,
        )?;
        validate_range(
            "llm.summarize_temperature",
            self.summarize_temperature,
            0.0,
            2.0,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&SettingsOverrides::default(), None, no_env);

        assert!(settings.api_key.is_none());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.data_dir, DEFAULT_DATA_DIR);
        assert_eq!(settings.translate_temperature, 0.2);
        assert_eq!(settings.simulated_parse_delay(), Duration::from_millis(1000));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file_and_env() {
        let file = TomlConfig::from_toml_str(
            r#"
[llm]
api_key = "from-file"
model = "file-model"

[storage]
data_dir = "./file-dir"
"#,
        )
        .unwrap();
        let overrides = SettingsOverrides {
            api_key: Some("from-cli".to_string()),
            model: None,
            data_dir: Some("./cli-dir".to_string()),
        };

        let settings = Settings::resolve(&overrides, Some(&file), |_| Some("from-env".to_string()));

        assert_eq!(settings.api_key.as_deref(), Some("from-cli"));
        assert_eq!(settings.model, "file-model");
        assert_eq!(settings.data_dir, "./cli-dir");
    }

    #[test]
    fn test_env_fallback_order() {
        let settings = Settings::resolve(&SettingsOverrides::default(), None, |name| {
            (name == "GEMINI_API_KEY").then(|| "gemini-env".to_string())
        });
        assert_eq!(settings.api_key.as_deref(), Some("gemini-env"));

        let settings = Settings::resolve(&SettingsOverrides::default(), None, |name| {
            Some(format!("{}-value", name))
        });
        assert_eq!(settings.api_key.as_deref(), Some("API_KEY-value"));
    }

    #[test]
    fn test_blank_cli_key_does_not_mask_env() {
        let overrides = SettingsOverrides {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&overrides, None, |_| Some("env-key".to_string()));
        assert_eq!(settings.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.base_url = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.translate_temperature = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }
}
