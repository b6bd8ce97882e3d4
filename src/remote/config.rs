//! # 远端客户端配置
//!
//! ## 设计思路
//!
//! 凭据与端点集中到 `GeminiConfig`，由调用方显式构造后注入客户端，
//! 不依赖模块级全局实例。缺少凭据在构造阶段即报错，调用点无需再做空值检查。
//!
//! ## 实现思路
//!
//! - 先读可选的 JSON 设置文件（字段均可缺省），再用环境变量覆盖。
//! - 凭据只接受环境变量或设置文件，日志中永不输出。
//! - 超时参数按区间校验。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::image_handler::ImageConfig;

use super::RemoteError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
const MODEL_VAR: &str = "GEMINI_MODEL";
const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";

/// 设置文件内容。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub image: ImageConfig,
}

impl Settings {
    /// 读取设置文件；文件不存在时返回默认值。
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("⚙️ 设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }
}

/// Gemini 客户端配置。
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// 用给定凭据与默认参数构造。
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }

    /// 仅从环境变量构造。
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_settings(&Settings::default(), |name| std::env::var(name).ok())
    }

    /// 设置文件 + 环境变量覆盖。
    ///
    /// `lookup` 用于注入环境读取，测试中可替换为固定表。
    pub fn from_settings<F>(settings: &Settings, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| non_empty(lookup(name)))
            .or_else(|| non_empty(settings.api_key.clone()))
            .ok_or(RemoteError::MissingCredential)?;

        let mut config = Self::new(api_key.trim());
        if let Some(model) = non_empty(lookup(MODEL_VAR)).or_else(|| non_empty(settings.model.clone())) {
            config.model = model;
        }
        if let Some(endpoint) =
            non_empty(lookup(ENDPOINT_VAR)).or_else(|| non_empty(settings.endpoint.clone()))
        {
            config.endpoint = endpoint;
        }
        if let Some(secs) = settings.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = settings.connect_timeout_secs {
            config.connect_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_key.trim().is_empty() {
            return Err(RemoteError::MissingCredential.into());
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config("model must not be empty".to_string()));
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(AppError::Config(
                "request_timeout_secs must be between 1 and 600".to_string(),
            ));
        }
        if !(1..=600).contains(&self.connect_timeout_secs) {
            return Err(AppError::Config(
                "connect_timeout_secs must be between 1 and 600".to_string(),
            ));
        }
        Ok(())
    }

    /// `{endpoint}/models/{model}:generateContent`
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}
