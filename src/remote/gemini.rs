//! # Gemini 图片编辑客户端
//!
//! ## 设计思路
//!
//! 客户端显式构造（配置 + 复用型 HTTP 客户端），以 `ImageEditor` 实现注入会话，
//! 不存在模块级全局实例。单次请求即一次 `generateContent` 调用，不做自动重试。
//!
//! ## 实现思路
//!
//! - 请求体：按顺序的 `inlineData` 图片段 + 末尾一段指令文本，`responseModalities = ["IMAGE"]`。
//! - 响应：取首个候选中第一个内联图片段，拼成 `data:{mime};base64,{data}`。
//! - 非 2xx 状态尽量解析服务端错误消息；被内容策略拦截时返回 `Blocked`。

use std::time::{Duration, Instant};

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use super::{GeminiConfig, ImageEditor, RemoteError};
use crate::editor::{EditRequest, EditedImage};
use crate::error::AppError;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gemini 远端编辑客户端。
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// 校验配置并构建复用型 HTTP 客户端。
    pub fn new(config: GeminiConfig) -> Result<Self, AppError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("cannot create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// 使用外部提供的 HTTP 客户端。
    pub fn with_http_client(config: GeminiConfig, http: reqwest::Client) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_body<'a>(request: &'a EditRequest) -> GenerateContentRequest<'a> {
        let mut parts: Vec<RequestPart<'a>> = request
            .images
            .iter()
            .map(|image| RequestPart {
                inline_data: Some(InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: general_purpose::STANDARD.encode(image.bytes()),
                }),
                text: None,
            })
            .collect();
        parts.push(RequestPart {
            inline_data: None,
            text: Some(request.instruction.as_str()),
        });

        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
            },
        }
    }

    fn extract_image(response: GenerateContentResponse) -> Result<EditedImage, RemoteError> {
        if let Some(reason) = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(RemoteError::Blocked(reason));
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(RemoteError::EmptyResponse);
        };

        let inline = candidate
            .content
            .into_iter()
            .flat_map(|content| content.parts)
            .find_map(|part| part.inline_data);

        match inline {
            Some(data) if !data.data.is_empty() => {
                // 原样拼回 Data URI，下载时按原字节还原
                Ok(EditedImage::new(format!(
                    "data:{};base64,{}",
                    data.mime_type, data.data
                )))
            }
            _ => match candidate.finish_reason {
                Some(reason)
                    if matches!(
                        reason.as_str(),
                        "SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY"
                    ) =>
                {
                    Err(RemoteError::Blocked(reason))
                }
                _ => Err(RemoteError::EmptyResponse),
            },
        }
    }

    fn status_error(code: u16, body: &[u8]) -> RemoteError {
        let message = serde_json::from_slice::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).chars().take(300).collect());
        RemoteError::Status { code, message }
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.config.request_timeout_secs)
        } else {
            // reqwest 错误信息可能包含完整 URL，去掉查询串部分
            RemoteError::Network(e.without_url().to_string())
        }
    }
}

impl ImageEditor for GeminiClient {
    async fn edit_image(&self, request: &EditRequest) -> Result<EditedImage, RemoteError> {
        let body = serde_json::to_vec(&Self::build_body(request))
            .map_err(|e| RemoteError::InvalidResponse(format!("cannot encode request: {}", e)))?;

        log::info!(
            "🌐 发送编辑请求 - 模型: {} 模式: {} 图片数: {} 请求体: {}KB",
            self.config.model,
            request.mode,
            request.images.len(),
            body.len() / 1024
        );
        let start = Instant::now();

        let response = self
            .http
            .post(self.config.generate_content_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            let err = Self::status_error(status.as_u16(), &bytes);
            log::warn!("⚠️ 编辑请求失败 - {} 耗时: {}ms", err, start.elapsed().as_millis());
            return Err(err);
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::InvalidResponse(format!("{}", e)))?;
        let edited = Self::extract_image(parsed)?;

        log::info!(
            "✅ 编辑完成 - 响应: {}KB 耗时: {}ms",
            bytes.len() / 1024,
            start.elapsed().as_millis()
        );

        Ok(edited)
    }
}
