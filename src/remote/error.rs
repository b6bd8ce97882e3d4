//! 远端编辑调用错误。

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// 构造客户端时缺少凭据
    #[error("API key is missing. Set GEMINI_API_KEY or API_KEY.")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds.")]
    Timeout(u64),

    #[error("The model service returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// 请求被内容策略拦截
    #[error("The request was blocked: {0}")]
    Blocked(String),

    #[error("No image data found in the API response.")]
    EmptyResponse,

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "E_CREDENTIAL",
            Self::Network(_) => "E_NETWORK",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::Status { .. } => "E_STATUS",
            Self::Blocked(_) => "E_BLOCKED",
            Self::EmptyResponse => "E_EMPTY",
            Self::InvalidResponse(_) => "E_RESPONSE",
        }
    }
}
