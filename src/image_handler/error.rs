//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片链路（接收 / 解码 / 合成 / 编码）中的所有错误来源，
//! 避免字符串拼接式错误处理。通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 图片处理统一错误类型。
///
/// 该类型会在提交边界被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Could not encode image: {0}")]
    Encode(String),

    #[error("Unsupported image: {0}")]
    InvalidFormat(String),

    #[error("Image too large: {0}")]
    ResourceLimit(String),

    #[error("File error: {0}")]
    FileSystem(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ImageError {
    /// 稳定错误码，便于宿主界面按类别展示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::Encode(_) => "E_ENCODE",
            Self::InvalidFormat(_) => "E_FORMAT",
            Self::ResourceLimit(_) => "E_LIMIT",
            Self::FileSystem(_) => "E_FS",
            Self::Task(_) => "E_TASK",
        }
    }
}
