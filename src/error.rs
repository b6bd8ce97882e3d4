//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义提交边界的统一 `AppError`，把三类用户可见错误收敛到一处：
//! - `Validation`：当前模式缺少必需输入，发生在任何 I/O 之前
//! - `Preparation`：外扩画布合成失败（原图无法解码）
//! - `Remote`：远端编辑调用失败或未返回可用图片
//!
//! 宿主界面只需渲染 `to_string()` 即可得到一条完整消息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / `RemoteError` / `ValidationError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于宿主以 JSON 透传。

use serde::Serialize;

use crate::image_handler::ImageError;
use crate::remote::RemoteError;

/// 提交前校验失败：消息直接点名缺失的输入。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please upload a base image.")]
    MissingBaseImage,

    #[error("Please upload a clothing image.")]
    MissingClothImage,

    #[error("Please enter a prompt describing the edit.")]
    MissingPrompt,

    #[error("Please draw a mask over the area to edit.")]
    MissingMask,

    #[error("Mask is {mask_width}x{mask_height} but the base image is {image_width}x{image_height}.")]
    MaskSizeMismatch {
        mask_width: u32,
        mask_height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Unknown edit mode: {0} (expected general, tryon, inpainting or outpainting)")]
    UnknownMode(String),

    #[error("Unknown aspect ratio: {0} (expected 16:9, 9:16, 4:3 or 1:1)")]
    UnknownAspectRatio(String),
}

/// 应用级统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 必需输入缺失
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// 外扩画布准备失败
    #[error("Failed to prepare image for outpainting. {0}")]
    Preparation(String),

    /// 远端编辑失败
    #[error("Failed to edit image. {0}")]
    Remote(#[from] RemoteError),

    /// 已有请求在处理中
    #[error("An edit is already in progress.")]
    Busy,

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 图片接收 / 编码错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 稳定错误码，便于宿主界面区分错误类别。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Preparation(_) => "E_PREPARATION",
            Self::Remote(_) => "E_REMOTE",
            Self::Busy => "E_BUSY",
            Self::Config(_) => "E_CONFIG",
            Self::Image(err) => err.code(),
            Self::Io(_) => "E_IO",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
