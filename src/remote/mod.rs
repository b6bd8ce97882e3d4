//! # 远端编辑调用模块
//!
//! ## 设计思路
//!
//! 远端模型被视为不透明函数 `edit(instruction, images) -> data URI`，
//! 通过 `ImageEditor` trait 注入会话：
//! - 正式环境使用显式构造的 `GeminiClient`
//! - 测试中替换为内存实现，无需网络
//!
//! 缺少凭据在构造 `GeminiConfig` 时即失败，调用点不再做空值判断。

mod config;
mod error;
mod gemini;

use std::future::Future;

use crate::editor::{EditRequest, EditedImage};

pub use config::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiConfig, Settings};
pub use error::RemoteError;
pub use gemini::GeminiClient;

/// 远端图片编辑能力。
///
/// 一次调用对应一次请求，不做重试；失败原样返回给提交边界。
pub trait ImageEditor {
    fn edit_image(
        &self,
        request: &EditRequest,
    ) -> impl Future<Output = Result<EditedImage, RemoteError>> + Send;
}
