//! # 配置模块
//!
//! ## 设计思路
//!
//! 将图片接收与解码阶段的资源上限集中到 `ImageConfig`，保证上传校验、
//! 外扩合成时的完整解码都使用同一组阈值，且可在测试中单独调整。
//!
//! 外扩画布比原图大，单独使用 `max_canvas_pixels` 约束；默认值保证上传上限内、
//! 长宽比不超过 2:1 的原图外扩到任一比例都不会被拒绝。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的上限。
//! - `validate` 在宿主注入自定义配置时拒绝明显不合理的组合，以 `AppError::Config` 返回。

use serde::{Deserialize, Serialize};

use super::ImageError;
use crate::error::AppError;

/// 图片处理配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 上传/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 外扩画布的像素上限（`canvas_width * canvas_height`）。
    pub max_canvas_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_canvas_pixels: 160_000_000,
        }
    }
}

impl ImageConfig {
    /// 校验配置组合。
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_file_size == 0 {
            return Err(AppError::Config(
                "max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.max_decoded_pixels == 0 {
            return Err(AppError::Config(
                "max_decoded_pixels must be greater than zero".to_string(),
            ));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(AppError::Config(
                "max_decoded_bytes must be at least 8MB".to_string(),
            ));
        }
        // 至少容纳一张上限尺寸的原图
        if self.max_canvas_pixels < self.max_decoded_pixels {
            return Err(AppError::Config(format!(
                "max_canvas_pixels ({}) must not be below max_decoded_pixels ({})",
                self.max_canvas_pixels, self.max_decoded_pixels
            )));
        }
        Ok(())
    }

    /// 校验像素数量是否超过配置上限。
    pub(crate) fn check_pixels(&self, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("pixel count overflow".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "{} pixels (limit: {} pixels)",
                pixels, self.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| ImageError::ResourceLimit("decoded size overflow".to_string()))?;

        if estimated > self.max_decoded_bytes {
            return Err(ImageError::ResourceLimit(format!(
                "decoding needs about {:.2} MB (limit: {:.2} MB)",
                estimated as f64 / 1024.0 / 1024.0,
                self.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 校验外扩画布尺寸。
    pub(crate) fn check_canvas(&self, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("canvas pixel count overflow".to_string()))?;

        if pixels > self.max_canvas_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "outpaint canvas {}x{} is {} pixels (limit: {} pixels)",
                width, height, pixels, self.max_canvas_pixels
            )));
        }
        Ok(())
    }

    /// 校验原始字节体积。
    pub(crate) fn check_file_size(&self, len: u64) -> Result<(), ImageError> {
        if len > self.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "file is {:.2} MB (limit: {:.2} MB)",
                len as f64 / 1024.0 / 1024.0,
                self.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Ok(())
    }
}
