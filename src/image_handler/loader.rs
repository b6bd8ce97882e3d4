//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（上传字节 / Data URI / 本地文件）的原始字节接收，并在"尽可能早"
//! 的阶段执行输入校验。目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 字节：体积上限 + 文件签名（magic bytes）识别 MIME + 头部读取宽高 + 像素上限。
//! - Data URI：格式解析 + 解码前体积估算 + 解码。
//! - 文件：metadata 体积限制 + 读取，然后复用字节校验。
//! - 此阶段不做完整解码，只读头部尺寸。

use std::io::Cursor;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

use super::source::{ImagePayload, SourceImage};
use super::{ImageConfig, ImageError};

pub(crate) const PNG_MIME: &str = "image/png";

/// 将字节编码为 `data:{mime};base64,{data}`。
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// 解析 Data URI，返回 `(mime, bytes)`。
///
/// 仅接受 base64 形式；MIME 缺省时按 `application/octet-stream` 处理。
pub fn parse_data_uri(data: &str) -> Result<(String, Vec<u8>), ImageError> {
    parse_data_uri_with_limit(data, u64::MAX)
}

pub(crate) fn parse_data_uri_with_limit(
    data: &str,
    max_file_size: u64,
) -> Result<(String, Vec<u8>), ImageError> {
    let normalized = data.trim();
    let rest = normalized
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidFormat("missing data: prefix".to_string()))?;
    let (header, base64_data) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidFormat("missing data URI payload".to_string()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::InvalidFormat("data URI is not base64 encoded".to_string()))?;
    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };

    let estimated_len = estimate_base64_decoded_upper_bound_len(base64_data)?;
    if estimated_len > max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "data URI would decode to {:.2} MB (limit: {:.2} MB)",
            estimated_len as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| ImageError::Decode(format!("invalid base64: {}", e)))?;

    Ok((mime_type.to_ascii_lowercase(), bytes))
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageError> {
    let len = base64_data.trim().len() as u64;
    let groups = len
        .checked_add(3)
        .ok_or_else(|| ImageError::ResourceLimit("base64 input length overflow".to_string()))?
        / 4;

    groups
        .checked_mul(3)
        .ok_or_else(|| ImageError::ResourceLimit("base64 decoded size overflow".to_string()))
}

/// 通过文件签名识别图片 MIME。
///
/// 非图片签名或无法识别时拒绝。
pub(crate) fn sniff_image_mime(bytes: &[u8]) -> Result<&'static str, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidFormat("image is empty".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ImageError::InvalidFormat("unrecognized file type".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::InvalidFormat(format!(
            "file is not an image: {}",
            kind.mime_type()
        )));
    }

    Ok(kind.mime_type())
}

/// 仅通过内存中的图片头信息读取宽高。
pub(crate) fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("cannot detect image format: {}", e)))?
        .into_dimensions()
        .map_err(|e| ImageError::Decode(format!("cannot read image dimensions: {}", e)))
}

impl SourceImage {
    /// 接收上传字节。
    ///
    /// `declared_mime` 来自浏览器/文件系统，仅在签名识别成功但需要标签时参考，
    /// 真实类型以签名为准。
    pub fn from_upload(
        bytes: Vec<u8>,
        declared_mime: Option<&str>,
        config: &ImageConfig,
    ) -> Result<Self, ImageError> {
        config.check_file_size(bytes.len() as u64)?;

        let sniffed = sniff_image_mime(&bytes)?;
        if let Some(declared) = declared_mime
            && !declared.eq_ignore_ascii_case(sniffed)
        {
            log::warn!("⚠️ 上传声明类型 {} 与文件签名 {} 不一致，以签名为准", declared, sniffed);
        }

        let (width, height) = inspect_dimensions(&bytes)?;
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidFormat(format!(
                "image has no pixels: {}x{}",
                width, height
            )));
        }
        config.check_pixels(width, height)?;

        log::info!(
            "📥 已接收图片 - 类型: {} 尺寸: {}x{} 体积: {}KB",
            sniffed,
            width,
            height,
            bytes.len() / 1024
        );

        Ok(Self::new(width, height, ImagePayload::uploaded(bytes, sniffed)))
    }

    /// 从 Data URI 接收图片。
    pub fn from_data_uri(data: &str, config: &ImageConfig) -> Result<Self, ImageError> {
        let (mime_type, bytes) = parse_data_uri_with_limit(data, config.max_file_size)?;
        Self::from_upload(bytes, Some(&mime_type), config)
    }

    /// 从本地文件接收图片。
    pub fn from_file(path: &Path, config: &ImageConfig) -> Result<Self, ImageError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        let metadata = std::fs::metadata(path).map_err(|e| {
            ImageError::FileSystem(format!("cannot read {}: {}", path.display(), e))
        })?;
        config.check_file_size(metadata.len())?;

        let bytes = std::fs::read(path).map_err(|e| {
            ImageError::FileSystem(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_upload(bytes, None, config)
    }
}
