//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将"外部输入"和"合成产物"解耦：
//! - `ImagePayload` 用显式标签区分用户上传与本地合成，不再靠结构探测判断来源
//! - `SourceImage` 表示一次编辑会话中的原图（不可变，重新上传即整体替换）
//! - `MaskImage` 表示"编辑区域"，分辨率必须与配对原图一致

use std::sync::Arc;

use uuid::Uuid;

use super::loader;

/// 编码后的图片载荷。
///
/// 字节以 `Arc` 共享，克隆开销与图片大小无关。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// 用户上传的原始文件字节。
    Uploaded { bytes: Arc<[u8]>, mime_type: String },
    /// 本地合成（蒙版绘制、外扩画布）得到的编码字节。
    Synthesized { bytes: Arc<[u8]>, mime_type: String },
}

impl ImagePayload {
    pub fn uploaded(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self::Uploaded {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn synthesized_png(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Synthesized {
            bytes: bytes.into(),
            mime_type: loader::PNG_MIME.to_string(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Uploaded { bytes, .. } | Self::Synthesized { bytes, .. } => bytes,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Uploaded { mime_type, .. } | Self::Synthesized { mime_type, .. } => mime_type,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized { .. })
    }

    /// 输出为可内嵌的 Data URI。
    pub fn to_data_uri(&self) -> String {
        loader::encode_data_uri(self.mime_type(), self.bytes())
    }
}

/// 会话中的原图。
///
/// `id` 在每次构造时重新生成：即使两次上传尺寸相同，引用也不同，
/// 蒙版画板据此判断是否需要重置。
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: Uuid,
    width: u32,
    height: u32,
    payload: ImagePayload,
}

impl SourceImage {
    pub(crate) fn new(width: u32, height: u32, payload: ImagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            width,
            height,
            payload,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }
}

/// 编辑区域蒙版：白色 = 待编辑区域，黑色 = 保留区域。
#[derive(Debug, Clone)]
pub struct MaskImage {
    width: u32,
    height: u32,
    payload: ImagePayload,
}

impl MaskImage {
    pub(crate) fn new(width: u32, height: u32, payload: ImagePayload) -> Self {
        Self {
            width,
            height,
            payload,
        }
    }

    /// 由外部文件构造蒙版（例如命令行 `--mask`）。
    pub fn from_source(image: SourceImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            payload: image.payload,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tag_is_explicit() {
        let uploaded = ImagePayload::uploaded(vec![1_u8, 2, 3], "image/jpeg");
        let synthesized = ImagePayload::synthesized_png(vec![1_u8, 2, 3]);

        assert!(!uploaded.is_synthesized());
        assert!(synthesized.is_synthesized());
        assert_eq!(uploaded.bytes(), synthesized.bytes());
        assert_eq!(synthesized.mime_type(), "image/png");
        assert_ne!(uploaded, synthesized);
    }

    #[test]
    fn source_images_get_distinct_ids() {
        let payload = ImagePayload::uploaded(vec![0_u8], "image/png");
        let a = SourceImage::new(10, 10, payload.clone());
        let b = SourceImage::new(10, 10, payload);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.dimensions(), b.dimensions());
    }
}
