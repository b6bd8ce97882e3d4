//! # 解码与编码流水线模块
//!
//! ## 设计思路
//!
//! 将"字节 → 像素"与"像素 → PNG 字节"的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 读取 header 尺寸并按像素上限快速拒绝
//! 2. 完整解码为 RGBA
//! 3. 校验解码结果与 header 一致
//! 4. 合成产物统一编码为 PNG

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbaImage};

use super::loader;
use super::{ImageConfig, ImageError};

/// 将原始字节完整解码为 RGBA 像素。
pub(crate) fn decode_rgba(bytes: &[u8], config: &ImageConfig) -> Result<RgbaImage, ImageError> {
    let (header_width, header_height) = loader::inspect_dimensions(bytes)?;
    config.check_pixels(header_width, header_height)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ImageError::Decode(format!("{}", e)))?;
    let rgba = decoded.to_rgba8();

    let (width, height) = rgba.dimensions();
    if (width, height) != (header_width, header_height) {
        return Err(ImageError::Decode(format!(
            "decoded size {}x{} differs from header {}x{}",
            width, height, header_width, header_height
        )));
    }

    Ok(rgba)
}

pub(crate) fn encode_png(image: DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| ImageError::Encode(format!("{}", e)))?;
    Ok(cursor.into_inner())
}

pub(crate) fn encode_rgba_png(image: RgbaImage) -> Result<Vec<u8>, ImageError> {
    encode_png(DynamicImage::ImageRgba8(image))
}

/// 蒙版按单通道灰度 PNG 编码。
pub(crate) fn encode_mask_png(mask: GrayImage) -> Result<Vec<u8>, ImageError> {
    encode_png(DynamicImage::ImageLuma8(mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn encode_then_decode_preserves_pixels() {
        let mut img = RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255]));
        img.put_pixel(4, 2, Rgba([200, 100, 50, 128]));

        let bytes = encode_rgba_png(img.clone()).expect("encode failed");
        let decoded = decode_rgba(&bytes, &ImageConfig::default()).expect("decode failed");

        assert_eq!(decoded, img);
    }

    #[test]
    fn mask_png_decodes_to_pure_black_and_white() {
        let mut mask = GrayImage::from_pixel(4, 4, Luma([0]));
        mask.put_pixel(1, 1, Luma([255]));

        let bytes = encode_mask_png(mask).expect("encode failed");
        let decoded = image::load_from_memory(&bytes)
            .expect("decode failed")
            .to_luma8();

        assert_eq!(decoded.get_pixel(1, 1).0, [255]);
        assert_eq!(decoded.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let bytes = encode_rgba_png(RgbaImage::from_pixel(64, 64, Rgba([9, 9, 9, 255])))
            .expect("encode failed");
        let truncated = &bytes[..bytes.len() / 2];

        let result = decode_rgba(truncated, &ImageConfig::default());
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }
}
