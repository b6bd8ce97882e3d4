//! # 外扩画布合成
//!
//! ## 设计思路
//!
//! 给定原图与目标宽高比，计算更大的画布、将原图居中放置，并同时生成：
//! - 填充后的画布（原图以外区域保持透明）
//! - 互补蒙版（白 = 待生成的新区域，黑 = 保留的原图区域）
//!
//! 几何计算（`OutpaintLayout::plan`）与像素合成分离，几何部分是纯函数，便于单测与属性测试。
//!
//! ## 实现思路
//!
//! 1. 目标比例比原图更宽：固定高度，宽度 = round(高 × 比例)；否则固定宽度，高度 = round(宽 ÷ 比例)
//! 2. 居中偏移取半像素向上取整：`(delta + 1) / 2`，画布与蒙版使用同一偏移
//! 3. 完整解码在阻塞线程池中执行，解码失败以 `ImageError` 返回，由上层映射为准备失败

use image::{GrayImage, Luma, RgbaImage, imageops};

use crate::editor::AspectRatio;
use crate::image_handler::pipeline;
use crate::image_handler::{ImageConfig, ImageError, ImagePayload, SourceImage};

const MASK_FILL: Luma<u8> = Luma([255]);
const MASK_KEEP: Luma<u8> = Luma([0]);

/// 外扩几何布局。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutpaintLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl OutpaintLayout {
    /// 计算画布尺寸与居中偏移。
    pub fn plan(source_width: u32, source_height: u32, ratio: AspectRatio) -> Self {
        let (ratio_w, ratio_h) = ratio.components();
        let target_ratio = ratio_w as f64 / ratio_h as f64;
        let original_ratio = source_width as f64 / source_height.max(1) as f64;

        let (canvas_width, canvas_height) = if target_ratio > original_ratio {
            let height = source_height;
            let width = (height as f64 * target_ratio).round() as u32;
            (width.max(source_width), height)
        } else {
            let width = source_width;
            let height = (width as f64 / target_ratio).round() as u32;
            (width, height.max(source_height))
        };

        Self {
            canvas_width,
            canvas_height,
            offset_x: (canvas_width - source_width).div_ceil(2),
            offset_y: (canvas_height - source_height).div_ceil(2),
            source_width,
            source_height,
        }
    }

    /// 原图所在矩形 `(x, y, w, h)`。
    pub fn source_rect(&self) -> (u32, u32, u32, u32) {
        (
            self.offset_x,
            self.offset_y,
            self.source_width,
            self.source_height,
        )
    }

    /// 画布是否与原图同尺寸（目标比例与原图一致时不需要外扩）。
    pub fn is_identity(&self) -> bool {
        self.canvas_width == self.source_width && self.canvas_height == self.source_height
    }
}

/// 外扩合成结果。
#[derive(Debug, Clone)]
pub struct OutpaintCanvas {
    pub layout: OutpaintLayout,
    pub padded: ImagePayload,
    pub mask: ImagePayload,
}

/// 按布局渲染填充画布。
pub fn render_padded(source: &RgbaImage, layout: &OutpaintLayout) -> RgbaImage {
    let mut canvas = RgbaImage::new(layout.canvas_width, layout.canvas_height);
    imageops::replace(
        &mut canvas,
        source,
        layout.offset_x as i64,
        layout.offset_y as i64,
    );
    canvas
}

/// 按布局渲染蒙版：全白底 + 原图位置黑色矩形。
pub fn render_mask(layout: &OutpaintLayout) -> GrayImage {
    let mut mask = GrayImage::from_pixel(layout.canvas_width, layout.canvas_height, MASK_FILL);
    let (x0, y0, w, h) = layout.source_rect();
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            mask.put_pixel(x, y, MASK_KEEP);
        }
    }
    mask
}

/// 同步合成：解码原图 → 渲染画布与蒙版 → 编码 PNG。
pub fn synthesize_blocking(
    source_bytes: &[u8],
    ratio: AspectRatio,
    config: &ImageConfig,
) -> Result<OutpaintCanvas, ImageError> {
    let decoded = pipeline::decode_rgba(source_bytes, config)?;
    let (width, height) = decoded.dimensions();
    let layout = OutpaintLayout::plan(width, height, ratio);
    config.check_canvas(layout.canvas_width, layout.canvas_height)?;

    let padded = pipeline::encode_rgba_png(render_padded(&decoded, &layout))?;
    let mask = pipeline::encode_mask_png(render_mask(&layout))?;

    Ok(OutpaintCanvas {
        layout,
        padded: ImagePayload::synthesized_png(padded),
        mask: ImagePayload::synthesized_png(mask),
    })
}

/// 异步合成入口。
///
/// 解码与编码在阻塞线程池中执行，不占用异步运行时的工作线程。
pub async fn synthesize(
    source: &SourceImage,
    ratio: AspectRatio,
    config: &ImageConfig,
) -> Result<OutpaintCanvas, ImageError> {
    let bytes = source.payload().bytes().to_vec();
    let config = config.clone();

    let result = tokio::task::spawn_blocking(move || synthesize_blocking(&bytes, ratio, &config))
        .await
        .map_err(|e| ImageError::Task(format!("outpaint synthesis task: {}", e)))?;

    match &result {
        Ok(canvas) => log::info!(
            "🧩 外扩画布已生成 - 比例: {} 原图: {}x{} 画布: {}x{} 偏移: ({}, {})",
            ratio,
            canvas.layout.source_width,
            canvas.layout.source_height,
            canvas.layout.canvas_width,
            canvas.layout.canvas_height,
            canvas.layout.offset_x,
            canvas.layout.offset_y
        ),
        Err(err) => log::warn!("⚠️ 外扩画布生成失败：{}", err),
    }

    result
}
