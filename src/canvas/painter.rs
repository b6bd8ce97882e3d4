//! # 手绘蒙版画板
//!
//! ## 设计思路
//!
//! 画板由两部分组成，互不依赖具体渲染后端：
//! - `MaskBuffer`：与原图同分辨率的单通道像素缓冲，负责笔画光栅化
//! - `MaskPainter`：`Idle` / `Drawing` 状态机，负责事件分发与导出
//!
//! 缓冲初始为纯黑，笔画为纯白；白压黑的覆盖写入使重叠笔画不会叠加变暗。
//!
//! ## 实现思路
//!
//! - 笔宽 `max(20, min(w, h) * 0.05)`，保证大图笔触比例一致、小图仍可用。
//! - 每段笔画按"胶囊体"（线段 + 半径）光栅化，天然得到圆头与圆角连接。
//! - 按下只记录起点，不落墨；移动时立即渲染新线段；松开 / 离开时导出 PNG。
//! - 原图引用变化（即使尺寸相同）时整体重建缓冲，丢弃笔画历史。

use image::{GrayImage, Luma};
use uuid::Uuid;

use super::mapper::{self, CanvasPoint, DisplayBox, PointerInput};
use crate::image_handler::pipeline;
use crate::image_handler::{ImageError, ImagePayload, MaskImage, SourceImage};

const MIN_BRUSH_WIDTH: f32 = 20.0;
const BRUSH_SCALE: f32 = 0.05;

const MASK_BACKGROUND: Luma<u8> = Luma([0]);
const MASK_STROKE: Luma<u8> = Luma([255]);

/// 根据缓冲尺寸计算笔宽。
pub fn brush_width_for(width: u32, height: u32) -> f32 {
    (width.min(height) as f32 * BRUSH_SCALE).max(MIN_BRUSH_WIDTH)
}

/// 蒙版像素缓冲。
#[derive(Debug, Clone)]
pub struct MaskBuffer {
    pixels: GrayImage,
    brush_width: f32,
}

impl MaskBuffer {
    /// 分配纯黑缓冲。
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width, height, MASK_BACKGROUND),
            brush_width: brush_width_for(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// 以当前笔宽渲染一段笔画。
    ///
    /// 像素中心到线段距离不超过半径即写白。
    pub fn stroke_segment(&mut self, from: CanvasPoint, to: CanvasPoint) {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let radius = self.brush_width / 2.0;
        let radius_sq = radius * radius;

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min((width - 1) as f32);
        let max_y = (from.y.max(to.y) + radius).ceil().min((height - 1) as f32);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len_sq = dx * dx + dy * dy;

        for y in (min_y as u32)..=(max_y as u32) {
            for x in (min_x as u32)..=(max_x as u32) {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // 投影到线段上的最近点
                let t = if len_sq > 0.0 {
                    (((px - from.x) * dx + (py - from.y) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let cx = from.x + t * dx - px;
                let cy = from.y + t * dy - py;

                if cx * cx + cy * cy <= radius_sq {
                    self.pixels.put_pixel(x, y, MASK_STROKE);
                }
            }
        }
    }

    /// 导出为 PNG 蒙版。
    pub fn export(&self) -> Result<MaskImage, ImageError> {
        let (width, height) = self.pixels.dimensions();
        let bytes = pipeline::encode_mask_png(self.pixels.clone())?;
        Ok(MaskImage::new(
            width,
            height,
            ImagePayload::synthesized_png(bytes),
        ))
    }
}

/// 画板状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PainterState {
    Idle,
    Drawing { last: CanvasPoint },
}

/// 手绘蒙版画板。
///
/// 未绑定原图时没有缓冲，所有绘制事件都是无操作。
#[derive(Debug, Clone)]
pub struct MaskPainter {
    buffer: Option<MaskBuffer>,
    source_id: Option<Uuid>,
    state: PainterState,
}

impl Default for MaskPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskPainter {
    pub fn new() -> Self {
        Self {
            buffer: None,
            source_id: None,
            state: PainterState::Idle,
        }
    }

    pub fn state(&self) -> PainterState {
        self.state
    }

    pub fn buffer(&self) -> Option<&MaskBuffer> {
        self.buffer.as_ref()
    }

    /// 当前绑定的原图。
    pub fn source_id(&self) -> Option<Uuid> {
        self.source_id
    }

    /// 绑定新原图：按原生分辨率分配纯黑缓冲并丢弃笔画。
    ///
    /// 每次调用都会重建，调用方收到后应清除已持有的蒙版。
    pub fn attach(&mut self, source: &SourceImage) {
        let (width, height) = source.dimensions();
        let buffer = MaskBuffer::new(width, height);

        log::info!(
            "🖌️ 蒙版画板已重置 - 尺寸: {}x{} 笔宽: {:.1}",
            width,
            height,
            buffer.brush_width()
        );

        self.buffer = Some(buffer);
        self.source_id = Some(source.id());
        self.state = PainterState::Idle;
    }

    /// 解除绑定（模式切换时）。
    pub fn detach(&mut self) {
        self.buffer = None;
        self.source_id = None;
        self.state = PainterState::Idle;
    }

    /// `Idle → Drawing`：记录起点。
    pub fn press(&mut self, display: Option<&DisplayBox>, input: &PointerInput) {
        let Some(buffer) = self.buffer.as_ref() else {
            return;
        };
        let Some(point) = mapper::map_to_canvas(display, buffer.dimensions(), input) else {
            return;
        };

        log::debug!("笔画开始 ({:.1}, {:.1})", point.x, point.y);
        self.state = PainterState::Drawing { last: point };
    }

    /// `Drawing → Drawing`：延伸笔画并立即渲染。
    pub fn move_to(&mut self, display: Option<&DisplayBox>, input: &PointerInput) {
        let PainterState::Drawing { last } = self.state else {
            return;
        };
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let Some(point) = mapper::map_to_canvas(display, buffer.dimensions(), input) else {
            return;
        };

        buffer.stroke_segment(last, point);
        self.state = PainterState::Drawing { last: point };
    }

    /// `Drawing → Idle`：结束笔画并导出蒙版。
    ///
    /// 已处于 `Idle` 时返回 `Ok(None)`，用于吸收重复的松开 / 离开事件。
    pub fn release(&mut self) -> Result<Option<MaskImage>, ImageError> {
        if self.state == PainterState::Idle {
            return Ok(None);
        }
        self.state = PainterState::Idle;

        let Some(buffer) = self.buffer.as_ref() else {
            return Ok(None);
        };

        let mask = buffer.export()?;
        log::info!("🎭 蒙版已导出 - 尺寸: {}x{}", mask.width(), mask.height());
        Ok(Some(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::mapper::ClientPoint;

    fn mouse(x: f64, y: f64) -> PointerInput {
        PointerInput::Mouse(ClientPoint::new(x, y))
    }

    fn white_count(buffer: &MaskBuffer) -> usize {
        buffer.pixels().pixels().filter(|p| p.0[0] == 255).count()
    }

    #[test]
    fn brush_width_has_floor_and_scales() {
        assert_eq!(brush_width_for(100, 100), 20.0);
        assert_eq!(brush_width_for(1000, 500), 25.0);
        assert_eq!(brush_width_for(4000, 3000), 150.0);
    }

    #[test]
    fn new_buffer_is_black() {
        let buffer = MaskBuffer::new(30, 20);
        assert_eq!(buffer.dimensions(), (30, 20));
        assert_eq!(white_count(&buffer), 0);
    }

    #[test]
    fn segment_paints_capsule_with_round_caps() {
        let mut buffer = MaskBuffer::new(100, 100);
        buffer.stroke_segment(CanvasPoint::new(30.0, 50.0), CanvasPoint::new(70.0, 50.0));

        let pixels = buffer.pixels();
        // 线段上与端点外半径内
        assert_eq!(pixels.get_pixel(50, 50).0, [255]);
        assert_eq!(pixels.get_pixel(21, 49).0, [255]);
        assert_eq!(pixels.get_pixel(78, 50).0, [255]);
        // 半径外
        assert_eq!(pixels.get_pixel(50, 62).0, [0]);
        assert_eq!(pixels.get_pixel(15, 50).0, [0]);
        // 圆头：端点斜角外侧不着色
        assert_eq!(pixels.get_pixel(21, 41).0, [0]);
    }

    #[test]
    fn overlapping_strokes_stay_pure_white() {
        let mut buffer = MaskBuffer::new(64, 64);
        buffer.stroke_segment(CanvasPoint::new(10.0, 10.0), CanvasPoint::new(50.0, 50.0));
        buffer.stroke_segment(CanvasPoint::new(10.0, 50.0), CanvasPoint::new(50.0, 10.0));

        assert!(buffer.pixels().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(buffer.pixels().get_pixel(30, 30).0, [255]);
    }

    #[test]
    fn stroke_is_clipped_to_buffer() {
        let mut buffer = MaskBuffer::new(40, 40);
        buffer.stroke_segment(CanvasPoint::new(-50.0, -50.0), CanvasPoint::new(5.0, 5.0));
        buffer.stroke_segment(CanvasPoint::new(500.0, 500.0), CanvasPoint::new(600.0, 600.0));

        assert_eq!(buffer.pixels().get_pixel(0, 0).0, [255]);
        assert_eq!(buffer.pixels().get_pixel(39, 39).0, [0]);
    }

    #[test]
    fn events_without_source_are_noops() {
        let mut painter = MaskPainter::new();
        let display = DisplayBox::new(0.0, 0.0, 10.0, 10.0);

        painter.press(Some(&display), &mouse(1.0, 1.0));
        assert_eq!(painter.state(), PainterState::Idle);
        assert!(painter.release().expect("release failed").is_none());
    }

    #[test]
    fn duplicate_release_is_ignored() {
        let source = SourceImage::new(50, 50, ImagePayload::uploaded(vec![0_u8], "image/png"));
        let mut painter = MaskPainter::new();
        painter.attach(&source);
        let display = DisplayBox::new(0.0, 0.0, 50.0, 50.0);

        painter.press(Some(&display), &mouse(10.0, 10.0));
        painter.move_to(Some(&display), &mouse(40.0, 40.0));

        assert!(painter.release().expect("release failed").is_some());
        assert!(painter.release().expect("release failed").is_none());
    }

    #[test]
    fn move_while_idle_does_not_paint() {
        let source = SourceImage::new(50, 50, ImagePayload::uploaded(vec![0_u8], "image/png"));
        let mut painter = MaskPainter::new();
        painter.attach(&source);
        let display = DisplayBox::new(0.0, 0.0, 50.0, 50.0);

        painter.move_to(Some(&display), &mouse(25.0, 25.0));

        let buffer = painter.buffer().expect("buffer should exist");
        assert_eq!(white_count(buffer), 0);
    }

    #[test]
    fn reattach_same_size_discards_strokes() {
        let first = SourceImage::new(60, 60, ImagePayload::uploaded(vec![0_u8], "image/png"));
        let second = SourceImage::new(60, 60, ImagePayload::uploaded(vec![0_u8], "image/png"));
        let mut painter = MaskPainter::new();
        let display = DisplayBox::new(0.0, 0.0, 60.0, 60.0);

        painter.attach(&first);
        painter.press(Some(&display), &mouse(5.0, 5.0));
        painter.move_to(Some(&display), &mouse(55.0, 55.0));
        let _ = painter.release().expect("release failed");
        assert!(white_count(painter.buffer().expect("buffer")) > 0);

        painter.attach(&second);
        assert_eq!(painter.source_id(), Some(second.id()));
        assert_eq!(white_count(painter.buffer().expect("buffer")), 0);
    }
}
