//! # 画布模块
//!
//! 请求发出前的客户端像素处理：
//!
//! | 子模块 | 职责 |
//! |------|------|
//! | [`mapper`] | 指针 / 触摸坐标 → 蒙版像素坐标（补偿 CSS 缩放） |
//! | [`painter`] | 手绘蒙版画板：`Idle` / `Drawing` 状态机 + 自有像素缓冲 |
//! | [`outpaint`] | 按目标宽高比合成外扩画布与互补蒙版 |

pub mod mapper;
pub mod outpaint;
pub mod painter;

pub use mapper::{CanvasPoint, ClientPoint, DisplayBox, PointerInput, map_to_canvas};
pub use outpaint::{OutpaintCanvas, OutpaintLayout};
pub use painter::{MaskBuffer, MaskPainter, PainterState};
