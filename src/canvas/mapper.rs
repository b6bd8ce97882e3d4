//! 指针坐标映射模块
//!
//! 将屏幕坐标系下的指针 / 触摸位置换算为蒙版缓冲的像素坐标。
//! 画板在页面上通常被 CSS 缩放显示，显示尺寸与底层像素分辨率不同，
//! 因此每个轴单独计算缩放比：
//!
//! ```text
//! scale_x = backing_width  / displayed_width
//! scale_y = backing_height / displayed_height
//! x = (client_x - box_left) * scale_x
//! y = (client_y - box_top)  * scale_y
//! ```
//!
//! 画板尚未挂载、没有触点、或显示尺寸为零时返回 `None`，由调用方当作无操作处理。

/// 屏幕坐标系下的一个点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPoint {
    pub x: f64,
    pub y: f64,
}

impl ClientPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 蒙版缓冲像素坐标系下的一个点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 画板在屏幕上的显示包围盒。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// 指针输入：鼠标给出单点，触摸给出当前所有活动触点。
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse(ClientPoint),
    Touch(Vec<ClientPoint>),
}

impl PointerInput {
    /// 触摸输入只取第一个活动触点。
    fn primary(&self) -> Option<ClientPoint> {
        match self {
            Self::Mouse(point) => Some(*point),
            Self::Touch(touches) => touches.first().copied(),
        }
    }
}

/// 将指针位置映射到底层像素坐标。
///
/// # 参数
/// * `display` - 画板显示包围盒，未挂载时为 `None`
/// * `backing` - 底层像素分辨率（宽、高）
/// * `input`   - 指针或触摸输入
pub fn map_to_canvas(
    display: Option<&DisplayBox>,
    backing: (u32, u32),
    input: &PointerInput,
) -> Option<CanvasPoint> {
    let display = display?;
    if !(display.width > 0.0 && display.height > 0.0) {
        return None;
    }

    let point = input.primary()?;
    let scale_x = backing.0 as f64 / display.width;
    let scale_y = backing.1 as f64 / display.height;

    Some(CanvasPoint::new(
        ((point.x - display.left) * scale_x) as f32,
        ((point.y - display.top) * scale_y) as f32,
    ))
}
