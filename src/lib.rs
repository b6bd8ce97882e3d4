//! # 图片编辑客户端流水线 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              宿主（命令行 / 界面外壳）                    │
//! │   上传 · 指针事件 · 比例选择 · 生成 · 下载                │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ EditorSession（Result<T, AppError>）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕                                                  │
//! │  ┌─ error ────────── AppError（提交边界统一错误）         │
//! │  │                                                       │
//! │  ├─ image_handler ── 上传接收 · Data URI · 解码 / 编码    │
//! │  │                                                       │
//! │  ├─ canvas                                               │
//! │  │   ├─ mapper      指针坐标 → 蒙版像素坐标               │
//! │  │   ├─ painter     手绘蒙版（Idle / Drawing）            │
//! │  │   └─ outpaint    外扩画布 + 互补蒙版                   │
//! │  │                                                       │
//! │  ├─ editor ───────── 模式 · 请求组装 · 会话 · 下载        │
//! │  │                                                       │
//! │  └─ remote ───────── ImageEditor trait · GeminiClient     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | `ValidationError` 与统一错误类型 `AppError` |
//! | [`image_handler`] | 原图 / 蒙版模型、带标签的图片载荷、资源限制与编解码 |
//! | [`canvas`] | 坐标映射、手绘蒙版画板、外扩画布合成 |
//! | [`editor`] | 编辑模式、请求组装、会话状态与单在途门控、结果下载 |
//! | [`remote`] | 远端编辑调用（Gemini）与其配置 |
//! | [`cli`] | 命令行宿主 |

pub mod canvas;
pub mod cli;
pub mod editor;
pub mod error;
pub mod image_handler;
pub mod remote;
