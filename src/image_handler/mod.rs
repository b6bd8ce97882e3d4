//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将"上传接收 → 加载校验 → 解码 / 编码"按职责拆分为多个子模块，
//! 画板、外扩合成与请求组装都只通过这里接触编码字节。
//!
//! - `loader`：负责上传字节 / Data URI / 文件加载与签名、尺寸校验
//! - `pipeline`：负责完整解码、像素限制与 PNG 编码
//! - `config/error/source`：配置、错误、数据模型
//!
//! ## 调用链
//!
//! ```text
//! 上传字节 / 文件 / Data URI
//!    ↓
//! loader.rs（体积 + 签名 + 头部尺寸）
//!    ↓
//! SourceImage（会话持有）
//!    ├─ canvas::painter（按原图尺寸分配蒙版缓冲）
//!    └─ canvas::outpaint → pipeline.rs（解码 + 合成 + 编码）
//! ```

mod config;
mod error;
mod loader;
pub(crate) mod pipeline;
mod source;

pub use config::ImageConfig;
pub use error::ImageError;
pub use loader::{encode_data_uri, parse_data_uri};
pub use source::{ImagePayload, MaskImage, SourceImage};
