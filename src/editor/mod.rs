//! # 编辑器模块
//!
//! ## 设计思路
//!
//! 把"界面状态 → 远端请求 → 结果下载"这条链路收敛到一个模块：
//!
//! | 子模块 | 职责 |
//! |------|------|
//! | `mode` | 编辑模式与外扩比例枚举 |
//! | `request` | 按模式校验输入并组装有序图片 + 指令 |
//! | `session` | 会话状态、模式切换重置、单在途提交门控 |
//! | `download` | 结果下载产物与文件命名 |

mod download;
mod mode;
pub mod request;
mod session;

pub use download::{DownloadArtifact, EditedImage, download_file_name, prepare_download};
pub use mode::{AspectRatio, EditMode};
pub use request::{EditRequest, RequestInputs, assemble};
pub use session::{EditorSession, SubmissionTicket};
