//! # 编辑会话
//!
//! ## 设计思路
//!
//! `EditorSession` 持有一次编辑会话的全部界面状态，是宿主（命令行 / 界面外壳）唯一需要操作的对象：
//! - 模式切换整体重置图片、蒙版、提示词与结果，不把旧模式的素材带入新模式
//! - 上传新原图即清除蒙版，修补模式下同时重建画板
//! - 同一时间只允许一个提交在途，其余提交返回 `AppError::Busy`
//!
//! ## 实现思路
//!
//! - 提交拆为 `begin_submission`（校验 + 组装）与 `complete_submission`（回填结果），
//!   远端调用发生在两者之间，不占用会话借用。
//! - 每次模式切换或上传递增 `epoch`；结果回填时票据的 `epoch` 已过期则直接丢弃，
//!   不要求真正中止网络请求。
//! - 票据丢失（调用被取消、超时包装）不应永久占住闸门：旧 `epoch` 的在途票据在下一次
//!   提交时视为已放弃；`abandon_submission` 可显式释放；`generate` 被中途丢弃时由守卫释放。
//! - `generate` 是三步串联的便捷封装。

use chrono::{DateTime, Utc};

use crate::canvas::{DisplayBox, MaskPainter, PointerInput};
use crate::error::{AppError, ValidationError};
use crate::image_handler::{ImageConfig, ImageError, MaskImage, SourceImage};
use crate::remote::{ImageEditor, RemoteError};

use super::download::{DownloadArtifact, EditedImage, prepare_download};
use super::request::{self, EditRequest, RequestInputs};
use super::{AspectRatio, EditMode};

/// 在途提交的凭据。
///
/// 由 `begin_submission` 发放，只能用于回填一次结果。
#[derive(Debug)]
pub struct SubmissionTicket {
    id: u64,
    epoch: u64,
    mode: EditMode,
}

impl SubmissionTicket {
    pub fn mode(&self) -> EditMode {
        self.mode
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: u64,
    epoch: u64,
}

/// `generate` 的在途守卫：future 在远端调用期间被丢弃时释放闸门。
struct InFlight<'a> {
    session: &'a mut EditorSession,
    id: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.pending.is_some_and(|p| p.id == self.id) {
            log::warn!("⚠️ 编辑请求被取消 - 票据 #{}", self.id);
            self.session.pending = None;
        }
    }
}

/// 一次编辑会话的界面状态。
#[derive(Debug)]
pub struct EditorSession {
    image_config: ImageConfig,
    mode: EditMode,
    base_image: Option<SourceImage>,
    cloth_image: Option<SourceImage>,
    mask_image: Option<MaskImage>,
    prompt: String,
    outpaint_ratio: AspectRatio,
    edited: Option<(EditedImage, EditMode)>,
    error: Option<String>,
    painter: MaskPainter,
    pending: Option<Pending>,
    next_ticket: u64,
    epoch: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(ImageConfig::default())
    }
}

impl EditorSession {
    pub fn new(image_config: ImageConfig) -> Self {
        Self {
            image_config,
            mode: EditMode::default(),
            base_image: None,
            cloth_image: None,
            mask_image: None,
            prompt: String::new(),
            outpaint_ratio: AspectRatio::default(),
            edited: None,
            error: None,
            painter: MaskPainter::new(),
            pending: None,
            next_ticket: 0,
            epoch: 0,
        }
    }

    // ------------------------------------------------------------------
    // 状态读取
    // ------------------------------------------------------------------

    pub fn image_config(&self) -> &ImageConfig {
        &self.image_config
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn base_image(&self) -> Option<&SourceImage> {
        self.base_image.as_ref()
    }

    pub fn cloth_image(&self) -> Option<&SourceImage> {
        self.cloth_image.as_ref()
    }

    pub fn mask_image(&self) -> Option<&MaskImage> {
        self.mask_image.as_ref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn outpaint_ratio(&self) -> AspectRatio {
        self.outpaint_ratio
    }

    pub fn edited_image(&self) -> Option<&EditedImage> {
        self.edited.as_ref().map(|(image, _)| image)
    }

    /// 最近一次提交失败的用户可见消息。
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn painter(&self) -> &MaskPainter {
        &self.painter
    }

    /// 当前会话是否有提交在途。旧 `epoch` 遗留的票据不计入。
    pub fn is_pending(&self) -> bool {
        self.pending.is_some_and(|p| p.epoch == self.epoch)
    }

    // ------------------------------------------------------------------
    // 输入变更
    // ------------------------------------------------------------------

    /// 切换模式并整体重置会话素材。外扩比例保留。
    pub fn set_mode(&mut self, mode: EditMode) {
        log::info!("🔀 切换编辑模式 - {} → {}", self.mode, mode);

        self.mode = mode;
        self.base_image = None;
        self.cloth_image = None;
        self.mask_image = None;
        self.prompt.clear();
        self.edited = None;
        self.error = None;
        self.painter.detach();
        self.epoch += 1;
    }

    /// 替换原图：旧蒙版失效，修补模式下重建画板。
    pub fn set_base_image(&mut self, image: SourceImage) {
        self.mask_image = None;
        self.edited = None;
        self.error = None;

        if self.mode == EditMode::Inpainting {
            self.painter.attach(&image);
        }

        self.base_image = Some(image);
        self.epoch += 1;
    }

    pub fn set_cloth_image(&mut self, image: SourceImage) {
        self.cloth_image = Some(image);
        self.epoch += 1;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_outpaint_ratio(&mut self, ratio: AspectRatio) {
        self.outpaint_ratio = ratio;
    }

    /// 使用外部提供的蒙版（替代手绘）。分辨率必须与原图一致。
    pub fn set_mask_image(&mut self, mask: MaskImage) -> Result<(), ValidationError> {
        let base = self
            .base_image
            .as_ref()
            .ok_or(ValidationError::MissingBaseImage)?;
        request::check_mask_matches(&mask, base)?;

        self.mask_image = Some(mask);
        Ok(())
    }

    // ------------------------------------------------------------------
    // 画板事件
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, display: Option<&DisplayBox>, input: &PointerInput) {
        self.painter.press(display, input);
    }

    pub fn pointer_move(&mut self, display: Option<&DisplayBox>, input: &PointerInput) {
        self.painter.move_to(display, input);
    }

    /// 结束笔画，导出的蒙版成为当前蒙版。
    pub fn pointer_up(&mut self) -> Result<(), ImageError> {
        if let Some(mask) = self.painter.release()? {
            self.mask_image = Some(mask);
        }
        Ok(())
    }

    /// 指针离开画板，与松开等价。
    pub fn pointer_leave(&mut self) -> Result<(), ImageError> {
        self.pointer_up()
    }

    // ------------------------------------------------------------------
    // 提交
    // ------------------------------------------------------------------

    fn request_inputs(&self) -> RequestInputs<'_> {
        RequestInputs {
            mode: self.mode,
            base_image: self.base_image.as_ref(),
            cloth_image: self.cloth_image.as_ref(),
            mask_image: self.mask_image.as_ref(),
            prompt: &self.prompt,
            outpaint_ratio: self.outpaint_ratio,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        request::validate(&self.request_inputs())
    }

    /// 生成按钮是否可用。
    pub fn can_generate(&self) -> bool {
        !self.is_pending() && self.validate().is_ok()
    }

    /// 校验并组装请求，登记为在途。
    ///
    /// 失败时消息记录到会话，便于宿主直接渲染。
    pub async fn begin_submission(&mut self) -> Result<(SubmissionTicket, EditRequest), AppError> {
        if let Some(stale) = self.pending
            && stale.epoch != self.epoch
        {
            log::info!("🗑️ 会话已变更，放弃旧的在途票据 #{}", stale.id);
            self.pending = None;
        }
        if self.pending.is_some() {
            log::warn!("⚠️ 已有编辑请求在途，忽略本次提交");
            return Err(AppError::Busy);
        }

        self.error = None;
        self.edited = None;

        let assembled = request::assemble(self.request_inputs(), &self.image_config).await;
        let request = match assembled {
            Ok(request) => request,
            Err(e) => {
                log::warn!("⚠️ 提交被拒绝 - {}", e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.next_ticket += 1;
        let ticket = SubmissionTicket {
            id: self.next_ticket,
            epoch: self.epoch,
            mode: self.mode,
        };
        self.pending = Some(Pending {
            id: ticket.id,
            epoch: ticket.epoch,
        });

        Ok((ticket, request))
    }

    /// 回填远端结果。
    ///
    /// 返回 `Ok(true)` 表示结果已生效，`Ok(false)` 表示结果已过期被丢弃。
    /// 远端失败时错误消息记录到会话并原样返回。
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<EditedImage, RemoteError>,
    ) -> Result<bool, AppError> {
        if self.pending.is_some_and(|p| p.id == ticket.id) {
            self.pending = None;
        } else {
            log::warn!("⚠️ 未知的提交票据 #{}，结果已丢弃", ticket.id);
            return Ok(false);
        }

        if ticket.epoch != self.epoch {
            log::info!(
                "🗑️ 会话已变更，丢弃过期结果 - 票据 #{} 模式: {}",
                ticket.id,
                ticket.mode
            );
            return Ok(false);
        }

        match result {
            Ok(image) => {
                self.edited = Some((image, ticket.mode));
                Ok(true)
            }
            Err(e) => {
                let err = AppError::from(e);
                log::warn!("⚠️ 编辑失败 - {}", err);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// 放弃在途提交，释放闸门。之后到达的结果不会再回填。
    pub fn abandon_submission(&mut self, ticket: SubmissionTicket) {
        if self.pending.is_some_and(|p| p.id == ticket.id) {
            log::info!("🛑 放弃编辑请求 - 票据 #{}", ticket.id);
            self.pending = None;
        }
    }

    /// 提交 → 远端调用 → 回填。
    pub async fn generate<E: ImageEditor>(&mut self, editor: &E) -> Result<EditedImage, AppError> {
        let (ticket, request) = self.begin_submission().await?;

        let gate = InFlight {
            id: ticket.id,
            session: &mut *self,
        };
        let result = editor.edit_image(&request).await;
        let outcome = gate.session.complete_submission(ticket, result);
        drop(gate);
        outcome?;

        self.edited_image()
            .cloned()
            .ok_or(AppError::Remote(RemoteError::EmptyResponse))
    }

    /// 为最近一次成功结果构造下载产物。
    pub fn download(&self, at: DateTime<Utc>) -> Result<Option<DownloadArtifact>, ImageError> {
        self.edited
            .as_ref()
            .map(|(image, mode)| prepare_download(image, *mode, at))
            .transpose()
    }
}
