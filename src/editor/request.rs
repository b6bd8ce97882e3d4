//! # 请求组装模块
//!
//! ## 设计思路
//!
//! 将界面状态 `{模式, 图片, 蒙版, 提示词, 外扩比例}` 映射为有序图片列表 + 一条指令文本。
//! 每个模式的图片顺序与指令模板固定：
//!
//! | 模式 | 图片（顺序） | 指令 |
//! |------|------|------|
//! | General | [原图] | 通用模板 + 提示词 |
//! | TryOn | [人物, 服装] | 固定试穿指令 |
//! | Inpainting | [原图, 蒙版] | 蒙版编辑模板 + 提示词 |
//! | Outpainting | [外扩画布, 外扩蒙版] | 固定填充指令 |
//!
//! ## 实现思路
//!
//! - `validate` 在任何 I/O 之前检查必需输入，缺失即拒绝，不构造请求。
//! - `assemble` 先校验；外扩模式在此处异步合成画布，合成失败返回 `Preparation`，
//!   不会转发不完整请求。

use crate::canvas::outpaint;
use crate::error::{AppError, ValidationError};
use crate::image_handler::{ImageConfig, ImagePayload, MaskImage, SourceImage};

use super::{AspectRatio, EditMode};

const GENERAL_TEMPLATE: &str = "Based on the provided image, perform the following edit: ";

const TRY_ON_INSTRUCTION: &str = "In the first image, there is a person. In the second image, there is an article of clothing. Your task is to realistically place the clothing from the second image onto the person in the first image. Preserve the person's original pose, the background, and the lighting of the first image. The clothing should fit naturally on the person.";

const INPAINTING_TEMPLATE: &str = "You are an expert photo editor. Use the second image as a mask. The white area of the mask indicates the region to be edited in the first image. Perform the following edit ONLY in that region, blending it seamlessly with the rest of the image: ";

const OUTPAINTING_INSTRUCTION: &str = "You are an expert photo editor. Use the second image as a mask. The white area of the mask indicates the region to be edited in the first image. Fill the white area, seamlessly blending it with the original content, maintaining the original style and subject matter of the central image.";

/// 一次提交的请求：有序图片 + 指令。
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub mode: EditMode,
    pub images: Vec<ImagePayload>,
    pub instruction: String,
}

/// 组装所需的界面状态快照。
#[derive(Debug, Clone, Copy)]
pub struct RequestInputs<'a> {
    pub mode: EditMode,
    pub base_image: Option<&'a SourceImage>,
    pub cloth_image: Option<&'a SourceImage>,
    pub mask_image: Option<&'a MaskImage>,
    pub prompt: &'a str,
    pub outpaint_ratio: AspectRatio,
}

impl<'a> RequestInputs<'a> {
    fn trimmed_prompt(&self) -> &'a str {
        self.prompt.trim()
    }
}

/// 检查当前模式的必需输入。
pub fn validate(inputs: &RequestInputs<'_>) -> Result<(), ValidationError> {
    let base = inputs.base_image.ok_or(ValidationError::MissingBaseImage)?;

    if inputs.mode == EditMode::TryOn && inputs.cloth_image.is_none() {
        return Err(ValidationError::MissingClothImage);
    }

    if inputs.mode.requires_prompt() && inputs.trimmed_prompt().is_empty() {
        return Err(ValidationError::MissingPrompt);
    }

    if inputs.mode == EditMode::Inpainting {
        let mask = inputs.mask_image.ok_or(ValidationError::MissingMask)?;
        check_mask_matches(mask, base)?;
    }

    Ok(())
}

/// 蒙版分辨率必须与配对原图一致。
pub fn check_mask_matches(mask: &MaskImage, base: &SourceImage) -> Result<(), ValidationError> {
    if mask.dimensions() != base.dimensions() {
        return Err(ValidationError::MaskSizeMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            image_width: base.width(),
            image_height: base.height(),
        });
    }
    Ok(())
}

/// 组装请求。
pub async fn assemble(
    inputs: RequestInputs<'_>,
    config: &ImageConfig,
) -> Result<EditRequest, AppError> {
    validate(&inputs)?;
    let base = inputs.base_image.ok_or(ValidationError::MissingBaseImage)?;
    let prompt = inputs.trimmed_prompt();

    let (images, instruction) = match inputs.mode {
        EditMode::General => (
            vec![base.payload().clone()],
            format!("{GENERAL_TEMPLATE}{prompt}"),
        ),
        EditMode::TryOn => {
            let cloth = inputs.cloth_image.ok_or(ValidationError::MissingClothImage)?;
            (
                vec![base.payload().clone(), cloth.payload().clone()],
                TRY_ON_INSTRUCTION.to_string(),
            )
        }
        EditMode::Inpainting => {
            let mask = inputs.mask_image.ok_or(ValidationError::MissingMask)?;
            (
                vec![base.payload().clone(), mask.payload().clone()],
                format!("{INPAINTING_TEMPLATE}{prompt}"),
            )
        }
        EditMode::Outpainting => {
            let canvas = outpaint::synthesize(base, inputs.outpaint_ratio, config)
                .await
                .map_err(|e| AppError::Preparation(e.to_string()))?;
            (
                vec![canvas.padded, canvas.mask],
                OUTPAINTING_INSTRUCTION.to_string(),
            )
        }
    };

    log::info!(
        "📦 请求已组装 - 模式: {} 图片数: {} 指令长度: {}",
        inputs.mode,
        images.len(),
        instruction.len()
    );

    Ok(EditRequest {
        mode: inputs.mode,
        images,
        instruction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> SourceImage {
        SourceImage::new(width, height, ImagePayload::uploaded(vec![1_u8, 2, 3], "image/jpeg"))
    }

    fn mask(width: u32, height: u32) -> MaskImage {
        MaskImage::new(width, height, ImagePayload::synthesized_png(vec![9_u8]))
    }

    fn inputs<'a>(mode: EditMode, base: Option<&'a SourceImage>) -> RequestInputs<'a> {
        RequestInputs {
            mode,
            base_image: base,
            cloth_image: None,
            mask_image: None,
            prompt: "",
            outpaint_ratio: AspectRatio::default(),
        }
    }

    #[test]
    fn every_mode_requires_base_image() {
        for mode in EditMode::ALL {
            assert_eq!(
                validate(&inputs(mode, None)),
                Err(ValidationError::MissingBaseImage)
            );
        }
    }

    #[test]
    fn try_on_requires_cloth() {
        let base = image(10, 10);
        assert_eq!(
            validate(&inputs(EditMode::TryOn, Some(&base))),
            Err(ValidationError::MissingClothImage)
        );
    }

    #[test]
    fn whitespace_prompt_counts_as_empty() {
        let base = image(10, 10);
        let mut request = inputs(EditMode::General, Some(&base));
        request.prompt = "   ";
        assert_eq!(validate(&request), Err(ValidationError::MissingPrompt));
    }

    #[test]
    fn inpainting_requires_matching_mask() {
        let base = image(10, 10);
        let wrong = mask(5, 5);
        let mut request = inputs(EditMode::Inpainting, Some(&base));
        request.prompt = "Blue shirt";
        assert_eq!(validate(&request), Err(ValidationError::MissingMask));

        request.mask_image = Some(&wrong);
        assert!(matches!(
            validate(&request),
            Err(ValidationError::MaskSizeMismatch { .. })
        ));
    }

    #[test]
    fn outpainting_needs_no_prompt() {
        let base = image(10, 10);
        assert_eq!(validate(&inputs(EditMode::Outpainting, Some(&base))), Ok(()));
    }

    #[tokio::test]
    async fn inpainting_sends_base_then_mask() {
        let base = image(10, 10);
        let drawn = mask(10, 10);
        let mut request = inputs(EditMode::Inpainting, Some(&base));
        request.mask_image = Some(&drawn);
        request.prompt = " Wear a hat ";

        let assembled = assemble(request, &ImageConfig::default())
            .await
            .expect("assemble failed");

        assert_eq!(assembled.images.len(), 2);
        assert_eq!(&assembled.images[0], base.payload());
        assert_eq!(&assembled.images[1], drawn.payload());
        assert!(assembled.instruction.starts_with("You are an expert photo editor."));
        assert!(assembled.instruction.ends_with("rest of the image: Wear a hat"));
    }

    #[tokio::test]
    async fn outpainting_with_undecodable_base_is_preparation_error() {
        let base = image(10, 10);
        let result = assemble(inputs(EditMode::Outpainting, Some(&base)), &ImageConfig::default()).await;
        assert!(matches!(result, Err(AppError::Preparation(_))));
    }
}
