//! 编辑模式与外扩比例。
//!
//! 两者都是固定枚举集合，提供稳定的字符串形式用于命令行解析、文件命名与日志。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 编辑工作流。同一时间只有一个模式生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditMode {
    /// 整图按提示词编辑
    #[default]
    General,
    /// 将第二张图中的服装穿到第一张图的人物身上
    TryOn,
    /// 仅在手绘蒙版区域内编辑（Magic Fill）
    Inpainting,
    /// 按目标比例扩展画布并生成新区域（Magic Expand）
    Outpainting,
}

impl EditMode {
    pub const ALL: [EditMode; 4] = [
        EditMode::General,
        EditMode::TryOn,
        EditMode::Inpainting,
        EditMode::Outpainting,
    ];

    /// 小写稳定名称。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::TryOn => "tryon",
            Self::Inpainting => "inpainting",
            Self::Outpainting => "outpainting",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General Edit",
            Self::TryOn => "Virtual Try-On",
            Self::Inpainting => "Magic Fill",
            Self::Outpainting => "Magic Expand",
        }
    }

    /// 该模式是否需要用户输入提示词。
    pub fn requires_prompt(self) -> bool {
        matches!(self, Self::General | Self::Inpainting)
    }

    /// 界面上展示的快捷提示词。
    pub fn suggested_prompts(self) -> &'static [&'static str] {
        match self {
            Self::General => &[
                "Cyberpunk neon style",
                "Vintage polaroid filter",
                "Make it snowy",
                "Studio lighting",
            ],
            Self::Inpainting => &["Remove object", "Blue shirt", "Wear a hat", "Sunglasses"],
            Self::TryOn | Self::Outpainting => &[],
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "general" => Ok(Self::General),
            "tryon" => Ok(Self::TryOn),
            "inpainting" | "inpaint" => Ok(Self::Inpainting),
            "outpainting" | "outpaint" => Ok(Self::Outpainting),
            _ => Err(ValidationError::UnknownMode(value.to_string())),
        }
    }
}

/// 外扩目标宽高比。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Landscape16x9,
    Portrait9x16,
    Standard4x3,
    Square,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Landscape16x9,
        AspectRatio::Portrait9x16,
        AspectRatio::Standard4x3,
        AspectRatio::Square,
    ];

    /// `(w, h)` 比例分量。
    pub fn components(self) -> (u32, u32) {
        match self {
            Self::Landscape16x9 => (16, 9),
            Self::Portrait9x16 => (9, 16),
            Self::Standard4x3 => (4, 3),
            Self::Square => (1, 1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
            Self::Standard4x3 => "4:3",
            Self::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownAspectRatio(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_roundtrip() {
        for mode in EditMode::ALL {
            assert_eq!(mode.as_str().parse::<EditMode>(), Ok(mode));
        }
        assert_eq!("Try-On".parse::<EditMode>(), Ok(EditMode::TryOn));
        assert!(matches!(
            "sketch".parse::<EditMode>(),
            Err(ValidationError::UnknownMode(_))
        ));
    }

    #[test]
    fn only_general_and_inpainting_need_prompt() {
        assert!(EditMode::General.requires_prompt());
        assert!(EditMode::Inpainting.requires_prompt());
        assert!(!EditMode::TryOn.requires_prompt());
        assert!(!EditMode::Outpainting.requires_prompt());
    }

    #[test]
    fn ratio_tokens_parse() {
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Landscape16x9));
        assert_eq!(" 1 : 1 ".parse::<AspectRatio>(), Ok(AspectRatio::Square));
        assert_eq!(AspectRatio::Portrait9x16.components(), (9, 16));
        assert!(matches!(
            "3:2".parse::<AspectRatio>(),
            Err(ValidationError::UnknownAspectRatio(_))
        ));
    }

    #[test]
    fn default_ratio_is_widescreen() {
        assert_eq!(AspectRatio::default(), AspectRatio::Landscape16x9);
    }
}
