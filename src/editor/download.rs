//! 编辑结果下载。
//!
//! 文件名形如 `img-master-{mode}-{unix_millis}.{ext}`，字节与远端返回的 Data URI 解码结果完全一致。

use chrono::{DateTime, Utc};

use crate::image_handler::{ImageError, parse_data_uri};

use super::EditMode;

const FILE_PREFIX: &str = "img-master";

/// 远端返回的编辑结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    data_uri: String,
}

impl EditedImage {
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// 可保存到本地的下载产物。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

pub fn download_file_name(mode: EditMode, mime_type: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.{}",
        FILE_PREFIX,
        mode.as_str(),
        at.timestamp_millis(),
        extension_for(mime_type)
    )
}

/// 构造下载产物。
pub fn prepare_download(
    image: &EditedImage,
    mode: EditMode,
    at: DateTime<Utc>,
) -> Result<DownloadArtifact, ImageError> {
    let (mime_type, bytes) = parse_data_uri(image.data_uri())?;
    Ok(DownloadArtifact {
        file_name: download_file_name(mode, &mime_type, at),
        mime_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::encode_data_uri;

    #[test]
    fn file_name_uses_mode_and_millis() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).expect("valid timestamp");
        assert_eq!(
            download_file_name(EditMode::TryOn, "image/png", at),
            "img-master-tryon-1700000000123.png"
        );
        assert_eq!(
            download_file_name(EditMode::General, "image/jpeg", at),
            "img-master-general-1700000000123.jpg"
        );
    }

    #[test]
    fn download_reuses_exact_bytes() {
        let bytes = vec![137_u8, 80, 78, 71, 1, 2, 3, 4];
        let edited = EditedImage::new(encode_data_uri("image/png", &bytes));
        let at = DateTime::from_timestamp_millis(42).expect("valid timestamp");

        let artifact = prepare_download(&edited, EditMode::Outpainting, at).expect("download failed");

        assert_eq!(artifact.bytes, bytes);
        assert_eq!(artifact.file_name, "img-master-outpainting-42.png");
    }
}
