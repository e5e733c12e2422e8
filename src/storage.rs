// 头像文件存储
// 上传的文件按原文件名写入头像目录，数据库只保存相对路径

use std::path::{Path, PathBuf};

/// 写入档案的头像路径前缀
pub const AVATAR_URL_PREFIX: &str = "assets/images/profiles";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 表单中上传的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AvatarStorage {
    root: PathBuf,
}

impl AvatarStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 只保留文件名部分，拒绝空名和 `..`
    pub fn sanitize_file_name(raw: &str) -> Result<String, StorageError> {
        let name = Path::new(raw.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "..")
            .ok_or_else(|| StorageError::InvalidFileName(raw.to_string()))?;
        Ok(name.to_string())
    }

    /// 上传文件对应的档案头像路径
    pub fn avatar_path(file: &UploadedFile) -> Result<String, StorageError> {
        let name = Self::sanitize_file_name(&file.file_name)?;
        Ok(format!("{}/{}", AVATAR_URL_PREFIX, name))
    }

    /// 写入磁盘并返回档案头像路径
    pub async fn save(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let name = Self::sanitize_file_name(&file.file_name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&name), &file.bytes).await?;

        tracing::debug!("avatar saved: {} ({} bytes)", name, file.bytes.len());
        Ok(format!("{}/{}", AVATAR_URL_PREFIX, name))
    }
}
