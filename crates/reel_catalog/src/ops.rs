//! 重命名与删除

use std::path::PathBuf;

use crate::{CatalogError, VideoItem};

/// 在原目录内重命名，保留原扩展名
///
/// `new_name` 不含扩展名；若带了与原文件相同的扩展名则不会重复追加。
pub fn rename_video(video: &VideoItem, new_name: &str) -> Result<PathBuf, CatalogError> {
    let new_name = new_name.trim();
    if new_name.is_empty() || new_name.contains(['/', '\\']) || new_name == "." || new_name == ".."
    {
        return Err(CatalogError::InvalidName(new_name.to_string()));
    }

    let ext = video
        .path
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    let file_name = match &ext {
        Some(ext) if !new_name.to_lowercase().ends_with(&format!(".{}", ext.to_lowercase())) => {
            format!("{}.{}", new_name, ext)
        }
        _ => new_name.to_string(),
    };

    let target = video.path.with_file_name(file_name);
    if target.exists() {
        return Err(CatalogError::AlreadyExists(target));
    }

    std::fs::rename(&video.path, &target)?;
    log::info!("renamed {} -> {}", video.path.display(), target.display());
    Ok(target)
}

/// 批量删除结果
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<u64>,
    pub failed: Vec<(u64, CatalogError)>,
}

/// 逐个删除，单个失败不影响其余
pub fn delete_videos<'a, I>(videos: I) -> DeleteReport
where
    I: IntoIterator<Item = &'a VideoItem>,
{
    let mut report = DeleteReport::default();

    for video in videos {
        match std::fs::remove_file(&video.path) {
            Ok(()) => {
                log::info!("deleted {}", video.path.display());
                report.deleted.push(video.id);
            }
            Err(e) => {
                log::warn!("cannot delete {}: {}", video.path.display(), e);
                report.failed.push((video.id, e.into()));
            }
        }
    }

    report
}
