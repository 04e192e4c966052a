//! 视频条目

use std::path::PathBuf;

use serde::Serialize;

/// 目录快照中的一个视频
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoItem {
    /// 快照内唯一
    pub id: u64,
    /// 带扩展名的文件名
    pub name: String,
    /// 所在文件夹名（`folder_path` 的最后一段）
    pub folder: String,
    /// 相对扫描根目录的路径，以 `/` 结尾；根目录下的文件为空串
    pub folder_path: String,
    pub path: PathBuf,
    pub duration_ms: u64,
    /// 修改时间（秒），作为添加时间排序
    pub date_added: u64,
}

impl VideoItem {
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_ms)
    }
}

/// 毫秒格式化为 `MM:SS`，分钟不封顶
pub fn format_duration(duration_ms: u64) -> String {
    let total_seconds = duration_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// 由相对路径取文件夹名
pub fn folder_name(folder_path: &str) -> &str {
    let trimmed = folder_path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(61_500), "01:01");
        assert_eq!(format_duration(3_725_000), "62:05");
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name("Movies/Trip/"), "Trip");
        assert_eq!(folder_name("Camera/"), "Camera");
        assert_eq!(folder_name(""), "");
    }
}
