//! reel_catalog - 本地视频目录
//!
//! 扫描目录下的视频文件，按文件夹分组，并提供重命名、删除，
//! 以及把一个文件夹交给后台音频播放的加载请求。

mod folders;
mod ops;
mod probe;
mod scan;
mod video;

use std::path::PathBuf;

pub use folders::*;
pub use ops::*;
pub use probe::*;
pub use scan::*;
pub use video::*;

/// 目录错误
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Target already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Probe error: {0}")]
    Probe(String),
}

/// 扫描配置
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// 视为视频的扩展名（小写，不带点）
    pub extensions: Vec<String>,
    /// 跟随符号链接
    pub follow_links: bool,
    /// 用 symphonia 探测时长
    pub probe_duration: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: ["mp4", "m4v", "mkv", "webm", "mov", "avi", "3gp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            follow_links: true,
            probe_duration: true,
        }
    }
}

impl CatalogConfig {
    pub fn is_video(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}
