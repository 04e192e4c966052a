//! 音频引擎命令和事件定义

use std::path::PathBuf;
use std::time::Duration;

/// 引擎命令（宿主 -> 引擎）
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// 加载视频文件的音轨，`generation` 随结束/错误事件原样带回
    Load { path: PathBuf, generation: u64 },
    /// 播放
    Play,
    /// 暂停
    Pause,
    /// 停止并丢弃已缓冲的采样
    Stop,
    /// 关闭引擎
    Shutdown,
}

/// 引擎事件（引擎 -> 宿主）
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// 状态变更
    StateChanged(PlaybackState),
    /// 当前音轨信息
    TrackInfo(TrackInfo),
    /// 音轨自然播放结束
    TrackEnded { generation: u64 },
    /// 无法恢复的错误
    Error { generation: u64, message: String },
}

impl PlayerEvent {
    /// 结束/错误事件所属的加载代次，状态类事件返回 `None`
    pub fn generation(&self) -> Option<u64> {
        match self {
            PlayerEvent::TrackEnded { generation } | PlayerEvent::Error { generation, .. } => {
                Some(*generation)
            }
            PlayerEvent::StateChanged(_) | PlayerEvent::TrackInfo(_) => None,
        }
    }
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
}

/// 音轨信息
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub path: PathBuf,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}
