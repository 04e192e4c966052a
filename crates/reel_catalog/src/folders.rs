//! 文件夹分组

use reel_player::LoadRequest;
use serde::Serialize;

use crate::VideoItem;

/// 一个文件夹的概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSummary {
    pub name: String,
    /// 组内第一个视频的相对路径，用于打开该文件夹
    pub folder_path: String,
    pub count: usize,
}

/// 按文件夹名分组，保持首次出现的顺序，跳过空白名
///
/// 不同路径下同名的文件夹会合并到同一组。
pub fn group_by_folder(videos: &[VideoItem]) -> Vec<FolderSummary> {
    let mut folders: Vec<FolderSummary> = Vec::new();

    for video in videos {
        if video.folder.trim().is_empty() {
            continue;
        }
        match folders.iter_mut().find(|f| f.name == video.folder) {
            Some(folder) => folder.count += 1,
            None => folders.push(FolderSummary {
                name: video.folder.clone(),
                folder_path: video.folder_path.clone(),
                count: 1,
            }),
        }
    }

    folders
}

/// 精确匹配相对路径的视频，顺序不变
pub fn videos_in_folder<'a>(videos: &'a [VideoItem], folder_path: &str) -> Vec<&'a VideoItem> {
    videos
        .iter()
        .filter(|v| v.folder_path == folder_path)
        .collect()
}

/// 把一组视频整体交给后台音频播放
pub fn background_playlist<'a, I>(videos: I) -> LoadRequest
where
    I: IntoIterator<Item = &'a VideoItem>,
{
    let mut ids = Vec::new();
    let mut locators = Vec::new();
    let mut titles = Vec::new();

    for video in videos {
        ids.push(video.id as i64);
        locators.push(video.path.to_string_lossy().into_owned());
        titles.push(video.name.clone());
    }

    LoadRequest::batch(ids, locators, titles)
}
