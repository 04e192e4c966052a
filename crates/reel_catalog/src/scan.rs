//! 目录扫描

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::{duration_ms_or_zero, folder_name, CatalogConfig, CatalogError, VideoItem};

/// 扫描根目录下的所有视频，按添加时间倒序返回
///
/// 不可访问的条目记录警告后跳过。id 按路径顺序从 1 开始分配。
pub fn scan(root: &Path, config: &CatalogConfig) -> Result<Vec<VideoItem>, CatalogError> {
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name()
    {
        match entry {
            Err(e) => log::warn!("cannot access entry: {}", e),
            Ok(entry) if entry.file_type().is_file() && config.is_video(entry.path()) => {
                paths.push(entry.into_path());
            }
            Ok(_) => {}
        }
    }

    let mut videos = Vec::with_capacity(paths.len());
    for (idx, path) in paths.into_iter().enumerate() {
        match describe(root, path, idx as u64 + 1, config) {
            Ok(video) => videos.push(video),
            Err(e) => log::warn!("skipping video: {}", e),
        }
    }

    videos.sort_by(|a, b| {
        b.date_added
            .cmp(&a.date_added)
            .then_with(|| a.name.cmp(&b.name))
    });

    log::info!("found {} videos under {}", videos.len(), root.display());
    Ok(videos)
}

/// 相对根目录的文件夹路径，`a/b/` 形式
pub fn relative_folder(root: &Path, path: &Path) -> String {
    let Some(parent) = path.parent() else {
        return String::new();
    };
    let Ok(rel) = parent.strip_prefix(root) else {
        return String::new();
    };

    let mut out = String::new();
    for part in rel.components() {
        out.push_str(&part.as_os_str().to_string_lossy());
        out.push('/');
    }
    out
}

fn describe(
    root: &Path,
    path: PathBuf,
    id: u64,
    config: &CatalogConfig,
) -> Result<VideoItem, CatalogError> {
    let meta = std::fs::metadata(&path)?;
    let date_added = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let folder_path = relative_folder(root, &path);
    let folder = folder_name(&folder_path).to_string();

    let duration_ms = if config.probe_duration {
        duration_ms_or_zero(&path)
    } else {
        0
    };

    Ok(VideoItem {
        id,
        name,
        folder,
        folder_path,
        path,
        duration_ms,
        date_added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};

    fn touch(path: &Path, age_secs: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    fn quick_config() -> CatalogConfig {
        CatalogConfig {
            probe_duration: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_relative_folder() {
        let root = Path::new("/media");
        assert_eq!(relative_folder(root, Path::new("/media/a.mp4")), "");
        assert_eq!(
            relative_folder(root, Path::new("/media/Movies/Trip/a.mp4")),
            "Movies/Trip/"
        );
    }

    #[test]
    fn test_scan_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("Movies/Trip/old.mp4"), 300);
        touch(&root.join("Movies/Trip/new.MKV"), 10);
        touch(&root.join("Camera/clip.webm"), 100);
        touch(&root.join("Camera/notes.txt"), 5);
        touch(&root.join("loose.mp4"), 200);

        let videos = scan(root, &quick_config()).unwrap();
        let names: Vec<_> = videos.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["new.MKV", "clip.webm", "loose.mp4", "old.mp4"]);

        let clip = &videos[1];
        assert_eq!(clip.folder, "Camera");
        assert_eq!(clip.folder_path, "Camera/");

        let loose = &videos[2];
        assert_eq!(loose.folder, "");
        assert_eq!(loose.folder_path, "");

        let mut ids: Vec<_> = videos.iter().map(|v| v.id).collect();
        ids.sort();
        assert_eq!(ids, [1, 2, 3, 4]);
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan(&missing, &quick_config()),
            Err(CatalogError::NotADirectory(_))
        ));
    }
}
