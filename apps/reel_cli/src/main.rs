//! reel - 命令行工具
//!
//! 浏览本地视频文件夹，重命名/删除视频，在后台播放文件夹的音轨

mod session;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use reel_catalog::{
    background_playlist, delete_videos, group_by_folder, rename_video, scan, videos_in_folder,
    CatalogConfig, VideoItem,
};
use reel_player::{EngineConfig, LoadRequest};

#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(about = "Browse local videos and play their audio in the background", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Root directory to scan for videos
    root: PathBuf,

    /// Skip duration probing (faster on large libraries)
    #[arg(long)]
    no_probe: bool,

    /// Do not follow symbolic links
    #[arg(long)]
    no_follow: bool,

    /// Extra video extension to include (can be specified multiple times)
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

impl ScanArgs {
    fn config(&self) -> CatalogConfig {
        let mut config = CatalogConfig {
            follow_links: !self.no_follow,
            probe_duration: !self.no_probe,
            ..Default::default()
        };
        config.extensions.extend(
            self.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase()),
        );
        config
    }

    fn scan(&self) -> anyhow::Result<Vec<VideoItem>> {
        scan(&self.root, &self.config())
            .with_context(|| format!("cannot scan {}", self.root.display()))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List folders that contain videos
    Folders {
        #[command(flatten)]
        scan: ScanArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the videos of one folder (relative path, e.g. "Movies/Trip/")
    List {
        #[command(flatten)]
        scan: ScanArgs,
        folder: String,
        #[arg(long)]
        json: bool,
    },
    /// Rename a video by id, keeping its extension
    Rename {
        #[command(flatten)]
        scan: ScanArgs,
        id: u64,
        new_name: String,
    },
    /// Delete videos by id
    Delete {
        #[command(flatten)]
        scan: ScanArgs,
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Play the audio of every video in a folder, in order
    Play {
        #[command(flatten)]
        scan: ScanArgs,
        folder: String,
        /// Playback volume (0.0 - 1.0)
        #[arg(long, default_value = "1.0")]
        volume: f32,
    },
    /// Play the audio of a single video file
    PlayFile {
        path: PathBuf,
        /// Title shown while playing
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "1.0")]
        volume: f32,
    },
}

fn find(videos: &[VideoItem], id: u64) -> anyhow::Result<&VideoItem> {
    videos
        .iter()
        .find(|v| v.id == id)
        .with_context(|| format!("no video with id {}", id))
}

fn engine_config(volume: f32) -> EngineConfig {
    EngineConfig {
        volume,
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Command::Folders { scan, json } => {
            let videos = scan.scan()?;
            let folders = group_by_folder(&videos);
            if json {
                println!("{}", serde_json::to_string_pretty(&folders)?);
            } else {
                for folder in &folders {
                    let unit = if folder.count == 1 { "Video" } else { "Videos" };
                    println!(
                        "{:<32} {:>4} {}  ({})",
                        folder.name, folder.count, unit, folder.folder_path
                    );
                }
            }
        }
        Command::List { scan, folder, json } => {
            let videos = scan.scan()?;
            let listed = videos_in_folder(&videos, &folder);
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                for video in &listed {
                    println!("{:>5}  {}  {}", video.id, video.duration_label(), video.name);
                }
            }
        }
        Command::Rename {
            scan,
            id,
            new_name,
        } => {
            let videos = scan.scan()?;
            let target = rename_video(find(&videos, id)?, &new_name)?;
            println!("Video renamed: {}", target.display());
        }
        Command::Delete { scan, ids } => {
            let videos = scan.scan()?;
            let selected = ids
                .iter()
                .map(|id| find(&videos, *id))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let report = delete_videos(selected);
            println!("{} videos deleted", report.deleted.len());
            for (id, err) in &report.failed {
                eprintln!("Cannot delete video {}: {}", id, err);
            }
            if !report.failed.is_empty() {
                bail!("{} videos could not be deleted", report.failed.len());
            }
        }
        Command::Play {
            scan,
            folder,
            volume,
        } => {
            let videos = scan.scan()?;
            let listed = videos_in_folder(&videos, &folder);
            if listed.is_empty() {
                bail!("no videos in folder {:?}", folder);
            }
            println!("Playing {} videos in background", listed.len());
            session::run(background_playlist(listed), engine_config(volume))?;
        }
        Command::PlayFile {
            path,
            title,
            volume,
        } => {
            if !path.is_file() {
                bail!("not a file: {}", path.display());
            }
            let title =
                title.or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()));
            let request = LoadRequest::single(path.to_string_lossy().into_owned(), title);
            session::run(request, engine_config(volume))?;
        }
    }

    Ok(())
}
