//! 音频引擎
//!
//! 独立线程持有解码器和输出，通过 crossbeam 通道收命令、发事件。
//! [`AudioEngine`] 把它包装成顺序器使用的 [`Player`] 能力。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::{
    remap_channels, AudioDecoder, AudioOutput, DecodedChunk, DecoderError, OutputConfig,
    PlaybackState, Player, PlayerCommand, PlayerEvent, SampleQueue, TrackInfo,
};

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 输出队列容量（采样数）
    pub buffer_size: usize,
    /// 初始音量 (0.0 - 1.0)
    pub volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: OutputConfig::default().buffer_size,
            volume: 1.0,
        }
    }
}

/// 播放引擎句柄
pub struct EngineHandle {
    pub cmd_tx: Sender<PlayerCommand>,
    pub evt_rx: Receiver<PlayerEvent>,
    playing: Arc<AtomicBool>,
}

impl EngineHandle {
    /// 拆分为播放能力和事件接收端
    pub fn into_player(self) -> (AudioEngine, Receiver<PlayerEvent>) {
        (AudioEngine::from_parts(self.cmd_tx, self.playing), self.evt_rx)
    }
}

/// 启动播放引擎
pub fn spawn_engine(config: EngineConfig) -> EngineHandle {
    let (cmd_tx, cmd_rx) = bounded(32);
    let (evt_tx, evt_rx) = bounded(64);
    let playing = Arc::new(AtomicBool::new(false));

    let playing_clone = playing.clone();
    thread::spawn(move || {
        run_engine(cmd_rx, evt_tx, playing_clone, config);
    });

    EngineHandle {
        cmd_tx,
        evt_rx,
        playing,
    }
}

fn run_engine(
    cmd_rx: Receiver<PlayerCommand>,
    evt_tx: Sender<PlayerEvent>,
    playing: Arc<AtomicBool>,
    config: EngineConfig,
) {
    let mut state = EngineState::new(evt_tx, playing, config);
    state.emit(PlayerEvent::StateChanged(PlaybackState::Idle));

    loop {
        // 播放中只短暂等待命令，其余时间阻塞等待
        let timeout = if state.playback_state == PlaybackState::Playing {
            Duration::from_millis(5)
        } else {
            Duration::from_millis(250)
        };

        match cmd_rx.recv_timeout(timeout) {
            Ok(cmd) => {
                if !state.handle_command(cmd) {
                    break;
                }
                while let Ok(cmd) = cmd_rx.try_recv() {
                    if !state.handle_command(cmd) {
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if state.playback_state == PlaybackState::Playing {
            state.pump();
        }
    }

    log::debug!("audio engine stopped");
}

struct EngineState {
    evt_tx: Sender<PlayerEvent>,
    playing: Arc<AtomicBool>,
    playback_state: PlaybackState,
    current_track: Option<LoadedTrack>,
    /// 最近一次 Load 的代次
    generation: u64,
    volume: f32,
    buffer_size: usize,
}

struct LoadedTrack {
    decoder: AudioDecoder,
    output: AudioOutput,
    generation: u64,
    /// 解码器已读完，等待输出队列排空
    draining: bool,
}

/// 一次填充的结果
#[derive(Debug, PartialEq)]
enum Fill {
    /// 队列已满，或仍有采样待播放
    Pending,
    /// 解码器已读完且队列排空
    Finished,
    Failed(String),
}

/// 解码直到队列达到高水位，按帧实际声道数转换到输出声道
fn fill_queue<F>(
    queue: &SampleQueue,
    out_channels: usize,
    volume: f32,
    draining: &mut bool,
    mut next: F,
) -> Fill
where
    F: FnMut() -> Result<Option<DecodedChunk>, DecoderError>,
{
    while !*draining && queue.wants_more() {
        match next() {
            Ok(Some(mut chunk)) => {
                for sample in &mut chunk.samples {
                    *sample *= volume;
                }
                if chunk.channels == out_channels {
                    queue.write(&chunk.samples);
                } else {
                    queue.write(&remap_channels(&chunk.samples, chunk.channels, out_channels));
                }
            }
            Ok(None) => *draining = true,
            Err(e) => return Fill::Failed(format!("Decode error: {}", e)),
        }
    }

    if *draining && queue.buffered() == 0 {
        Fill::Finished
    } else {
        Fill::Pending
    }
}

impl EngineState {
    fn new(evt_tx: Sender<PlayerEvent>, playing: Arc<AtomicBool>, config: EngineConfig) -> Self {
        Self {
            evt_tx,
            playing,
            playback_state: PlaybackState::Idle,
            current_track: None,
            generation: 0,
            volume: config.volume.clamp(0.0, 1.0),
            buffer_size: config.buffer_size,
        }
    }

    fn emit(&self, event: PlayerEvent) {
        if self.evt_tx.send(event).is_err() {
            log::debug!("engine event dropped, host gone");
        }
    }

    fn handle_command(&mut self, cmd: PlayerCommand) -> bool {
        match cmd {
            PlayerCommand::Load { path, generation } => self.load_track(path, generation),
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Shutdown => {
                self.stop();
                return false;
            }
        }
        true
    }

    fn fail(&mut self, message: String) {
        log::warn!("{}", message);
        self.emit(PlayerEvent::Error {
            generation: self.generation,
            message,
        });
        self.set_state(PlaybackState::Idle);
    }

    fn load_track(&mut self, path: PathBuf, generation: u64) {
        self.release_track();
        self.generation = generation;
        self.set_state(PlaybackState::Loading);

        let decoder = match AudioDecoder::open(&path) {
            Ok(d) => d,
            Err(e) => {
                self.fail(format!("Failed to open {}: {}", path.display(), e));
                return;
            }
        };

        let info = &decoder.info;
        let output_config = OutputConfig {
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            buffer_size: self.buffer_size,
        };

        let output = match AudioOutput::new(output_config) {
            Ok(o) => o,
            Err(e) => {
                self.fail(format!("Audio output error: {}", e));
                return;
            }
        };

        self.emit(PlayerEvent::TrackInfo(TrackInfo {
            path,
            codec: info.codec.clone(),
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            duration: info.duration.unwrap_or(Duration::ZERO),
        }));

        self.current_track = Some(LoadedTrack {
            decoder,
            output,
            generation,
            draining: false,
        });

        self.set_state(PlaybackState::Paused);
    }

    fn play(&mut self) {
        if let Some(track) = &self.current_track {
            if self.playback_state != PlaybackState::Playing {
                track.output.set_playing(true);
                self.set_state(PlaybackState::Playing);
            }
        }
    }

    fn pause(&mut self) {
        if let Some(track) = &self.current_track {
            if self.playback_state == PlaybackState::Playing {
                track.output.set_playing(false);
                self.set_state(PlaybackState::Paused);
            }
        }
    }

    fn stop(&mut self) {
        self.release_track();
        if self.playback_state != PlaybackState::Idle {
            self.set_state(PlaybackState::Stopped);
        }
    }

    /// 丢弃当前音轨，未播放的采样一并清空
    fn release_track(&mut self) {
        if let Some(track) = self.current_track.take() {
            track.output.set_playing(false);
            track.output.queue().flush();
        }
    }

    /// 填充输出队列，音轨结束且队列排空后报告结束
    fn pump(&mut self) {
        let Some(track) = &mut self.current_track else {
            return;
        };

        let out_channels = track.output.channels() as usize;
        let decoder = &mut track.decoder;
        let fill = fill_queue(
            track.output.queue(),
            out_channels,
            self.volume,
            &mut track.draining,
            || decoder.decode_next(),
        );

        match fill {
            Fill::Pending => {}
            Fill::Finished => {
                let generation = track.generation;
                self.release_track();
                self.set_state(PlaybackState::Stopped);
                self.emit(PlayerEvent::TrackEnded { generation });
            }
            Fill::Failed(message) => {
                self.release_track();
                self.fail(message);
            }
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.playback_state != state {
            self.playback_state = state;
            self.playing
                .store(state == PlaybackState::Playing, Ordering::Relaxed);
            self.emit(PlayerEvent::StateChanged(state));
        }
    }
}

/// 把定位符转换为本地路径，去掉 `file://` 前缀
pub fn locator_to_path(locator: &str) -> PathBuf {
    PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator))
}

/// 音频引擎的 [`Player`] 适配
///
/// `set_source` 只记录路径，`prepare` 时才真正发出加载命令。
/// 每次加载分配新的代次，旧条目迟到的结束/错误事件据此丢弃。
pub struct AudioEngine {
    cmd_tx: Sender<PlayerCommand>,
    playing: Arc<AtomicBool>,
    pending: Option<PathBuf>,
    generation: u64,
}

impl AudioEngine {
    fn from_parts(cmd_tx: Sender<PlayerCommand>, playing: Arc<AtomicBool>) -> Self {
        Self {
            cmd_tx,
            playing,
            pending: None,
            generation: 0,
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("audio engine is gone");
        }
    }

    /// 待加载的路径
    pub fn pending(&self) -> Option<&Path> {
        self.pending.as_deref()
    }

    /// 事件是否属于最近一次加载；状态类事件总是接受
    pub fn is_current(&self, event: &PlayerEvent) -> bool {
        event
            .generation()
            .map_or(true, |generation| generation == self.generation)
    }
}

impl Player for AudioEngine {
    fn stop(&mut self) {
        self.send(PlayerCommand::Stop);
    }

    fn clear(&mut self) {
        self.pending = None;
    }

    fn set_source(&mut self, locator: &str, title: &str) {
        log::debug!("source {} -> {}", title, locator);
        self.pending = Some(locator_to_path(locator));
    }

    fn prepare(&mut self) {
        let Some(path) = self.pending.clone() else {
            log::warn!("prepare called without a source");
            return;
        };

        self.generation += 1;
        self.send(PlayerCommand::Load {
            path,
            generation: self.generation,
        });
    }

    fn play(&mut self) {
        self.send(PlayerCommand::Play);
    }

    fn pause(&mut self) {
        self.send(PlayerCommand::Pause);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_locator_to_path() {
        assert_eq!(
            locator_to_path("file:///sdcard/Movies/a.mp4"),
            PathBuf::from("/sdcard/Movies/a.mp4")
        );
        assert_eq!(locator_to_path("/tmp/b.mkv"), PathBuf::from("/tmp/b.mkv"));
    }

    #[test]
    fn test_prepare_sends_pending_load() {
        let (tx, rx) = unbounded();
        let mut engine = AudioEngine::from_parts(tx, Arc::new(AtomicBool::new(false)));

        engine.stop();
        engine.clear();
        engine.set_source("file:///videos/a.mp4", "A");
        engine.prepare();
        engine.play();

        let cmds: Vec<_> = rx.try_iter().collect();
        assert_eq!(cmds.len(), 3);
        assert!(matches!(cmds[0], PlayerCommand::Stop));
        assert!(matches!(
            &cmds[1],
            PlayerCommand::Load { path, generation: 1 } if path == Path::new("/videos/a.mp4")
        ));
        assert!(matches!(cmds[2], PlayerCommand::Play));
    }

    #[test]
    fn test_prepare_after_clear_sends_nothing() {
        let (tx, rx) = unbounded();
        let mut engine = AudioEngine::from_parts(tx, Arc::new(AtomicBool::new(false)));

        engine.set_source("/videos/a.mp4", "A");
        engine.clear();
        engine.prepare();

        assert!(engine.pending().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_is_playing_reads_shared_flag() {
        let (tx, _rx) = unbounded();
        let flag = Arc::new(AtomicBool::new(false));
        let engine = AudioEngine::from_parts(tx, flag.clone());

        assert!(!engine.is_playing());
        flag.store(true, Ordering::Relaxed);
        assert!(engine.is_playing());
    }

    #[test]
    fn test_stale_events_rejected_after_reload() {
        let (tx, _rx) = unbounded();
        let mut engine = AudioEngine::from_parts(tx, Arc::new(AtomicBool::new(false)));

        engine.set_source("/videos/a.mp4", "A");
        engine.prepare();
        assert!(engine.is_current(&PlayerEvent::TrackEnded { generation: 1 }));

        engine.set_source("/videos/b.mp4", "B");
        engine.prepare();
        assert!(!engine.is_current(&PlayerEvent::TrackEnded { generation: 1 }));
        assert!(!engine.is_current(&PlayerEvent::Error {
            generation: 1,
            message: "decode".into()
        }));
        assert!(engine.is_current(&PlayerEvent::TrackEnded { generation: 2 }));
        assert!(engine.is_current(&PlayerEvent::StateChanged(PlaybackState::Playing)));
    }

    fn stereo(n: usize) -> DecodedChunk {
        DecodedChunk {
            samples: vec![0.5; n * 2],
            channels: 2,
        }
    }

    #[test]
    fn test_fill_stops_at_high_water_mark() {
        let queue = SampleQueue::new(8);
        let mut chunks = vec![stereo(2), stereo(2), stereo(2), stereo(2)].into_iter();
        let mut draining = false;

        let fill = fill_queue(&queue, 2, 1.0, &mut draining, || Ok(chunks.next()));
        assert_eq!(fill, Fill::Pending);
        assert_eq!(queue.buffered(), 8);
        assert_eq!(chunks.len(), 2);
        assert!(!draining);
    }

    #[test]
    fn test_fill_finishes_only_after_drain() {
        let queue = SampleQueue::new(64);
        let mut chunks = vec![stereo(2), stereo(2)].into_iter();
        let mut draining = false;

        let fill = fill_queue(&queue, 2, 1.0, &mut draining, || Ok(chunks.next()));
        assert_eq!(fill, Fill::Pending);
        assert!(draining);
        assert_eq!(queue.buffered(), 8);

        let mut out = [0.0; 4];
        queue.drain_into(&mut out);
        let fill = fill_queue(&queue, 2, 1.0, &mut draining, || Ok(None));
        assert_eq!(fill, Fill::Pending);

        let mut out = [0.0; 4];
        queue.drain_into(&mut out);
        let fill = fill_queue(&queue, 2, 1.0, &mut draining, || Ok(None));
        assert_eq!(fill, Fill::Finished);
    }

    #[test]
    fn test_flush_drops_tail_of_previous_item() {
        let queue = SampleQueue::new(64);
        let mut chunks = vec![stereo(4)].into_iter();
        let mut draining = false;
        fill_queue(&queue, 2, 1.0, &mut draining, || Ok(chunks.next()));
        assert!(queue.buffered() > 0);

        queue.flush();
        assert_eq!(queue.buffered(), 0);
    }

    #[test]
    fn test_fill_uses_decoded_channel_count() {
        let queue = SampleQueue::new(64);
        let mut chunks = vec![DecodedChunk {
            samples: vec![0.8, -0.4],
            channels: 1,
        }]
        .into_iter();
        let mut draining = false;

        fill_queue(&queue, 2, 0.5, &mut draining, || Ok(chunks.next()));

        let mut out = [0.0; 4];
        assert_eq!(queue.drain_into(&mut out), 4);
        assert_eq!(out, [0.4, 0.4, -0.2, -0.2]);
    }

    #[test]
    fn test_fill_reports_decode_error() {
        let queue = SampleQueue::new(64);
        let mut draining = false;

        let fill = fill_queue(&queue, 2, 1.0, &mut draining, || {
            Err(DecoderError::Decode("corrupt packet".into()))
        });
        assert!(matches!(fill, Fill::Failed(message) if message.contains("corrupt packet")));
    }

    #[test]
    fn test_drop_shuts_down_engine() {
        let (tx, rx) = unbounded();
        drop(AudioEngine::from_parts(tx, Arc::new(AtomicBool::new(false))));
        assert!(matches!(rx.try_recv(), Ok(PlayerCommand::Shutdown)));
    }

    #[test]
    fn test_missing_file_reports_error() {
        let handle = spawn_engine(EngineConfig::default());
        let (mut engine, evt_rx) = handle.into_player();

        engine.set_source("/definitely/not/here.mp4", "missing");
        engine.prepare();

        let got_error = evt_rx
            .iter()
            .take(8)
            .any(|evt| matches!(evt, PlayerEvent::Error { generation: 1, .. }));
        assert!(got_error);
    }
}
