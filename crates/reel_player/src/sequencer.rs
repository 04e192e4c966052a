//! 播放列表顺序器
//!
//! 线性、不循环的播放列表：维护游标，收到结束/错误/上一首/下一首时
//! 移动游标并重新驱动播放能力。所有操作在调用线程上执行完毕，不需要锁。

use crate::{LoadRequest, PlayableItem, Player, PlayerEvent, Presentation, ResolvedLoad};

/// 单条目模式下的副标题
pub const SINGLE_SUBTITLE: &str = "Playing from video";

/// 顺序器输入事件
#[derive(Debug, Clone)]
pub enum SequencerEvent {
    /// 播放自然结束
    Ended,
    /// 播放失败，跳过当前条目
    Error(String),
    Next,
    Previous,
    PlayPause,
    Stop,
    Load(LoadRequest),
}

impl SequencerEvent {
    /// 引擎事件中只有结束和错误会驱动顺序器，其余只是状态反映
    pub fn from_player_event(event: &PlayerEvent) -> Option<Self> {
        match event {
            PlayerEvent::TrackEnded { .. } => Some(Self::Ended),
            PlayerEvent::Error { message, .. } => Some(Self::Error(message.clone())),
            PlayerEvent::StateChanged(_) | PlayerEvent::TrackInfo(_) => None,
        }
    }
}

/// 列表的加载方式，只影响副标题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistMode {
    #[default]
    Single,
    Batch,
}

/// 顺序器的会话状态
///
/// 非空时游标位于 `[0, len)`，或恰好等于 `len` 表示列表已播完。
#[derive(Debug, Clone, Default)]
pub struct PlaylistState {
    items: Vec<PlayableItem>,
    cursor: usize,
    mode: PlaylistMode,
}

impl PlaylistState {
    fn replace(&mut self, items: Vec<PlayableItem>, mode: PlaylistMode) {
        self.items = items;
        self.cursor = 0;
        self.mode = mode;
    }

    fn clear(&mut self) {
        self.replace(Vec::new(), PlaylistMode::default());
    }

    pub fn items(&self) -> &[PlayableItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> PlaylistMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 游标已越过最后一项
    pub fn is_exhausted(&self) -> bool {
        !self.items.is_empty() && self.cursor >= self.items.len()
    }

    pub fn current(&self) -> Option<&PlayableItem> {
        self.items.get(self.cursor)
    }

    fn subtitle(&self) -> String {
        match self.mode {
            PlaylistMode::Single => SINGLE_SUBTITLE.to_string(),
            PlaylistMode::Batch => format!("Video {} of {}", self.cursor + 1, self.items.len()),
        }
    }
}

/// 播放列表顺序器
pub struct PlaylistSequencer<P, N> {
    player: P,
    presentation: N,
    state: PlaylistState,
}

impl<P: Player, N: Presentation> PlaylistSequencer<P, N> {
    pub fn new(player: P, presentation: N) -> Self {
        Self {
            player,
            presentation,
            state: PlaylistState::default(),
        }
    }

    pub fn state(&self) -> &PlaylistState {
        &self.state
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn presentation(&self) -> &N {
        &self.presentation
    }

    pub fn current(&self) -> Option<&PlayableItem> {
        self.state.current()
    }

    /// 当前有可播放的条目
    pub fn is_active(&self) -> bool {
        self.state.current().is_some()
    }

    /// 处理一个事件，执行完毕后才接受下一个
    pub fn dispatch(&mut self, event: SequencerEvent) {
        match event {
            SequencerEvent::Ended => self.advance_forward(),
            SequencerEvent::Error(message) => {
                if let Some(item) = self.state.current() {
                    log::warn!("skipping {} ({}): {}", item.title(), item.locator(), message);
                }
                self.advance_forward();
            }
            SequencerEvent::Next => self.advance_forward(),
            SequencerEvent::Previous => self.advance_backward(),
            SequencerEvent::PlayPause => self.toggle_play_pause(),
            SequencerEvent::Stop => self.stop(),
            SequencerEvent::Load(request) => match request.resolve() {
                Ok(ResolvedLoad::Single(item)) => self.load_single(item),
                Ok(ResolvedLoad::Playlist(items)) => self.load_playlist(items),
                Err(e) => log::warn!("ignoring load request: {}", e),
            },
        }
    }

    /// 以单条目替换当前列表并立即播放
    pub fn load_single(&mut self, item: PlayableItem) {
        log::debug!("load single: {}", item.title());
        self.state.replace(vec![item], PlaylistMode::Single);
        self.play_current();
    }

    /// 整体替换当前列表；空列表只清空，不发出播放
    pub fn load_playlist(&mut self, items: Vec<PlayableItem>) {
        log::debug!("load playlist of {} items", items.len());
        self.state.replace(items, PlaylistMode::Batch);

        if self.state.is_empty() {
            self.player.stop();
            self.player.clear();
            return;
        }

        self.play_current();
    }

    pub fn advance_forward(&mut self) {
        if self.state.is_empty() {
            self.teardown();
            return;
        }

        let len = self.state.items.len();
        self.state.cursor = (self.state.cursor + 1).min(len);

        if self.state.cursor >= len {
            log::debug!("playlist exhausted after {} items", len);
            self.teardown();
            return;
        }

        self.play_current();
    }

    pub fn advance_backward(&mut self) {
        if self.state.is_empty() || self.state.is_exhausted() {
            return;
        }

        self.state.cursor = self.state.cursor.saturating_sub(1);
        // 已在第一项时仍然重新播放第一项
        self.play_current();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.player.is_playing() {
            self.player.pause();
        } else {
            self.player.play();
        }
    }

    /// 停止播放、清空列表并撤下通知
    pub fn stop(&mut self) {
        self.player.stop();
        self.player.clear();
        self.state.clear();
        self.presentation.teardown();
    }

    fn teardown(&mut self) {
        self.player.stop();
        self.presentation.teardown();
    }

    fn play_current(&mut self) {
        let Some(item) = self.state.current() else {
            return;
        };

        // 先停止并清除旧媒体，避免两个解码器争用输出
        self.player.stop();
        self.player.clear();
        self.player.set_source(item.locator(), item.title());
        self.player.prepare();
        self.player.play();

        let subtitle = self.state.subtitle();
        log::debug!("now playing {} ({})", item.title(), subtitle);
        self.presentation.publish(item.title(), &subtitle);
    }
}
