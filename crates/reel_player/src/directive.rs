//! 指令队列能力
//!
//! 播放器和通知栏由远端宿主（如 Android 前台服务）持有时，
//! 顺序器的每次调用被记录为一条 [`Directive`]，按发出顺序交给宿主执行。

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

use crate::{Player, Presentation};

/// 宿主需要执行的一条指令
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Directive {
    Stop,
    Clear,
    SetSource { locator: String, title: String },
    Prepare,
    Play,
    Pause,
    Publish { title: String, subtitle: String },
    Teardown,
}

/// 创建一对共享同一队列的能力，以及宿主端的接收器
pub fn directive_channel() -> (ChannelPlayer, ChannelPresentation, Receiver<Directive>) {
    let (tx, rx) = unbounded();
    (
        ChannelPlayer::new(tx.clone()),
        ChannelPresentation::new(tx),
        rx,
    )
}

fn send(tx: &Sender<Directive>, directive: Directive) {
    if tx.send(directive).is_err() {
        log::warn!("directive receiver dropped");
    }
}

/// 以指令形式转发的播放能力
pub struct ChannelPlayer {
    tx: Sender<Directive>,
    playing: bool,
}

impl ChannelPlayer {
    pub fn new(tx: Sender<Directive>) -> Self {
        Self { tx, playing: false }
    }

    /// 宿主回报的真实播放状态
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl Player for ChannelPlayer {
    fn stop(&mut self) {
        self.playing = false;
        send(&self.tx, Directive::Stop);
    }

    fn clear(&mut self) {
        self.playing = false;
        send(&self.tx, Directive::Clear);
    }

    fn set_source(&mut self, locator: &str, title: &str) {
        send(
            &self.tx,
            Directive::SetSource {
                locator: locator.to_string(),
                title: title.to_string(),
            },
        );
    }

    fn prepare(&mut self) {
        send(&self.tx, Directive::Prepare);
    }

    fn play(&mut self) {
        self.playing = true;
        send(&self.tx, Directive::Play);
    }

    fn pause(&mut self) {
        self.playing = false;
        send(&self.tx, Directive::Pause);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// 以指令形式转发的展示能力
pub struct ChannelPresentation {
    tx: Sender<Directive>,
}

impl ChannelPresentation {
    pub fn new(tx: Sender<Directive>) -> Self {
        Self { tx }
    }
}

impl Presentation for ChannelPresentation {
    fn publish(&mut self, title: &str, subtitle: &str) {
        send(
            &self.tx,
            Directive::Publish {
                title: title.to_string(),
                subtitle: subtitle.to_string(),
            },
        );
    }

    fn teardown(&mut self) {
        send(&self.tx, Directive::Teardown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_queue_keeps_order() {
        let (mut player, mut presentation, rx) = directive_channel();

        player.set_source("/a.mp4", "A");
        presentation.publish("A", "Video 1 of 1");
        player.play();

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Directive::SetSource {
                    locator: "/a.mp4".into(),
                    title: "A".into()
                },
                Directive::Publish {
                    title: "A".into(),
                    subtitle: "Video 1 of 1".into()
                },
                Directive::Play,
            ]
        );
    }

    #[test]
    fn test_playing_flag_tracks_calls() {
        let (mut player, _presentation, _rx) = directive_channel();
        assert!(!player.is_playing());

        player.play();
        assert!(player.is_playing());

        player.pause();
        assert!(!player.is_playing());

        player.set_playing(true);
        assert!(player.is_playing());

        player.stop();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Directive::SetSource {
            locator: "/a.mp4".into(),
            title: "A".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"set_source","locator":"/a.mp4","title":"A"}"#);

        let json = serde_json::to_string(&Directive::Teardown).unwrap();
        assert_eq!(json, r#"{"op":"teardown"}"#);
    }
}
